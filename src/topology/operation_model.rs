//! Operation Models
//!
//! An operation model names a business flow and the replicas it touches,
//! each with the access pattern the flow uses. Models are descriptive: they
//! scope views and reports, they do not gate transitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::ReplicaKey;

/// How a flow uses a replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPattern {
    Read,
    Write,
    Both,
}

impl AccessPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Both => "both",
        }
    }

    pub fn reads(&self) -> bool {
        matches!(self, Self::Read | Self::Both)
    }

    pub fn writes(&self) -> bool {
        matches!(self, Self::Write | Self::Both)
    }
}

impl fmt::Display for AccessPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One replica used by an operation model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEntry {
    pub service: String,
    pub component: String,
    pub pattern: AccessPattern,
}

impl AccessEntry {
    pub fn new(
        service: impl Into<String>,
        component: impl Into<String>,
        pattern: AccessPattern,
    ) -> Self {
        Self {
            service: service.into(),
            component: component.into(),
            pattern,
        }
    }

    pub fn key(&self) -> ReplicaKey {
        ReplicaKey::new(self.service.clone(), self.component.clone())
    }
}

/// A named business flow over a set of replicas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationModel {
    pub id: String,
    pub name: String,
    pub access: Vec<AccessEntry>,
}

impl OperationModel {
    pub fn new(id: impl Into<String>, name: impl Into<String>, access: Vec<AccessEntry>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            access,
        }
    }

    /// Services participating, in first-mention order.
    pub fn services(&self) -> Vec<&str> {
        let mut services: Vec<&str> = Vec::new();
        for entry in &self.access {
            if !services.contains(&entry.service.as_str()) {
                services.push(&entry.service);
            }
        }
        services
    }

    /// Components touched, in first-mention order.
    pub fn components(&self) -> Vec<&str> {
        let mut components: Vec<&str> = Vec::new();
        for entry in &self.access {
            if !components.contains(&entry.component.as_str()) {
                components.push(&entry.component);
            }
        }
        components
    }

    pub fn keys(&self) -> Vec<ReplicaKey> {
        self.access.iter().map(AccessEntry::key).collect()
    }

    /// Access pattern for `key`, if the model touches it.
    pub fn pattern_for(&self, key: &ReplicaKey) -> Option<AccessPattern> {
        self.access
            .iter()
            .find(|entry| entry.service == key.service && entry.component == key.component)
            .map(|entry| entry.pattern)
    }
}
