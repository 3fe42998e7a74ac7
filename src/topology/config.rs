//! Topology Configuration
//!
//! JSON bootstrap file. Validation runs before any record is built, so a
//! registry only ever starts from a topology satisfying:
//! - unique (service, component) keys
//! - no strong replica in Shared-
//! - staleness bounds only on bounded-staleness replicas, all > 0
//! - at most one Modified replica per component
//! - owners and operation models reference declared replicas

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{TopologyError, TopologyResult};
use super::operation_model::OperationModel;
use crate::model::{ConsistencyPolicy, ConsistencyState, ReplicaKey, ReplicaRecord};
use crate::registry::{OwnershipConvention, Registry};

/// One replica as declared at bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaSeed {
    pub service: String,
    pub component: String,
    pub state: ConsistencyState,
    pub policy: ConsistencyPolicy,

    /// Initial version (default 0)
    #[serde(default)]
    pub version: u64,

    /// Staleness bound; bounded-staleness replicas fall back to the
    /// topology default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staleness_bound_ms: Option<u64>,
}

impl ReplicaSeed {
    pub fn new(
        service: impl Into<String>,
        component: impl Into<String>,
        state: ConsistencyState,
        policy: ConsistencyPolicy,
        version: u64,
    ) -> Self {
        Self {
            service: service.into(),
            component: component.into(),
            state,
            policy,
            version,
            staleness_bound_ms: None,
        }
    }

    /// Set an explicit staleness bound.
    pub fn with_staleness_bound(mut self, bound_ms: u64) -> Self {
        self.staleness_bound_ms = Some(bound_ms);
        self
    }

    pub fn key(&self) -> ReplicaKey {
        ReplicaKey::new(self.service.clone(), self.component.clone())
    }
}

/// Bootstrap configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Bound for bounded-staleness replicas without their own (default 30s)
    #[serde(default = "default_staleness_bound_ms")]
    pub default_staleness_bound_ms: u64,

    /// Background sweep period (default 1s)
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    /// Explicit component owners, overriding the naming convention
    #[serde(default)]
    pub owners: BTreeMap<String, String>,

    pub replicas: Vec<ReplicaSeed>,

    #[serde(default)]
    pub operation_models: Vec<OperationModel>,
}

fn default_staleness_bound_ms() -> u64 {
    30_000
}

fn default_sweep_interval_ms() -> u64 {
    1_000
}

impl TopologyConfig {
    /// Topology over `replicas` with default settings.
    pub fn new(replicas: Vec<ReplicaSeed>) -> Self {
        Self {
            default_staleness_bound_ms: default_staleness_bound_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
            owners: BTreeMap::new(),
            replicas,
            operation_models: Vec::new(),
        }
    }

    /// Load and validate a topology file.
    pub fn load(path: &Path) -> TopologyResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate a topology document.
    pub fn from_json(content: &str) -> TopologyResult<Self> {
        let config: TopologyConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> TopologyResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the topology.
    pub fn validate(&self) -> TopologyResult<()> {
        if self.replicas.is_empty() {
            return Err(TopologyError::Empty);
        }
        if self.sweep_interval_ms == 0 {
            return Err(TopologyError::ZeroSweepInterval);
        }
        if self.default_staleness_bound_ms == 0 {
            return Err(TopologyError::ZeroStalenessBound(
                "default_staleness_bound_ms".to_string(),
            ));
        }

        let mut keys = BTreeSet::new();
        let mut writers = BTreeSet::new();
        for seed in &self.replicas {
            if seed.service.trim().is_empty() || seed.component.trim().is_empty() {
                return Err(TopologyError::BlankName);
            }

            let key = seed.key();
            if !keys.insert(key.clone()) {
                return Err(TopologyError::DuplicateReplica(key));
            }

            if seed.policy.is_strong() && seed.state == ConsistencyState::SharedMinus {
                return Err(TopologyError::StrongSeededStale(key));
            }

            match seed.staleness_bound_ms {
                Some(_) if !seed.policy.arms_deadline() => {
                    return Err(TopologyError::BoundOnUnboundedPolicy(key));
                }
                Some(0) => return Err(TopologyError::ZeroStalenessBound(key.to_string())),
                _ => {}
            }

            if seed.state == ConsistencyState::Modified && !writers.insert(seed.component.clone()) {
                return Err(TopologyError::MultipleSeededWriters(seed.component.clone()));
            }
        }

        for (component, service) in &self.owners {
            if !keys.contains(&ReplicaKey::new(service.clone(), component.clone())) {
                return Err(TopologyError::UnknownOwner {
                    component: component.clone(),
                    service: service.clone(),
                });
            }
        }

        let mut model_ids = BTreeSet::new();
        for model in &self.operation_models {
            if !model_ids.insert(model.id.as_str()) {
                return Err(TopologyError::DuplicateOperationModel(model.id.clone()));
            }
            if let Some(key) = model.keys().into_iter().find(|key| !keys.contains(key)) {
                return Err(TopologyError::UnknownModelReplica {
                    model: model.id.clone(),
                    key,
                });
            }
        }

        Ok(())
    }

    /// Seed a registry as of `now`.
    ///
    /// Bounded-staleness replicas seeded in Shared- get their deadline armed
    /// relative to `now`.
    pub fn build_registry(&self, now: DateTime<Utc>) -> Registry {
        Registry::from_records(self.replicas.iter().map(|seed| {
            ReplicaRecord::new(
                seed.key(),
                seed.state,
                seed.policy,
                seed.version,
                seed.staleness_bound_ms,
                now,
            )
            .with_default_bound(self.default_staleness_bound_ms, now)
        }))
    }

    /// Ownership convention with this topology's overrides.
    pub fn ownership(&self) -> OwnershipConvention {
        OwnershipConvention::with_overrides(self.owners.clone())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}
