//! Replica Key
//!
//! Uniqueness is on the (service, component) pair, never on either part alone.
//! Ordering is lexicographic on (service, component); the registry relies on
//! it for a stable scan order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Composite key identifying one replica of a logical component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReplicaKey {
    /// Service holding the replica.
    pub service: String,

    /// Logical component being replicated.
    pub component: String,
}

impl ReplicaKey {
    /// Create a new key.
    pub fn new(service: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            component: component.into(),
        }
    }

    /// Check whether two keys replicate the same logical component.
    pub fn is_sibling_of(&self, other: &ReplicaKey) -> bool {
        self.component == other.component && self.service != other.service
    }
}

impl fmt::Display for ReplicaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.service, self.component)
    }
}
