//! Authoritative Source Resolution
//!
//! Resolution order for a component:
//! 1. the replica held by the component's owning service
//! 2. any replica of the component currently in Modified
//! 3. otherwise `NoAuthoritativeSource`
//!
//! Ownership comes from explicit overrides configured at bootstrap, falling
//! back to the naming convention `<Name>Model` is owned by `<Name>Service`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::errors::{CoherenceError, CoherenceResult};
use super::store::Registry;
use crate::model::ReplicaKey;
use crate::observability::Event;

const COMPONENT_SUFFIX: &str = "Model";
const SERVICE_SUFFIX: &str = "Service";

/// Maps a component to the service that owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipConvention {
    /// Component name -> owning service name.
    #[serde(default)]
    overrides: BTreeMap<String, String>,
}

impl OwnershipConvention {
    /// Naming convention only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Naming convention plus explicit owners.
    pub fn with_overrides(overrides: BTreeMap<String, String>) -> Self {
        Self { overrides }
    }

    pub fn overrides(&self) -> &BTreeMap<String, String> {
        &self.overrides
    }

    /// Owning service of `component`, if one can be determined.
    pub fn owner_of(&self, component: &str) -> Option<String> {
        if let Some(service) = self.overrides.get(component) {
            return Some(service.clone());
        }
        component
            .strip_suffix(COMPONENT_SUFFIX)
            .filter(|stem| !stem.is_empty())
            .map(|stem| format!("{}{}", stem, SERVICE_SUFFIX))
    }
}

/// Finds the replica treated as ground truth for refresh and read-miss.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    convention: OwnershipConvention,
}

impl Resolver {
    pub fn new(convention: OwnershipConvention) -> Self {
        Self { convention }
    }

    pub fn convention(&self) -> &OwnershipConvention {
        &self.convention
    }

    /// Resolve the authoritative replica of `component`.
    pub fn resolve(&self, component: &str, registry: &Registry) -> CoherenceResult<ReplicaKey> {
        if let Some(owner) = self.convention.owner_of(component) {
            let key = ReplicaKey::new(owner, component);
            if registry.contains(&key) {
                return Ok(key);
            }
        }

        let writers = registry.writers(component);
        if writers.len() > 1 {
            let keys: Vec<String> = writers.iter().map(|key| key.to_string()).collect();
            warn!(
                event = Event::MultipleWriters.as_str(),
                component,
                writers = %keys.join(","),
                "more than one Modified replica; choosing first in key order"
            );
        }

        writers
            .first()
            .map(|key| (*key).clone())
            .ok_or_else(|| CoherenceError::NoAuthoritativeSource(component.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConsistencyPolicy, ConsistencyState, ReplicaRecord};
    use chrono::Utc;

    fn record(service: &str, component: &str, state: ConsistencyState) -> ReplicaRecord {
        ReplicaRecord::new(
            ReplicaKey::new(service, component),
            state,
            ConsistencyPolicy::Strong,
            0,
            None,
            Utc::now(),
        )
    }

    #[test]
    fn test_naming_convention() {
        let convention = OwnershipConvention::new();
        assert_eq!(convention.owner_of("OrderModel").as_deref(), Some("OrderService"));
        assert_eq!(convention.owner_of("Model"), None);
        assert_eq!(convention.owner_of("Ledger"), None);
    }

    #[test]
    fn test_override_wins_over_convention() {
        let mut overrides = BTreeMap::new();
        overrides.insert("ProductModel".to_string(), "CatalogService".to_string());
        let convention = OwnershipConvention::with_overrides(overrides);

        assert_eq!(convention.owner_of("ProductModel").as_deref(), Some("CatalogService"));
        assert_eq!(convention.owner_of("OrderModel").as_deref(), Some("OrderService"));
    }

    #[test]
    fn test_owner_preferred_over_modified() {
        let registry = Registry::from_records(vec![
            record("InventoryService", "InventoryModel", ConsistencyState::Invalid),
            record("OrderService", "InventoryModel", ConsistencyState::Modified),
        ]);

        let key = Resolver::default().resolve("InventoryModel", &registry).unwrap();
        assert_eq!(key, ReplicaKey::new("InventoryService", "InventoryModel"));
    }

    #[test]
    fn test_falls_back_to_modified_replica() {
        let registry = Registry::from_records(vec![
            record("SearchService", "ProductModel", ConsistencyState::SharedPlus),
            record("OrderService", "ProductModel", ConsistencyState::Modified),
        ]);

        let key = Resolver::default().resolve("ProductModel", &registry).unwrap();
        assert_eq!(key, ReplicaKey::new("OrderService", "ProductModel"));
    }

    #[test]
    fn test_not_found() {
        let registry = Registry::from_records(vec![record(
            "SearchService",
            "ProductModel",
            ConsistencyState::SharedPlus,
        )]);

        assert_eq!(
            Resolver::default().resolve("ProductModel", &registry),
            Err(CoherenceError::NoAuthoritativeSource("ProductModel".into()))
        );
    }

    #[test]
    fn test_multiple_writers_resolve_deterministically() {
        let registry = Registry::from_records(vec![
            record("SearchService", "ProductModel", ConsistencyState::Modified),
            record("AnalyticsService", "ProductModel", ConsistencyState::Modified),
        ]);

        let resolver = Resolver::default();
        let first = resolver.resolve("ProductModel", &registry).unwrap();
        assert_eq!(first, ReplicaKey::new("AnalyticsService", "ProductModel"));
        assert_eq!(resolver.resolve("ProductModel", &registry).unwrap(), first);
    }
}
