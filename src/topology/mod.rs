//! Bootstrap Topology
//!
//! The deployment description that seeds the registry once at startup:
//! replicas with their initial state, policy, version and staleness bound,
//! explicit component owners, and the operation models grouping replicas
//! into business flows.
//!
//! The engine consumes a topology; it never produces or edits one.

mod config;
mod ecommerce;
mod errors;
mod operation_model;

pub use config::{ReplicaSeed, TopologyConfig};
pub use ecommerce::ecommerce;
pub use errors::{TopologyError, TopologyResult};
pub use operation_model::{AccessEntry, AccessPattern, OperationModel};
