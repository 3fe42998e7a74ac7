//! Replica Model
//!
//! Value types shared by every layer of the engine:
//! - `ConsistencyState`: the four-state calculus (Modified / Shared+ / Shared- / Invalid)
//! - `ConsistencyPolicy`: the per-replica consistency contract, fixed at bootstrap
//! - `Operation`: the inputs to the transition function
//! - `ReplicaKey`: the (service, component) composite key
//! - `ReplicaRecord`: the per-key metadata held by the registry

mod key;
mod record;
mod state;

pub use key::ReplicaKey;
pub use record::ReplicaRecord;
pub use state::{ConsistencyPolicy, ConsistencyState, Operation};
