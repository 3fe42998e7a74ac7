//! Replica Registry
//!
//! The directory of (service, component) replica records and the only shared
//! mutable resource in the engine. Replicas are seeded once at bootstrap and
//! never created or destroyed afterwards.
//!
//! Siblings are discovered by scanning, not through a secondary index; the
//! backing map is ordered so every scan visits keys in the same order.

mod errors;
mod resolver;
mod snapshot;
mod store;

pub use errors::{CoherenceError, CoherenceResult};
pub use resolver::{OwnershipConvention, Resolver};
pub use snapshot::{RegistrySnapshot, RegistrySummary, StalenessCountdown};
pub use store::Registry;
