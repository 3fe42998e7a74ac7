//! Coherence Engine
//!
//! The four operations exposed to callers:
//! - `apply`: δ on one replica, then propagation for source updates/shares
//! - `sweep_once`: demote expired bounded-staleness replicas
//! - `resolve`: find the authoritative replica of a component
//! - `snapshot`: detached read-only view of every record
//!
//! Registry and audit trail sit behind one mutex. Each `apply` and each
//! sweep runs start to finish under that lock, so no caller ever observes a
//! source transition without its propagation, and a sweep never interleaves
//! with an apply.

mod audit;
mod clock;
mod engine;

pub use audit::AuditTrail;
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{ApplyOutcome, Engine};
