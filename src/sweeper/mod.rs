//! Staleness Sweeper
//!
//! Bounded-staleness replicas that sit in Shared- past their deadline are
//! demoted to Invalid. A pass is a pure function of the registry and a
//! timestamp (`sweep_once`); `StalenessSweeper` runs passes periodically on
//! the tokio runtime against a shared `Engine`.

mod sweep;
mod task;

pub use sweep::sweep_once;
pub use task::{StalenessSweeper, SweeperHandle, MIN_PERIOD};
