//! Observability
//!
//! - `Event`: the stable event names carried by every log line
//! - `MetricsRegistry`: monotonic counters for engine activity
//!
//! Observability is read-only: nothing here influences a transition.
//! Log output itself goes through `tracing`; the binary decides where it lands.

mod events;
mod metrics;

pub use events::Event;
pub use metrics::{MetricsRegistry, MetricsSnapshot};
