//! Transition Engine
//!
//! - `delta`: the pure transition function δ over (state, operation, policy, is_source)
//! - `propagate`: cross-replica effects of a source-originating update or share
//! - `record`: the append-only audit entries both of them emit
//!
//! Every combination not named by a rule is a defined no-op; nothing in this
//! module can fail on a well-formed input.

mod delta;
mod propagate;
mod record;

pub use delta::{delta, Rule, Transition, VersionEffect};
pub use propagate::{sibling_effect, Propagator, SiblingEffect};
pub use record::{TransitionOrigin, TransitionRecord};
