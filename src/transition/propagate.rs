//! Propagation
//!
//! Fans a source-originating update or share out to every other replica of
//! the same component. Each sibling reacts according to its own policy:
//!
//! - share: an Invalid sibling becomes Shared+ (strong) or Shared- (relaxed),
//!   adopting the source's version; bounded staleness arms the deadline
//! - update: a strong sibling that is not Invalid is invalidated; a relaxed
//!   sibling in Shared+ is demoted to Shared- (deadline armed when bounded)
//!
//! Modified siblings and siblings already in the target state are untouched,
//! which makes propagation idempotent. Siblings are visited in registry key
//! order and every effect reads the source version captured before the scan.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::record::{TransitionOrigin, TransitionRecord};
use crate::model::{ConsistencyPolicy, ConsistencyState, Operation, ReplicaKey};
use crate::observability::Event;
use crate::registry::{CoherenceResult, Registry};

/// Cross-replica effect on one sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingEffect {
    /// Shared -> Invalid under strong consistency.
    Invalidate,
    /// Shared+ -> Shared- under relaxed consistency.
    Demote,
    /// Invalid -> Shared+/Shared- carrying the source's version.
    Share,
}

/// Target state and effect for a sibling, or `None` if it is left alone.
pub fn sibling_effect(
    state: ConsistencyState,
    policy: ConsistencyPolicy,
    operation: Operation,
) -> Option<(ConsistencyState, SiblingEffect)> {
    use crate::model::ConsistencyState::{Invalid, SharedMinus, SharedPlus};

    match (operation, state) {
        (Operation::Share, Invalid) if policy.is_strong() => Some((SharedPlus, SiblingEffect::Share)),
        (Operation::Share, Invalid) => Some((SharedMinus, SiblingEffect::Share)),
        (Operation::Update, SharedPlus | SharedMinus) if policy.is_strong() => {
            Some((Invalid, SiblingEffect::Invalidate))
        }
        (Operation::Update, SharedPlus) => Some((SharedMinus, SiblingEffect::Demote)),
        _ => None,
    }
}

/// Applies cross-replica effects after a source transition has committed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Propagator;

impl Propagator {
    pub fn new() -> Self {
        Self
    }

    /// Propagate `operation` from `source` to its siblings.
    ///
    /// Returns one record per affected sibling, in scan order. Operations
    /// other than update and share propagate nothing.
    pub fn propagate(
        &self,
        registry: &mut Registry,
        source: &ReplicaKey,
        operation: Operation,
        now: DateTime<Utc>,
    ) -> CoherenceResult<Vec<TransitionRecord>> {
        let source_version = registry.get(source)?.version();
        if !operation.propagates() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for sibling in registry.siblings(source) {
            let record = registry.get_mut(&sibling)?;
            let from = record.state();
            let Some((to, effect)) = sibling_effect(from, record.policy(), operation) else {
                continue;
            };

            record.set_state(to);
            if effect == SiblingEffect::Share {
                record.adopt_version(source_version, now);
            }
            if record.arm_deadline(now).is_some() {
                record.touch(now);
            }

            let description = match effect {
                SiblingEffect::Share => format!(
                    "Propagated share: {} refreshed in {} from {} (version {})",
                    sibling.component, sibling.service, source.service, record.version()
                ),
                SiblingEffect::Invalidate => format!(
                    "Propagated update: {} invalidated in {} due to strong consistency",
                    sibling.component, sibling.service
                ),
                SiblingEffect::Demote => format!(
                    "Propagated update: {} becomes potentially stale in {}",
                    sibling.component, sibling.service
                ),
            };

            debug!(
                event = Event::Propagation.as_str(),
                source = %source,
                sibling = %sibling,
                operation = operation.as_str(),
                from = from.code(),
                to = to.code(),
                "propagated sibling effect"
            );

            records.push(TransitionRecord::new(
                now,
                &sibling,
                operation,
                from,
                to,
                TransitionOrigin::Propagated,
                description,
            ));
        }

        Ok(records)
    }
}
