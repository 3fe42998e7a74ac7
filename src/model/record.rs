//! Replica Record
//!
//! Metadata tracked per replica key. Fields are private; the only mutation
//! paths are the crate-internal setters used by the transition engine, which
//! keep these invariants:
//! - `version` never decreases
//! - `staleness_deadline` is present only in Shared- under bounded staleness

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::key::ReplicaKey;
use super::state::{ConsistencyPolicy, ConsistencyState};

/// Consistency metadata for one replica.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplicaRecord {
    key: ReplicaKey,
    state: ConsistencyState,
    policy: ConsistencyPolicy,
    version: u64,
    last_updated: DateTime<Utc>,
    /// Configured bound; only meaningful under bounded staleness.
    #[serde(skip_serializing_if = "Option::is_none")]
    staleness_bound_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    staleness_deadline: Option<DateTime<Utc>>,
}

impl ReplicaRecord {
    /// Create a record as seeded at bootstrap.
    ///
    /// A bounded-staleness replica seeded in Shared- has its deadline armed
    /// relative to `now`.
    pub fn new(
        key: ReplicaKey,
        state: ConsistencyState,
        policy: ConsistencyPolicy,
        version: u64,
        staleness_bound_ms: Option<u64>,
        now: DateTime<Utc>,
    ) -> Self {
        let staleness_bound_ms = if policy.arms_deadline() {
            staleness_bound_ms
        } else {
            None
        };

        let mut record = Self {
            key,
            state,
            policy,
            version,
            last_updated: now,
            staleness_bound_ms,
            staleness_deadline: None,
        };
        if state == ConsistencyState::SharedMinus {
            record.arm_deadline(now);
        }
        record
    }

    pub fn key(&self) -> &ReplicaKey {
        &self.key
    }

    pub fn service(&self) -> &str {
        &self.key.service
    }

    pub fn component(&self) -> &str {
        &self.key.component
    }

    pub fn state(&self) -> ConsistencyState {
        self.state
    }

    pub fn policy(&self) -> ConsistencyPolicy {
        self.policy
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn staleness_bound_ms(&self) -> Option<u64> {
        self.staleness_bound_ms
    }

    pub fn staleness_deadline(&self) -> Option<DateTime<Utc>> {
        self.staleness_deadline
    }

    /// Whether the deadline has elapsed at `now`.
    ///
    /// A missing deadline is never due.
    pub fn is_deadline_due(&self, now: DateTime<Utc>) -> bool {
        self.staleness_deadline.map_or(false, |deadline| deadline <= now)
    }

    /// Time left before the deadline, saturating at zero.
    pub fn staleness_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.staleness_deadline
            .map(|deadline| (deadline - now).max(Duration::zero()))
    }

    // =========================================================================
    // MUTATION (engine only)
    // =========================================================================

    /// Move to `state`, clearing the deadline when leaving Shared-.
    pub(crate) fn set_state(&mut self, state: ConsistencyState) {
        self.state = state;
        if state != ConsistencyState::SharedMinus {
            self.staleness_deadline = None;
        }
    }

    /// Bump the version by one and refresh the timestamp.
    pub(crate) fn bump_version(&mut self, now: DateTime<Utc>) {
        self.version = self.version.saturating_add(1);
        self.last_updated = now;
    }

    /// Adopt a version observed elsewhere, never moving backwards.
    pub(crate) fn adopt_version(&mut self, version: u64, now: DateTime<Utc>) {
        self.version = self.version.max(version);
        self.last_updated = now;
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = now;
    }

    /// Arm the staleness deadline if the policy bounds staleness.
    ///
    /// Returns the armed deadline. A replica without a configured bound is
    /// left without a deadline. The timestamp is not touched; callers decide
    /// whether the transition refreshes it.
    pub(crate) fn arm_deadline(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if !self.policy.arms_deadline() || self.state != ConsistencyState::SharedMinus {
            return None;
        }
        let bound = self.staleness_bound_ms?;
        let deadline = i64::try_from(bound)
            .ok()
            .and_then(|ms| now.checked_add_signed(Duration::milliseconds(ms)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.staleness_deadline = Some(deadline);
        Some(deadline)
    }

    /// Fill in the bound for bounded-staleness replicas seeded without one.
    pub(crate) fn with_default_bound(mut self, bound_ms: u64, now: DateTime<Utc>) -> Self {
        if self.policy.arms_deadline() && self.staleness_bound_ms.is_none() {
            self.staleness_bound_ms = Some(bound_ms);
            if self.state == ConsistencyState::SharedMinus {
                self.arm_deadline(now);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn bounded(state: ConsistencyState) -> ReplicaRecord {
        ReplicaRecord::new(
            ReplicaKey::new("OrderService", "InventoryModel"),
            state,
            ConsistencyPolicy::BoundedStaleness,
            0,
            Some(30_000),
            t0(),
        )
    }

    #[test]
    fn test_seeded_shared_minus_arms_deadline() {
        let record = bounded(ConsistencyState::SharedMinus);
        assert_eq!(record.staleness_deadline(), Some(t0() + Duration::seconds(30)));
    }

    #[test]
    fn test_leaving_shared_minus_clears_deadline() {
        let mut record = bounded(ConsistencyState::SharedMinus);
        record.set_state(ConsistencyState::SharedPlus);
        assert!(record.staleness_deadline().is_none());
    }

    #[test]
    fn test_non_bounded_policy_drops_bound() {
        let record = ReplicaRecord::new(
            ReplicaKey::new("SearchService", "ProductModel"),
            ConsistencyState::SharedMinus,
            ConsistencyPolicy::Eventual,
            1,
            Some(5_000),
            t0(),
        );
        assert!(record.staleness_bound_ms().is_none());
        assert!(record.staleness_deadline().is_none());
    }

    #[test]
    fn test_adopt_version_never_decreases() {
        let mut record = bounded(ConsistencyState::Invalid);
        record.adopt_version(5, t0());
        record.adopt_version(3, t0());
        assert_eq!(record.version(), 5);
    }

    #[test]
    fn test_missing_deadline_is_never_due() {
        let record = bounded(ConsistencyState::SharedPlus);
        assert!(!record.is_deadline_due(t0() + Duration::days(365)));
    }

    #[test]
    fn test_remaining_saturates_at_zero() {
        let record = bounded(ConsistencyState::SharedMinus);
        let late = t0() + Duration::seconds(60);
        assert_eq!(record.staleness_remaining(late), Some(Duration::zero()));
    }

    #[test]
    fn test_default_bound_fills_missing() {
        let record = ReplicaRecord::new(
            ReplicaKey::new("AnalyticsService", "ProductModel"),
            ConsistencyState::SharedMinus,
            ConsistencyPolicy::BoundedStaleness,
            1,
            None,
            t0(),
        )
        .with_default_bound(10_000, t0());

        assert_eq!(record.staleness_bound_ms(), Some(10_000));
        assert_eq!(record.staleness_deadline(), Some(t0() + Duration::seconds(10)));
    }
}
