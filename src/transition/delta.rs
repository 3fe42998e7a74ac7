//! Transition Function δ
//!
//! | From | Op | Policy | Source | To | Effect |
//! |---|---|---|---|---|---|
//! | m | share | any | yes | s+ | version + 1 |
//! | s+ | update | strong | no | i | - |
//! | s+ | update | not strong | no | s- | arm deadline (bounded) |
//! | s- | refresh | any | any | s+ | adopt authoritative version |
//! | s- | timeout | bounded | any | i | clear deadline |
//! | i | read | strong | any | s+ | adopt authoritative version |
//! | i | read | not strong | any | s- | adopt authoritative version, arm deadline (bounded) |
//! | i | update | any | yes | m | version + 1 |
//! | s+, s- | update | any | yes | m | - |
//!
//! Anything else leaves the state unchanged.

use chrono::{DateTime, Utc};

use crate::model::{ConsistencyPolicy, ConsistencyState, Operation, ReplicaRecord};

use crate::model::ConsistencyState::{Invalid, Modified, SharedMinus, SharedPlus};

/// The rule of the table that matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// m --share--> s+
    PublishModified,
    /// s+ --update--> i under strong consistency
    InvalidateStrong,
    /// s+ --update--> s- under relaxed consistency
    DemoteToStale,
    /// s- --refresh--> s+
    Refresh,
    /// s- --timeout--> i under bounded staleness
    StalenessTimeout,
    /// i --read--> s+ under strong consistency
    ReadMissStrong,
    /// i --read--> s- under relaxed consistency
    ReadMissRelaxed,
    /// i --update--> m
    FirstWrite,
    /// s+/s- --update--> m
    Rewrite,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PublishModified => "publish_modified",
            Self::InvalidateStrong => "invalidate_strong",
            Self::DemoteToStale => "demote_to_stale",
            Self::Refresh => "refresh",
            Self::StalenessTimeout => "staleness_timeout",
            Self::ReadMissStrong => "read_miss_strong",
            Self::ReadMissRelaxed => "read_miss_relaxed",
            Self::FirstWrite => "first_write",
            Self::Rewrite => "rewrite",
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            Self::PublishModified => "local write shared",
            Self::InvalidateStrong => "invalidated by remote write under strong consistency",
            Self::DemoteToStale => "potentially stale after remote write",
            Self::Refresh => "refreshed from authoritative source",
            Self::StalenessTimeout => "staleness bound exceeded",
            Self::ReadMissStrong => "read miss resolved with current value",
            Self::ReadMissRelaxed => "read miss resolved with possibly stale value",
            Self::FirstWrite => "local write from invalid",
            Self::Rewrite => "local write over shared value",
        }
    }
}

/// Version side effect of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionEffect {
    Unchanged,
    /// version += 1 and timestamp refresh.
    Bump,
    /// version := authoritative source's version.
    AdoptAuthoritative,
}

/// Result of δ for one replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ConsistencyState,
    pub to: ConsistencyState,
    pub operation: Operation,
    /// `None` when no rule matched.
    pub rule: Option<Rule>,
    pub version: VersionEffect,
    /// Whether the staleness deadline is (re)armed on arrival in Shared-.
    pub arm_deadline: bool,
}

/// Compute the next state and side effects.
pub fn delta(
    state: ConsistencyState,
    operation: Operation,
    policy: ConsistencyPolicy,
    is_source: bool,
) -> Transition {
    let strong = policy.is_strong();
    let matched = match (state, operation) {
        (Modified, Operation::Share) if is_source => {
            Some((SharedPlus, Rule::PublishModified, VersionEffect::Bump))
        }
        (SharedPlus, Operation::Update) if !is_source && strong => {
            Some((Invalid, Rule::InvalidateStrong, VersionEffect::Unchanged))
        }
        (SharedPlus, Operation::Update) if !is_source => {
            Some((SharedMinus, Rule::DemoteToStale, VersionEffect::Unchanged))
        }
        (SharedMinus, Operation::Refresh) => {
            Some((SharedPlus, Rule::Refresh, VersionEffect::AdoptAuthoritative))
        }
        (SharedMinus, Operation::Timeout) if policy.arms_deadline() => {
            Some((Invalid, Rule::StalenessTimeout, VersionEffect::Unchanged))
        }
        (Invalid, Operation::Read) if strong => {
            Some((SharedPlus, Rule::ReadMissStrong, VersionEffect::AdoptAuthoritative))
        }
        (Invalid, Operation::Read) => {
            Some((SharedMinus, Rule::ReadMissRelaxed, VersionEffect::AdoptAuthoritative))
        }
        (Invalid, Operation::Update) if is_source => {
            Some((Modified, Rule::FirstWrite, VersionEffect::Bump))
        }
        (SharedPlus | SharedMinus, Operation::Update) if is_source => {
            Some((Modified, Rule::Rewrite, VersionEffect::Unchanged))
        }
        _ => None,
    };

    match matched {
        Some((to, rule, version)) => Transition {
            from: state,
            to,
            operation,
            rule: Some(rule),
            version,
            arm_deadline: to == SharedMinus && policy.arms_deadline(),
        },
        None => Transition {
            from: state,
            to: state,
            operation,
            rule: None,
            version: VersionEffect::Unchanged,
            arm_deadline: false,
        },
    }
}

impl Transition {
    pub fn is_noop(&self) -> bool {
        self.rule.is_none()
    }

    /// Whether this transition needs the authoritative source's version.
    pub fn needs_authoritative_version(&self) -> bool {
        self.version == VersionEffect::AdoptAuthoritative
    }

    /// Apply to `record`.
    ///
    /// `authoritative_version` is consulted only for `AdoptAuthoritative`;
    /// when it is `None` the state still moves but version and timestamp stay.
    pub fn apply_to(
        &self,
        record: &mut ReplicaRecord,
        authoritative_version: Option<u64>,
        now: DateTime<Utc>,
    ) {
        if self.is_noop() {
            return;
        }

        let unresolved =
            self.version == VersionEffect::AdoptAuthoritative && authoritative_version.is_none();
        record.set_state(self.to);

        match self.version {
            VersionEffect::Unchanged => {}
            VersionEffect::Bump => record.bump_version(now),
            VersionEffect::AdoptAuthoritative => {
                if let Some(version) = authoritative_version {
                    record.adopt_version(version, now);
                }
            }
        }

        if self.arm_deadline && record.arm_deadline(now).is_some() && !unresolved {
            record.touch(now);
        }
    }

    /// Audit description for the replica the transition was applied to.
    pub fn describe(&self, record: &ReplicaRecord) -> String {
        match self.rule {
            Some(rule) => format!(
                "{}: {} -> {} ({}, version {})",
                record.key(),
                self.from,
                self.to,
                rule.summary(),
                record.version()
            ),
            None => format!(
                "{}: no transition rule for {} in {} under {}",
                record.key(),
                self.operation,
                self.from,
                record.policy()
            ),
        }
    }
}
