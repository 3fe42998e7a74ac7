//! Registry Snapshots
//!
//! Owned, read-only copies of the registry for rendering and reporting.
//! Nothing in a snapshot refers back into the live registry.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::store::Registry;
use crate::model::{ConsistencyPolicy, ConsistencyState, ReplicaKey, ReplicaRecord};

/// Point-in-time copy of every replica record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrySnapshot {
    /// Clock value the snapshot was taken at.
    pub taken_at: DateTime<Utc>,

    /// Records in key order.
    pub records: Vec<ReplicaRecord>,

    /// Aggregates derived from `records`.
    pub summary: RegistrySummary,
}

/// Aggregate view of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrySummary {
    /// Replica count per state; every state is present.
    pub states: BTreeMap<ConsistencyState, usize>,

    /// Replica count per policy; every policy is present.
    pub policies: BTreeMap<ConsistencyPolicy, usize>,

    /// Replicas currently in Modified.
    pub modified: Vec<ReplicaKey>,

    /// Bounded-staleness replicas waiting on a deadline.
    pub staleness: Vec<StalenessCountdown>,
}

/// Remaining staleness window of a Shared- replica.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StalenessCountdown {
    pub key: ReplicaKey,
    pub deadline: DateTime<Utc>,
    pub remaining_ms: i64,
}

impl RegistrySnapshot {
    /// Capture `registry` as of `now`.
    pub fn capture(registry: &Registry, now: DateTime<Utc>) -> Self {
        Self::from_records(registry.iter().cloned().collect(), now)
    }

    /// Build a snapshot over an already-selected record set.
    pub fn from_records(records: Vec<ReplicaRecord>, now: DateTime<Utc>) -> Self {
        let summary = RegistrySummary::compute(&records, now);
        Self {
            taken_at: now,
            records,
            summary,
        }
    }

    /// Record for `key`, if present.
    pub fn record(&self, key: &ReplicaKey) -> Option<&ReplicaRecord> {
        self.records.iter().find(|record| record.key() == key)
    }

    /// State of `key`, if present.
    pub fn state_of(&self, key: &ReplicaKey) -> Option<ConsistencyState> {
        self.record(key).map(|record| record.state())
    }

    /// Restrict to the given keys, recomputing the summary.
    pub fn restrict_to<'a>(&self, keys: impl IntoIterator<Item = &'a ReplicaKey>) -> Self {
        let keys: Vec<&ReplicaKey> = keys.into_iter().collect();
        let records = self
            .records
            .iter()
            .filter(|record| keys.contains(&record.key()))
            .cloned()
            .collect();
        Self::from_records(records, self.taken_at)
    }
}

impl RegistrySummary {
    fn compute(records: &[ReplicaRecord], now: DateTime<Utc>) -> Self {
        let mut states: BTreeMap<ConsistencyState, usize> =
            ConsistencyState::ALL.iter().map(|state| (*state, 0)).collect();
        let mut policies: BTreeMap<ConsistencyPolicy, usize> =
            ConsistencyPolicy::ALL.iter().map(|policy| (*policy, 0)).collect();
        let mut modified = Vec::new();
        let mut staleness = Vec::new();

        for record in records {
            *states.entry(record.state()).or_default() += 1;
            *policies.entry(record.policy()).or_default() += 1;

            if record.state() == ConsistencyState::Modified {
                modified.push(record.key().clone());
            }

            if let (Some(deadline), Some(remaining)) =
                (record.staleness_deadline(), record.staleness_remaining(now))
            {
                staleness.push(StalenessCountdown {
                    key: record.key().clone(),
                    deadline,
                    remaining_ms: remaining.num_milliseconds(),
                });
            }
        }

        Self {
            states,
            policies,
            modified,
            staleness,
        }
    }

    /// Number of replicas in `state`.
    pub fn count(&self, state: ConsistencyState) -> usize {
        self.states.get(&state).copied().unwrap_or(0)
    }
}
