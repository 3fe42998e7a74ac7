//! Single sweep pass over a registry

use chrono::{DateTime, Utc};
use tracing::info;

use crate::model::{ConsistencyState, Operation};
use crate::observability::Event;
use crate::registry::Registry;
use crate::transition::{delta, TransitionOrigin, TransitionRecord};

/// Demote every due bounded-staleness replica in `registry`.
///
/// Replicas are visited in key order. A deadline exactly equal to `now` is
/// due. Running a second pass at the same `now` returns nothing.
pub fn sweep_once(registry: &mut Registry, now: DateTime<Utc>) -> Vec<TransitionRecord> {
    let mut records = Vec::new();

    for record in registry.iter_mut() {
        if record.state() != ConsistencyState::SharedMinus || !record.is_deadline_due(now) {
            continue;
        }

        let transition = delta(record.state(), Operation::Timeout, record.policy(), false);
        if transition.is_noop() {
            continue;
        }
        let deadline = record.staleness_deadline();
        transition.apply_to(record, None, now);

        info!(
            event = Event::StalenessTimeout.as_str(),
            replica = %record.key(),
            deadline = ?deadline,
            "staleness bound exceeded"
        );

        records.push(TransitionRecord::new(
            now,
            record.key(),
            Operation::Timeout,
            transition.from,
            transition.to,
            TransitionOrigin::Sweep,
            format!(
                "Staleness timeout: {} in {} exceeded its bound and is now invalid",
                record.component(),
                record.service()
            ),
        ));
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConsistencyPolicy, ReplicaKey, ReplicaRecord};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn registry() -> Registry {
        Registry::from_records(vec![
            ReplicaRecord::new(
                ReplicaKey::new("OrderService", "InventoryModel"),
                ConsistencyState::SharedMinus,
                ConsistencyPolicy::BoundedStaleness,
                3,
                Some(30_000),
                t0(),
            ),
            ReplicaRecord::new(
                ReplicaKey::new("SearchService", "InventoryModel"),
                ConsistencyState::SharedMinus,
                ConsistencyPolicy::Eventual,
                3,
                None,
                t0(),
            ),
        ])
    }

    #[test]
    fn test_not_due_before_deadline() {
        let mut registry = registry();
        assert!(sweep_once(&mut registry, t0() + Duration::milliseconds(29_999)).is_empty());
    }

    #[test]
    fn test_due_at_exact_deadline() {
        let mut registry = registry();
        let records = sweep_once(&mut registry, t0() + Duration::seconds(30));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].to_state, ConsistencyState::Invalid);
        assert_eq!(records[0].origin, TransitionOrigin::Sweep);

        let record = registry
            .get(&ReplicaKey::new("OrderService", "InventoryModel"))
            .unwrap();
        assert_eq!(record.state(), ConsistencyState::Invalid);
        assert_eq!(record.version(), 3);
        assert_eq!(record.staleness_deadline(), None);
    }

    #[test]
    fn test_eventual_never_times_out() {
        let mut registry = registry();
        sweep_once(&mut registry, t0() + Duration::days(365));

        let record = registry
            .get(&ReplicaKey::new("SearchService", "InventoryModel"))
            .unwrap();
        assert_eq!(record.state(), ConsistencyState::SharedMinus);
    }

    #[test]
    fn test_second_pass_is_empty() {
        let mut registry = registry();
        let now = t0() + Duration::seconds(31);
        assert_eq!(sweep_once(&mut registry, now).len(), 1);
        assert!(sweep_once(&mut registry, now).is_empty());
    }
}
