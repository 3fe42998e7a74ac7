//! Consistency Property Tests
//!
//! Random operation sequences over the e-commerce topology, checking after
//! every step:
//! - determinism: identical inputs give identical registries and trails
//! - strong replicas never sit in Shared-
//! - versions never decrease
//! - a staleness deadline exists exactly for bounded Shared- replicas
//! - after a sweep at `now`, no deadline at or before `now` remains

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use megamodel::engine::{Clock, Engine, ManualClock};
use megamodel::model::{ConsistencyPolicy, ConsistencyState, Operation, ReplicaKey};
use megamodel::registry::OwnershipConvention;
use megamodel::topology::ecommerce;
use proptest::prelude::*;

/// One scripted step: apply to a replica, or sweep.
#[derive(Debug, Clone)]
enum Step {
    Apply {
        replica: usize,
        operation: Operation,
        is_source: bool,
        advance_ms: i64,
    },
    Sweep {
        advance_ms: i64,
    },
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (0usize..9, 0usize..5, any::<bool>(), 0i64..20_000).prop_map(
            |(replica, op, is_source, advance_ms)| Step::Apply {
                replica,
                operation: Operation::ALL[op],
                is_source,
                advance_ms,
            }
        ),
        1 => (0i64..90_000).prop_map(|advance_ms| Step::Sweep { advance_ms }),
    ]
}

fn keys() -> Vec<ReplicaKey> {
    ecommerce().replicas.iter().map(|seed| seed.key()).collect()
}

fn boot() -> (Engine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    ));
    let engine = Engine::bootstrap(&ecommerce(), clock.clone()).unwrap();
    (engine, clock)
}

fn run(engine: &Engine, clock: &ManualClock, steps: &[Step]) {
    let keys = keys();
    for step in steps {
        match step {
            Step::Apply {
                replica,
                operation,
                is_source,
                advance_ms,
            } => {
                clock.advance(Duration::milliseconds(*advance_ms));
                let key = &keys[*replica];
                engine.apply_key(key, *operation, *is_source).unwrap();
            }
            Step::Sweep { advance_ms } => {
                clock.advance(Duration::milliseconds(*advance_ms));
                engine.sweep_now();
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Same topology, same clock, same steps: same registry and same trail.
    #[test]
    fn prop_deterministic(steps in prop::collection::vec(step_strategy(), 0..60)) {
        let (first, first_clock) = boot();
        let (second, second_clock) = boot();

        run(&first, &first_clock, &steps);
        run(&second, &second_clock, &steps);

        prop_assert_eq!(first.snapshot(), second.snapshot());
        prop_assert_eq!(first.history(), second.history());
    }

    /// Per-step invariants over every replica.
    #[test]
    fn prop_invariants_hold(steps in prop::collection::vec(step_strategy(), 1..60)) {
        let (engine, clock) = boot();
        let mut versions: BTreeMap<ReplicaKey, u64> = engine
            .snapshot()
            .records
            .iter()
            .map(|record| (record.key().clone(), record.version()))
            .collect();

        for step in &steps {
            run(&engine, &clock, std::slice::from_ref(step));
            let snapshot = engine.snapshot();

            for record in &snapshot.records {
                if record.policy() == ConsistencyPolicy::Strong {
                    prop_assert_ne!(record.state(), ConsistencyState::SharedMinus);
                }

                let previous = versions.insert(record.key().clone(), record.version());
                prop_assert!(previous.unwrap_or(0) <= record.version());

                let bounded_stale = record.policy() == ConsistencyPolicy::BoundedStaleness
                    && record.state() == ConsistencyState::SharedMinus;
                prop_assert_eq!(record.staleness_deadline().is_some(), bounded_stale);

                if let (Step::Sweep { .. }, Some(deadline)) = (step, record.staleness_deadline()) {
                    prop_assert!(deadline > clock.now());
                }
            }
        }
    }

    /// When only the owning service acts as source, a component never has
    /// more than one writer.
    #[test]
    fn prop_owner_only_writes_keep_single_writer(
        steps in prop::collection::vec(step_strategy(), 1..60)
    ) {
        let config = ecommerce();
        let ownership = OwnershipConvention::with_overrides(config.owners.clone());
        let keys = keys();
        let owner_steps: Vec<Step> = steps
            .into_iter()
            .map(|step| match step {
                Step::Apply { replica, operation, is_source, advance_ms } => {
                    let key = &keys[replica];
                    let owned = ownership.owner_of(&key.component).as_deref() == Some(key.service.as_str());
                    Step::Apply { replica, operation, is_source: is_source && owned, advance_ms }
                }
                sweep => sweep,
            })
            .collect();

        let (engine, clock) = boot();
        for step in &owner_steps {
            run(&engine, &clock, std::slice::from_ref(step));
            for key in &keys {
                prop_assert!(engine.writers(&key.component).len() <= 1);
            }
        }
    }
}
