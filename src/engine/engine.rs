//! Engine

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::audit::AuditTrail;
use super::clock::Clock;
use crate::model::{ConsistencyState, Operation, ReplicaKey};
use crate::observability::{Event, MetricsRegistry, MetricsSnapshot};
use crate::registry::{CoherenceError, CoherenceResult, Registry, RegistrySnapshot, Resolver};
use crate::sweeper::sweep_once;
use crate::topology::{OperationModel, TopologyConfig, TopologyResult};
use crate::transition::{delta, Propagator, TransitionOrigin, TransitionRecord};

/// Result of a successful `apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// State of the addressed replica after the call.
    pub state: ConsistencyState,

    /// Version of the addressed replica after the call.
    pub version: u64,

    /// Local entry first, then propagated entries in scan order.
    pub transitions: Vec<TransitionRecord>,

    /// Set when a refresh or read-miss found no authoritative source. The
    /// transition still happened; version and timestamp were left alone.
    pub unresolved_source: Option<CoherenceError>,
}

/// Mutable state guarded by the engine lock.
#[derive(Debug)]
struct Shared {
    registry: Registry,
    trail: AuditTrail,
}

/// Serializes every mutation of one registry.
#[derive(Debug)]
pub struct Engine {
    shared: Mutex<Shared>,
    resolver: Resolver,
    propagator: Propagator,
    clock: Arc<dyn Clock>,
    metrics: MetricsRegistry,
    operation_models: Vec<OperationModel>,
}

impl Engine {
    /// Create an engine over an already-seeded registry.
    pub fn new(registry: Registry, resolver: Resolver, clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Mutex::new(Shared {
                registry,
                trail: AuditTrail::new(),
            }),
            resolver,
            propagator: Propagator::new(),
            clock,
            metrics: MetricsRegistry::new(),
            operation_models: Vec::new(),
        }
    }

    /// Validate `config` and seed a registry from it.
    pub fn bootstrap(config: &TopologyConfig, clock: Arc<dyn Clock>) -> TopologyResult<Self> {
        info!(event = Event::BootStart.as_str(), replicas = config.replicas.len(), "bootstrapping registry");
        config.validate()?;

        let registry = config.build_registry(clock.now());
        let mut engine = Self::new(registry, Resolver::new(config.ownership()), clock);
        engine.operation_models = config.operation_models.clone();

        info!(
            event = Event::BootComplete.as_str(),
            replicas = config.replicas.len(),
            operation_models = config.operation_models.len(),
            "registry seeded"
        );
        Ok(engine)
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        // Every mutation completes before its guard drops; a poisoned lock
        // still holds a consistent registry.
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // =========================================================================
    // APPLY
    // =========================================================================

    /// Apply `operation` to (service, component).
    ///
    /// Fails only with `UnknownReplica`; an unmatched rule is a no-op that
    /// still produces its local audit entry.
    pub fn apply(
        &self,
        service: &str,
        component: &str,
        operation: Operation,
        is_source: bool,
    ) -> CoherenceResult<ApplyOutcome> {
        self.apply_key(&ReplicaKey::new(service, component), operation, is_source)
    }

    /// Apply `operation` to `key`.
    pub fn apply_key(
        &self,
        key: &ReplicaKey,
        operation: Operation,
        is_source: bool,
    ) -> CoherenceResult<ApplyOutcome> {
        let mut shared = self.lock();
        let now = self.clock.now();

        let (state, policy) = match shared.registry.get(key) {
            Ok(record) => (record.state(), record.policy()),
            Err(err) => {
                self.metrics.increment_unknown_replicas();
                warn!(event = Event::UnknownReplica.as_str(), replica = %key, operation = operation.as_str(), "apply rejected");
                return Err(err);
            }
        };
        self.metrics.increment_applies();

        let transition = delta(state, operation, policy, is_source);

        let mut unresolved_source = None;
        let mut authoritative_version = None;
        if transition.needs_authoritative_version() {
            match self.resolver.resolve(&key.component, &shared.registry) {
                Ok(source) => authoritative_version = Some(shared.registry.get(&source)?.version()),
                Err(err) => {
                    self.metrics.increment_unresolved_sources();
                    warn!(
                        event = Event::SourceUnresolved.as_str(),
                        replica = %key,
                        operation = operation.as_str(),
                        "no authoritative source; version left unchanged"
                    );
                    unresolved_source = Some(err);
                }
            }
        }

        let record = shared.registry.get_mut(key)?;
        transition.apply_to(record, authoritative_version, now);
        let version = record.version();
        let local = TransitionRecord::new(
            now,
            key,
            operation,
            transition.from,
            transition.to,
            TransitionOrigin::Local,
            transition.describe(record),
        );

        if transition.is_noop() {
            self.metrics.increment_noop_applies();
            debug!(
                event = Event::TransitionNoop.as_str(),
                replica = %key,
                operation = operation.as_str(),
                state = state.code(),
                is_source,
                "no transition rule matched"
            );
        } else {
            self.metrics.increment_local_transitions();
            info!(
                event = Event::TransitionApplied.as_str(),
                replica = %key,
                operation = operation.as_str(),
                from = transition.from.code(),
                to = transition.to.code(),
                version,
                is_source,
                "transition applied"
            );
        }

        let mut batch = vec![local];
        if is_source && operation.propagates() {
            let propagated = self
                .propagator
                .propagate(&mut shared.registry, key, operation, now)?;
            self.metrics.add_propagated_transitions(propagated.len() as u64);
            batch.extend(propagated);
        }

        let transitions = shared.trail.append(batch);

        Ok(ApplyOutcome {
            state: transition.to,
            version,
            transitions,
            unresolved_source,
        })
    }

    // =========================================================================
    // SWEEP
    // =========================================================================

    /// Demote every bounded-staleness replica whose deadline is ≤ `now`.
    pub fn sweep_once(&self, now: DateTime<Utc>) -> Vec<TransitionRecord> {
        let mut shared = self.lock();
        let demoted = sweep_once(&mut shared.registry, now);

        self.metrics.increment_sweeps();
        self.metrics.add_staleness_timeouts(demoted.len() as u64);
        if !demoted.is_empty() {
            debug!(event = Event::SweepComplete.as_str(), demoted = demoted.len(), "sweep complete");
        }

        shared.trail.append(demoted)
    }

    /// Sweep at the engine clock's current time.
    pub fn sweep_now(&self) -> Vec<TransitionRecord> {
        self.sweep_once(self.clock.now())
    }

    // =========================================================================
    // RESOLVE / SNAPSHOT
    // =========================================================================

    /// Authoritative replica of `component`.
    pub fn resolve(&self, component: &str) -> CoherenceResult<ReplicaKey> {
        let shared = self.lock();
        self.resolver.resolve(component, &shared.registry)
    }

    /// Detached copy of every record.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let shared = self.lock();
        RegistrySnapshot::capture(&shared.registry, self.clock.now())
    }

    /// Modified replicas of `component`, in key order.
    pub fn writers(&self, component: &str) -> Vec<ReplicaKey> {
        let shared = self.lock();
        shared.registry.writers(component).into_iter().cloned().collect()
    }

    // =========================================================================
    // AUDIT / METRICS / MODELS
    // =========================================================================

    /// Copy of the audit trail.
    pub fn history(&self) -> Vec<TransitionRecord> {
        self.lock().trail.records().to_vec()
    }

    /// Take ownership of the audit trail accumulated so far.
    pub fn drain_history(&self) -> Vec<TransitionRecord> {
        self.lock().trail.drain()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn operation_models(&self) -> &[OperationModel] {
        &self.operation_models
    }

    /// Snapshot restricted to the replicas of operation model `id`.
    pub fn operation_model_view(&self, id: &str) -> Option<RegistrySnapshot> {
        let model = self.operation_models.iter().find(|model| model.id == id)?;
        let keys = model.keys();
        Some(self.snapshot().restrict_to(keys.iter()))
    }
}
