//! Transition Records
//!
//! One audit entry per state-affecting step: the local transition of an
//! `Apply`, each propagated sibling effect, and each staleness timeout.
//! Entries are never mutated after they are appended to a trail.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{ConsistencyState, Operation, ReplicaKey};

/// What produced a transition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionOrigin {
    /// The replica named by the `Apply` call.
    Local,
    /// A sibling affected by propagation.
    Propagated,
    /// The staleness sweep.
    Sweep,
}

impl TransitionOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Propagated => "propagated",
            Self::Sweep => "sweep",
        }
    }
}

impl fmt::Display for TransitionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    /// Position in the engine's audit trail; assigned on append.
    pub seq: u64,

    pub timestamp: DateTime<Utc>,

    pub service: String,

    pub component: String,

    pub operation: Operation,

    pub from_state: ConsistencyState,

    pub to_state: ConsistencyState,

    pub origin: TransitionOrigin,

    /// Human-readable description.
    pub description: String,
}

impl TransitionRecord {
    /// Create an unsequenced record.
    pub fn new(
        timestamp: DateTime<Utc>,
        key: &ReplicaKey,
        operation: Operation,
        from_state: ConsistencyState,
        to_state: ConsistencyState,
        origin: TransitionOrigin,
        description: impl Into<String>,
    ) -> Self {
        Self {
            seq: 0,
            timestamp,
            service: key.service.clone(),
            component: key.component.clone(),
            operation,
            from_state,
            to_state,
            origin,
            description: description.into(),
        }
    }

    pub fn key(&self) -> ReplicaKey {
        ReplicaKey::new(self.service.clone(), self.component.clone())
    }

    /// Whether the state actually changed.
    pub fn changed_state(&self) -> bool {
        self.from_state != self.to_state
    }
}

impl fmt::Display for TransitionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {}.{} {} {} -> {} ({})",
            self.seq,
            self.service,
            self.component,
            self.operation,
            self.from_state,
            self.to_state,
            self.origin
        )
    }
}
