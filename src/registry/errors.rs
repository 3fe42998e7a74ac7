//! # Coherence Errors
//!
//! The transition function and the propagator are total; the only failures
//! in the core are lookups that miss.

use thiserror::Error;

use crate::model::ReplicaKey;

/// Result type for registry and engine operations
pub type CoherenceResult<T> = Result<T, CoherenceError>;

/// Core engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoherenceError {
    /// The (service, component) key was never registered.
    #[error("Unknown replica: {0}")]
    UnknownReplica(ReplicaKey),

    /// Neither the owning service nor a Modified replica exists for the component.
    #[error("No authoritative source for component: {0}")]
    NoAuthoritativeSource(String),
}

impl CoherenceError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownReplica(_) => "MEGAMODEL_UNKNOWN_REPLICA",
            Self::NoAuthoritativeSource(_) => "MEGAMODEL_NO_AUTHORITATIVE_SOURCE",
        }
    }

    /// Caller errors are surfaced immediately and never retried.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::UnknownReplica(_))
    }
}
