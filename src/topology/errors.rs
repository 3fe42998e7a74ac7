//! # Topology Errors
//!
//! Configuration problems found while loading or validating a topology.
//! All of them are fatal at startup.

use thiserror::Error;

use crate::model::ReplicaKey;

/// Result type for topology operations
pub type TopologyResult<T> = Result<T, TopologyError>;

/// Topology errors
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Topology file could not be read
    #[error("Failed to read topology: {0}")]
    Io(#[from] std::io::Error),

    /// Topology file is not valid JSON for the schema
    #[error("Invalid topology JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// No replicas declared
    #[error("Topology declares no replicas")]
    Empty,

    /// Service or component name is blank
    #[error("Replica has an empty service or component name")]
    BlankName,

    /// The same (service, component) pair appears twice
    #[error("Duplicate replica: {0}")]
    DuplicateReplica(ReplicaKey),

    /// Strong replicas cannot start in Shared-
    #[error("Strong replica {0} cannot be seeded in shared_minus")]
    StrongSeededStale(ReplicaKey),

    /// A staleness bound on a policy that never arms a deadline
    #[error("Staleness bound configured on non-bounded-staleness replica {0}")]
    BoundOnUnboundedPolicy(ReplicaKey),

    /// A zero staleness bound
    #[error("Staleness bound must be > 0 ({0})")]
    ZeroStalenessBound(String),

    /// Sweep interval of zero
    #[error("sweep_interval_ms must be > 0")]
    ZeroSweepInterval,

    /// More than one Modified replica seeded for one component
    #[error("Component {0} is seeded with more than one modified replica")]
    MultipleSeededWriters(String),

    /// Owner override points at a replica that does not exist
    #[error("Owner {service} of component {component} has no replica")]
    UnknownOwner { component: String, service: String },

    /// Operation model id declared twice
    #[error("Duplicate operation model: {0}")]
    DuplicateOperationModel(String),

    /// Operation model references an undeclared replica
    #[error("Operation model {model} references unknown replica {key}")]
    UnknownModelReplica { model: String, key: ReplicaKey },
}

impl TopologyError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "MEGAMODEL_TOPOLOGY_IO",
            Self::Json(_) => "MEGAMODEL_TOPOLOGY_JSON",
            _ => "MEGAMODEL_TOPOLOGY_INVALID",
        }
    }
}
