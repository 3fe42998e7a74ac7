//! Consistency States, Policies and Operations
//!
//! Every enum here is closed: the transition function matches on them
//! exhaustively, so adding a variant forces every rule table to be revisited.
//!
//! Serialized names are snake_case; the short codes used by operators
//! (`m`, `s+`, `s-`, `i`, `sc`, `ec`, `bs`, `mr`, `rmw`) are accepted as aliases.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Consistency state of a single replica.
///
/// A replica is in exactly one state at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyState {
    /// Local writer owns the value; not yet shared.
    #[serde(alias = "m")]
    Modified,

    /// Shared and known to be current.
    #[serde(alias = "s+")]
    SharedPlus,

    /// Shared but possibly stale.
    #[serde(alias = "s-")]
    SharedMinus,

    /// Must be re-read before use.
    #[serde(alias = "i")]
    Invalid,
}

impl ConsistencyState {
    /// All states, in declaration order.
    pub const ALL: [ConsistencyState; 4] = [
        Self::Modified,
        Self::SharedPlus,
        Self::SharedMinus,
        Self::Invalid,
    ];

    /// Short code used in audit descriptions.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Modified => "m",
            Self::SharedPlus => "s+",
            Self::SharedMinus => "s-",
            Self::Invalid => "i",
        }
    }

    /// Stable name used in logs and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Modified => "modified",
            Self::SharedPlus => "shared_plus",
            Self::SharedMinus => "shared_minus",
            Self::Invalid => "invalid",
        }
    }

    /// Shared+ or Shared-.
    pub fn is_shared(&self) -> bool {
        matches!(self, Self::SharedPlus | Self::SharedMinus)
    }
}

impl fmt::Display for ConsistencyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ConsistencyState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "modified" | "m" => Ok(Self::Modified),
            "shared_plus" | "s+" => Ok(Self::SharedPlus),
            "shared_minus" | "s-" => Ok(Self::SharedMinus),
            "invalid" | "i" => Ok(Self::Invalid),
            other => Err(format!("unknown consistency state: '{}'", other)),
        }
    }
}

/// Consistency contract of a replica.
///
/// Immutable after bootstrap: it describes the deployment topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyPolicy {
    /// Remote writes invalidate immediately; never Shared-.
    #[serde(alias = "sc")]
    Strong,

    /// Stale reads tolerated without bound.
    #[serde(alias = "ec")]
    Eventual,

    /// Stale reads tolerated until a deadline, then Invalid.
    #[serde(alias = "bs")]
    BoundedStaleness,

    #[serde(alias = "mr")]
    MonotonicReads,

    #[serde(alias = "rmw")]
    ReadMyWrites,
}

impl ConsistencyPolicy {
    /// All policies, in declaration order.
    pub const ALL: [ConsistencyPolicy; 5] = [
        Self::Strong,
        Self::Eventual,
        Self::BoundedStaleness,
        Self::MonotonicReads,
        Self::ReadMyWrites,
    ];

    /// Short code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Strong => "sc",
            Self::Eventual => "ec",
            Self::BoundedStaleness => "bs",
            Self::MonotonicReads => "mr",
            Self::ReadMyWrites => "rmw",
        }
    }

    /// Stable name used in logs and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Eventual => "eventual",
            Self::BoundedStaleness => "bounded_staleness",
            Self::MonotonicReads => "monotonic_reads",
            Self::ReadMyWrites => "read_my_writes",
        }
    }

    pub fn is_strong(&self) -> bool {
        matches!(self, Self::Strong)
    }

    /// Only bounded staleness arms a deadline when entering Shared-.
    pub fn arms_deadline(&self) -> bool {
        matches!(self, Self::BoundedStaleness)
    }
}

impl fmt::Display for ConsistencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ConsistencyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strong" | "sc" => Ok(Self::Strong),
            "eventual" | "ec" => Ok(Self::Eventual),
            "bounded_staleness" | "bs" => Ok(Self::BoundedStaleness),
            "monotonic_reads" | "mr" => Ok(Self::MonotonicReads),
            "read_my_writes" | "rmw" => Ok(Self::ReadMyWrites),
            other => Err(format!("unknown consistency policy: '{}'", other)),
        }
    }
}

/// Input to the transition function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Update,
    Share,
    Refresh,
    Timeout,
    Read,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Self::Update,
        Self::Share,
        Self::Refresh,
        Self::Timeout,
        Self::Read,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Share => "share",
            Self::Refresh => "refresh",
            Self::Timeout => "timeout",
            Self::Read => "read",
        }
    }

    /// Source-originating updates and shares fan out to siblings.
    pub fn propagates(&self) -> bool {
        matches!(self, Self::Update | Self::Share)
    }

    /// Refresh and read-miss copy the version from the authoritative source.
    pub fn needs_authoritative_source(&self) -> bool {
        matches!(self, Self::Refresh | Self::Read)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "update" => Ok(Self::Update),
            "share" => Ok(Self::Share),
            "refresh" => Ok(Self::Refresh),
            "timeout" => Ok(Self::Timeout),
            "read" => Ok(Self::Read),
            other => Err(format!("unknown operation: '{}'", other)),
        }
    }
}
