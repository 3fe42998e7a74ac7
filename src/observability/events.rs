//! Observability events
//!
//! Every log line emitted by the engine carries one of these names in its
//! `event` field, so log consumers can filter without parsing messages.

use std::fmt;

/// Observable events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Bootstrap begins
    BootStart,
    /// Registry seeded, engine ready
    BootComplete,
    /// Topology file loaded and validated
    TopologyLoaded,
    /// Shutdown initiated
    ShutdownStart,
    /// Shutdown complete
    ShutdownComplete,

    // Transitions
    /// A rule matched and the local replica moved
    TransitionApplied,
    /// No rule matched; state unchanged
    TransitionNoop,
    /// A sibling was affected by propagation
    Propagation,
    /// Apply referenced an unregistered replica
    UnknownReplica,
    /// Refresh or read-miss found no authoritative source
    SourceUnresolved,
    /// More than one Modified replica of one component
    MultipleWriters,

    // Staleness
    /// A bounded-staleness replica was demoted by the sweep
    StalenessTimeout,
    /// A sweep pass finished
    SweepComplete,
    /// Background sweeper started
    SweeperStarted,
    /// Background sweeper stopped
    SweeperStopped,
}

impl Event {
    /// Returns the event name string
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOOT_START",
            Event::BootComplete => "BOOT_COMPLETE",
            Event::TopologyLoaded => "TOPOLOGY_LOADED",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
            Event::TransitionApplied => "TRANSITION_APPLIED",
            Event::TransitionNoop => "TRANSITION_NOOP",
            Event::Propagation => "PROPAGATION",
            Event::UnknownReplica => "UNKNOWN_REPLICA",
            Event::SourceUnresolved => "SOURCE_UNRESOLVED",
            Event::MultipleWriters => "MULTIPLE_WRITERS",
            Event::StalenessTimeout => "STALENESS_TIMEOUT",
            Event::SweepComplete => "SWEEP_COMPLETE",
            Event::SweeperStarted => "SWEEPER_STARTED",
            Event::SweeperStopped => "SWEEPER_STOPPED",
        }
    }

    /// Returns true if this event indicates a condition worth a warning
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Event::UnknownReplica | Event::SourceUnresolved | Event::MultipleWriters
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_screaming_snake() {
        let events = [
            Event::BootStart,
            Event::TransitionApplied,
            Event::StalenessTimeout,
            Event::SweeperStopped,
        ];
        for event in events {
            let name = event.as_str();
            assert!(name.chars().all(|c| c.is_ascii_uppercase() || c == '_'), "{}", name);
        }
    }

    #[test]
    fn test_warning_events() {
        assert!(Event::SourceUnresolved.is_warning());
        assert!(Event::MultipleWriters.is_warning());
        assert!(!Event::TransitionApplied.is_warning());
    }
}
