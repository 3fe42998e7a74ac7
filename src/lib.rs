//! megamodel - replica consistency state transition engine
//!
//! Tracks the consistency state of every (service, component) replica in a
//! service topology and moves replicas between Modified, Shared+, Shared- and
//! Invalid under their declared consistency policy:
//!
//! - `transition`: the pure transition function and sibling propagation
//! - `registry`: replica records and authoritative-source resolution
//! - `sweeper`: bounded-staleness timeouts
//! - `engine`: the serialized entry point tying them together
//! - `topology`: bootstrap configuration

pub mod cli;
pub mod engine;
pub mod model;
pub mod observability;
pub mod registry;
pub mod sweeper;
pub mod topology;
pub mod transition;
