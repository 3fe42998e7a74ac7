//! Topology Configuration Tests
//!
//! Loading bootstrap topologies from disk, validation failures, and the
//! shipped demo topology.

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use megamodel::cli;
use megamodel::engine::{Engine, ManualClock};
use megamodel::model::{ConsistencyPolicy, ConsistencyState, ReplicaKey};
use megamodel::topology::{ecommerce, TopologyConfig, TopologyError};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

// =============================================================================
// Loading
// =============================================================================

/// Short codes and long names load to the same values.
#[test]
fn test_short_codes_and_long_names() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "topology.json",
        r#"{
            "replicas": [
                {"service":"OrderService","component":"InventoryModel","state":"s-","policy":"bs"},
                {"service":"InventoryService","component":"InventoryModel","state":"modified","policy":"strong","version":3},
                {"service":"CartService","component":"InventoryModel","state":"shared_plus","policy":"rmw"}
            ]
        }"#,
    );

    let config = TopologyConfig::load(&path).unwrap();

    assert_eq!(config.replicas[0].state, ConsistencyState::SharedMinus);
    assert_eq!(config.replicas[0].policy, ConsistencyPolicy::BoundedStaleness);
    assert_eq!(config.replicas[1].state, ConsistencyState::Modified);
    assert_eq!(config.replicas[1].version, 3);
    assert_eq!(config.replicas[2].policy, ConsistencyPolicy::ReadMyWrites);
}

/// A missing file is an I/O error.
#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = TopologyConfig::load(&dir.path().join("absent.json"));
    assert!(matches!(result, Err(TopologyError::Io(_))));
}

/// Unknown state names are rejected by the parser.
#[test]
fn test_unknown_state_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "topology.json",
        r#"{"replicas":[{"service":"OrderService","component":"OrderModel","state":"exclusive","policy":"sc"}]}"#,
    );
    assert!(matches!(TopologyConfig::load(&path), Err(TopologyError::Json(_))));
}

/// A zero explicit bound is rejected.
#[test]
fn test_zero_bound_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "topology.json",
        r#"{"replicas":[{"service":"OrderService","component":"InventoryModel","state":"i","policy":"bs","staleness_bound_ms":0}]}"#,
    );
    let err = TopologyConfig::load(&path).unwrap_err();
    assert!(matches!(err, TopologyError::ZeroStalenessBound(_)));
}

/// Operation models must reference declared replicas.
#[test]
fn test_model_with_unknown_replica_rejected() {
    let mut config = ecommerce();
    config.operation_models[0]
        .access
        .push(megamodel::topology::AccessEntry::new(
            "ShippingService",
            "OrderModel",
            megamodel::topology::AccessPattern::Read,
        ));

    match config.validate() {
        Err(TopologyError::UnknownModelReplica { model, key }) => {
            assert_eq!(model, "gom1");
            assert_eq!(key, ReplicaKey::new("ShippingService", "OrderModel"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

// =============================================================================
// Demo Topology
// =============================================================================

/// The shipped demo file describes the built-in topology.
#[test]
fn test_demo_matches_builtin() {
    let config = TopologyConfig::load(&demo("ecommerce.json")).unwrap();
    assert_eq!(config, ecommerce());
}

/// The demo request script runs end to end without request errors.
#[test]
fn test_demo_script_runs() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    ));
    let engine = Engine::bootstrap(&ecommerce(), clock).unwrap();
    let script = fs::read_to_string(demo("order_flow.jsonl")).unwrap();

    let mut out = Vec::new();
    cli::serve(&engine, Cursor::new(script), &mut out).unwrap();

    let responses: Vec<serde_json::Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), 13);
    assert!(responses.iter().all(|r| r["status"] == "ok"));

    let mismatches: Vec<usize> = responses
        .iter()
        .enumerate()
        .filter(|(_, r)| r["data"]["expectation"]["matched"] == false)
        .map(|(index, _)| index)
        .collect();
    assert_eq!(mismatches, vec![4, 9]);
}

/// `init` writes a file that `TopologyConfig::load` accepts.
#[test]
fn test_init_output_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("topology.json");

    cli::init(&path).unwrap();

    assert_eq!(TopologyConfig::load(&path).unwrap(), ecommerce());
    assert!(cli::init(&path).is_err());
}
