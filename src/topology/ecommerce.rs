//! Built-in e-commerce topology
//!
//! Order processing across order, payment and inventory services, plus a
//! product-search flow over a shared product catalogue. Used by `init` and
//! as the reference fixture in tests.

use super::config::{ReplicaSeed, TopologyConfig};
use super::operation_model::{AccessEntry, AccessPattern, OperationModel};
use crate::model::ConsistencyPolicy::{BoundedStaleness, Eventual, Strong};
use crate::model::ConsistencyState::{Invalid, SharedPlus};

/// The e-commerce reference topology.
pub fn ecommerce() -> TopologyConfig {
    let replicas = vec![
        ReplicaSeed::new("OrderService", "OrderModel", Invalid, Strong, 0),
        ReplicaSeed::new("OrderService", "PaymentModel", Invalid, Strong, 0),
        ReplicaSeed::new("OrderService", "InventoryModel", Invalid, BoundedStaleness, 0)
            .with_staleness_bound(30_000),
        ReplicaSeed::new("OrderService", "ProductModel", SharedPlus, Eventual, 1),
        ReplicaSeed::new("PaymentService", "OrderModel", Invalid, Strong, 0),
        ReplicaSeed::new("PaymentService", "PaymentModel", Invalid, Strong, 0),
        ReplicaSeed::new("InventoryService", "InventoryModel", SharedPlus, Strong, 1),
        ReplicaSeed::new("SearchService", "ProductModel", SharedPlus, Eventual, 1),
        ReplicaSeed::new("AnalyticsService", "ProductModel", SharedPlus, BoundedStaleness, 1)
            .with_staleness_bound(60_000),
    ];

    let order_processing = OperationModel::new(
        "gom1",
        "GOM1: Order Processing",
        vec![
            AccessEntry::new("OrderService", "OrderModel", AccessPattern::Both),
            AccessEntry::new("PaymentService", "OrderModel", AccessPattern::Read),
            AccessEntry::new("OrderService", "PaymentModel", AccessPattern::Read),
            AccessEntry::new("PaymentService", "PaymentModel", AccessPattern::Both),
            AccessEntry::new("OrderService", "InventoryModel", AccessPattern::Read),
            AccessEntry::new("InventoryService", "InventoryModel", AccessPattern::Both),
        ],
    );

    let product_search = OperationModel::new(
        "gom2",
        "GOM2: Product Search",
        vec![
            AccessEntry::new("OrderService", "ProductModel", AccessPattern::Read),
            AccessEntry::new("SearchService", "ProductModel", AccessPattern::Read),
            AccessEntry::new("AnalyticsService", "ProductModel", AccessPattern::Read),
        ],
    );

    let mut config = TopologyConfig::new(replicas);
    // No ProductService replica exists; the catalogue is owned by search.
    config
        .owners
        .insert("ProductModel".to_string(), "SearchService".to_string());
    config.operation_models = vec![order_processing, product_search];
    config
}
