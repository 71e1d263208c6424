//! Projected order views handed to presentation layers.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::enrichment::ShipmentPackage;
use crate::types::grouped_hit::OrderItemDoc;

/// An item of an in-progress order with its derived shipment fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InProgressItem {
    #[serde(flatten)]
    pub doc: OrderItemDoc,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_item_seq_id: Option<String>,
    /// Name of the package the item's shipment is packed in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_box: Option<String>,
}

/// Nested view of a picklist bin in progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InProgressOrder {
    /// The picklist bin id the group was keyed by.
    pub group_value: String,
    pub doc_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub items: Vec<InProgressItem>,
    /// `None` when the package lookup returned nothing for the order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_packages: Option<Vec<ShipmentPackage>>,
    /// Carrier parties across the order's shipments, sorted.
    pub carrier_party_ids: Vec<String>,
    pub shipment_box_type_by_carrier_party: BTreeMap<String, Vec<String>>,
}

impl InProgressOrder {
    /// Distinct product ids of the order's items.
    pub fn product_ids(&self) -> BTreeSet<String> {
        self.items
            .iter()
            .filter_map(|item| item.doc.product_id.clone())
            .collect()
    }
}

/// Grouped pass-through view of an open order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrder {
    pub group_value: String,
    pub doc_count: u64,
    pub items: Vec<OrderItemDoc>,
}

/// Flat, one-row view of a completed order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletedOrder {
    pub group_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_method_type_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_method_type_desc: Option<String>,
    pub items: Vec<OrderItemDoc>,
}

/// A projected order of any class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "orderClass", rename_all = "kebab-case")]
pub enum OrderView {
    InProgress(InProgressOrder),
    Open(OpenOrder),
    Completed(CompletedOrder),
}

impl OrderView {
    /// Key the order was grouped by.
    pub fn group_value(&self) -> &str {
        match self {
            OrderView::InProgress(order) => &order.group_value,
            OrderView::Open(order) => &order.group_value,
            OrderView::Completed(order) => &order.group_value,
        }
    }

    /// Distinct product ids referenced by the order.
    pub fn product_ids(&self) -> BTreeSet<String> {
        match self {
            OrderView::InProgress(order) => order.product_ids(),
            OrderView::Open(OpenOrder { items, .. })
            | OrderView::Completed(CompletedOrder { items, .. }) => items
                .iter()
                .filter_map(|item| item.product_id.clone())
                .collect(),
        }
    }

    pub fn as_in_progress(&self) -> Option<&InProgressOrder> {
        match self {
            OrderView::InProgress(order) => Some(order),
            _ => None,
        }
    }

    pub fn as_completed(&self) -> Option<&CompletedOrder> {
        match self {
            OrderView::Completed(order) => Some(order),
            _ => None,
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrderPage {
    pub orders: Vec<OrderView>,
    /// Number of groups the backend reported, which may exceed `orders.len()`.
    pub total: u64,
}

impl OrderPage {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }
}
