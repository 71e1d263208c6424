//! Typed grouped search results.
//!
//! Raw hit documents are resolved into [`OrderItemDoc`] once, at the search
//! response boundary.

use chrono::{DateTime, Utc};
use serde::{de::IgnoredAny, Deserialize, Deserializer, Serialize};

/// One order item document as stored in the fulfillment index.
///
/// Every field is optional: the index does not guarantee a field is present
/// for every item, and absent fields stay `None` through projection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_item_seq_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub order_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_method_type_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_method_type_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picklist_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picklist_bin_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picklist_item_status_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_store_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    EpochMillis(i64),
    Other(IgnoredAny),
}

/// Accepts RFC 3339 text or epoch milliseconds; anything else reads as `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawTimestamp::Text(text)) => DateTime::parse_from_rfc3339(&text)
            .ok()
            .map(|date| date.with_timezone(&Utc)),
        Some(RawTimestamp::EpochMillis(millis)) => DateTime::from_timestamp_millis(millis),
        Some(RawTimestamp::Other(_)) | None => None,
    })
}

/// A group of order item documents sharing one group key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupedHit {
    /// Value of the group-by field (a picklist bin or an order id).
    pub group_value: String,

    /// Total documents in the group, which may exceed `docs.len()`.
    pub doc_count: u64,

    /// Documents in backend order.
    pub docs: Vec<OrderItemDoc>,
}

impl GroupedHit {
    pub fn new(group_value: impl Into<String>, docs: Vec<OrderItemDoc>) -> Self {
        Self {
            group_value: group_value.into(),
            doc_count: docs.len() as u64,
            docs,
        }
    }

    /// First document of the group, which carries the order-level fields.
    pub fn first_doc(&self) -> Option<&OrderItemDoc> {
        self.docs.first()
    }

    /// Order id of the first document.
    pub fn primary_order_id(&self) -> Option<&str> {
        self.first_doc().and_then(|doc| doc.order_id.as_deref())
    }
}

/// Result of a grouped search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupedSearchResponse {
    /// HTTP status reported by the backend.
    pub status_code: u16,

    /// Number of matching documents across all groups.
    pub matches: u64,

    /// Number of distinct groups matching the query.
    pub group_count: u64,

    /// The requested page of groups.
    pub groups: Vec<GroupedHit>,
}

impl GroupedSearchResponse {
    /// A successful response with no matches.
    pub fn empty() -> Self {
        Self {
            status_code: 200,
            matches: 0,
            group_count: 0,
            groups: Vec::new(),
        }
    }

    pub fn new(status_code: u16, matches: u64, group_count: u64, groups: Vec<GroupedHit>) -> Self {
        Self {
            status_code,
            matches,
            group_count,
            groups,
        }
    }

    /// Returns true if the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Returns true if any document matched.
    pub fn has_matches(&self) -> bool {
        self.matches > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_deserializes_camel_case_and_ignores_unknown_fields() {
        let json = r#"{
            "orderId": "10023",
            "orderItemSeqId": "00001",
            "orderDate": "2024-03-01T10:15:00Z",
            "customerName": "Jane Roe",
            "shipmentId": "SH1",
            "_version_": 17823
        }"#;
        let doc: OrderItemDoc = serde_json::from_str(json).unwrap();
        assert_eq!(doc.order_id.as_deref(), Some("10023"));
        assert_eq!(doc.order_item_seq_id.as_deref(), Some("00001"));
        assert_eq!(doc.customer_name.as_deref(), Some("Jane Roe"));
        assert!(doc.order_date.is_some());
        assert!(doc.product_id.is_none());
    }

    #[test]
    fn test_order_date_accepts_epoch_millis_and_drops_garbage() {
        let doc: OrderItemDoc =
            serde_json::from_str(r#"{ "orderId": "1", "orderDate": 1709288100000 }"#).unwrap();
        assert_eq!(
            doc.order_date.map(|date| date.to_rfc3339()),
            Some("2024-03-01T10:15:00+00:00".to_string())
        );

        let doc: OrderItemDoc =
            serde_json::from_str(r#"{ "orderId": "2", "orderDate": "yesterday" }"#).unwrap();
        assert_eq!(doc.order_id.as_deref(), Some("2"));
        assert!(doc.order_date.is_none());

        let doc: OrderItemDoc =
            serde_json::from_str(r#"{ "orderId": "3", "orderDate": null }"#).unwrap();
        assert!(doc.order_date.is_none());
    }

    #[test]
    fn test_primary_order_id_comes_from_first_doc() {
        let group = GroupedHit::new(
            "BIN_1",
            vec![
                OrderItemDoc {
                    order_id: Some("A".to_string()),
                    ..Default::default()
                },
                OrderItemDoc {
                    order_id: Some("B".to_string()),
                    ..Default::default()
                },
            ],
        );
        assert_eq!(group.primary_order_id(), Some("A"));
        assert_eq!(group.doc_count, 2);
    }

    #[test]
    fn test_empty_response() {
        let response = GroupedSearchResponse::empty();
        assert!(response.is_success());
        assert!(!response.has_matches());
        assert_eq!(response.group_count, 0);
    }

    #[test]
    fn test_has_matches_counts_documents_not_groups() {
        let response = GroupedSearchResponse::new(200, 4, 0, Vec::new());
        assert!(response.has_matches());
    }
}
