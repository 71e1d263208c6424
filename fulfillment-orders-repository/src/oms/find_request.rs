//! `performFind` request bodies and response error detection.

use serde::Serialize;
use serde_json::{Map, Value};

/// Body of an OMS `performFind` call.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FindRequest {
    pub entity_name: String,
    pub input_fields: Map<String, Value>,
    pub field_list: Vec<String>,
    pub view_size: usize,
    /// `"Y"` to ask for distinct rows.
    pub distinct: String,
}

impl FindRequest {
    /// Start a request for an entity.
    pub fn entity(entity_name: impl Into<String>, view_size: usize) -> Self {
        Self {
            entity_name: entity_name.into(),
            input_fields: Map::new(),
            field_list: Vec::new(),
            view_size,
            distinct: "Y".to_string(),
        }
    }

    /// Restrict `field` to any of `values`.
    pub fn field_in(mut self, field: &str, values: &[String]) -> Self {
        self.input_fields
            .insert(field.to_string(), Value::from(values.to_vec()));
        self.input_fields
            .insert(format!("{}_op", field), Value::from("in"));
        self
    }

    /// Require `field` to differ from `value`.
    pub fn field_not_equal(mut self, field: &str, value: &str) -> Self {
        self.input_fields
            .insert(field.to_string(), Value::from(value));
        self.input_fields
            .insert(format!("{}_op", field), Value::from("notEqual"));
        self
    }

    /// Columns to return.
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.field_list = fields.iter().map(|f| f.to_string()).collect();
        self
    }
}

/// Returns true if an OMS response body reports an error.
///
/// The OMS answers with HTTP 200 and an `_ERROR_MESSAGE_` or a non-empty
/// `_ERROR_MESSAGE_LIST_` when a service call fails.
pub fn has_error(body: &Value) -> bool {
    let message = body
        .get("_ERROR_MESSAGE_")
        .is_some_and(|m| !m.is_null() && m.as_str() != Some(""));
    let message_list = body
        .get("_ERROR_MESSAGE_LIST_")
        .and_then(Value::as_array)
        .is_some_and(|list| !list.is_empty());
    message || message_list
}

/// Human-readable error text from an OMS response body.
pub(crate) fn error_message(body: &Value) -> String {
    if let Some(message) = body.get("_ERROR_MESSAGE_").and_then(Value::as_str) {
        return message.to_string();
    }
    body.get("_ERROR_MESSAGE_LIST_")
        .map(Value::to_string)
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_in_adds_operator() {
        let request = FindRequest::entity("OrderShipment", 100)
            .field_in("shipmentId", &["SH1".to_string(), "SH2".to_string()])
            .fields(&["orderId", "shipmentId"]);

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["entityName"], "OrderShipment");
        assert_eq!(body["inputFields"]["shipmentId"], json!(["SH1", "SH2"]));
        assert_eq!(body["inputFields"]["shipmentId_op"], "in");
        assert_eq!(body["fieldList"], json!(["orderId", "shipmentId"]));
        assert_eq!(body["viewSize"], 100);
        assert_eq!(body["distinct"], "Y");
    }

    #[test]
    fn test_has_error() {
        assert!(has_error(&json!({ "_ERROR_MESSAGE_": "Entity not found" })));
        assert!(has_error(&json!({ "_ERROR_MESSAGE_LIST_": ["bad field"] })));
        assert!(!has_error(&json!({ "_ERROR_MESSAGE_LIST_": [] })));
        assert!(!has_error(&json!({ "docs": [], "count": 0 })));
    }

    #[test]
    fn test_error_message_prefers_single_message() {
        let body = json!({ "_ERROR_MESSAGE_": "boom", "_ERROR_MESSAGE_LIST_": ["other"] });
        assert_eq!(error_message(&body), "boom");
    }
}
