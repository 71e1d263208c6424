//! Parsing of collapsed OpenSearch responses into grouped hits.

use std::collections::HashMap;

use fulfillment_orders_shared::{GroupedHit, GroupedSearchResponse, OrderItemDoc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::errors::SearchGatewayError;
use crate::opensearch::request::{GROUP_COUNT_AGG, INNER_HITS_NAME};

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    timed_out: bool,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    hits: HitsEnvelope,
    #[serde(default)]
    aggregations: HashMap<String, CardinalityValue>,
}

#[derive(Debug, Default, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    total: Option<TotalHits>,
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct TotalHits {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct CardinalityValue {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    #[serde(rename = "_source", default)]
    source: Option<Value>,
    #[serde(default)]
    fields: HashMap<String, Vec<Value>>,
    #[serde(default)]
    inner_hits: HashMap<String, InnerHits>,
}

#[derive(Debug, Deserialize)]
struct InnerHits {
    hits: HitsEnvelope,
}

/// Parse a successful search response body.
///
/// # Arguments
///
/// * `status_code` - HTTP status of the response
/// * `body` - Decoded JSON body
/// * `group_field` - Field the query collapsed on
///
/// # Returns
///
/// * `Ok(GroupedSearchResponse)` - Groups in backend order
/// * `Err(SearchGatewayError::BackendReported)` - If the body carries an error or timed out
/// * `Err(SearchGatewayError::ParseError)` - If the body does not have the expected shape
pub fn parse_grouped_response(
    status_code: u16,
    body: Value,
    group_field: &str,
) -> Result<GroupedSearchResponse, SearchGatewayError> {
    let body: SearchBody =
        serde_json::from_value(body).map_err(|e| SearchGatewayError::parse(e.to_string()))?;

    if let Some(error) = body.error {
        return Err(SearchGatewayError::backend(status_code, error.to_string()));
    }
    if body.timed_out {
        return Err(SearchGatewayError::backend(status_code, "search timed out"));
    }

    let matches = body.hits.total.map(|t| t.value).unwrap_or_default();
    let group_count = body
        .aggregations
        .get(GROUP_COUNT_AGG)
        .map(|agg| agg.value)
        .unwrap_or_default();

    let groups = body
        .hits
        .hits
        .into_iter()
        .map(|hit| into_group(hit, group_field))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GroupedSearchResponse::new(
        status_code,
        matches,
        group_count,
        groups,
    ))
}

fn into_group(mut hit: RawHit, group_field: &str) -> Result<GroupedHit, SearchGatewayError> {
    let group_value = hit
        .fields
        .get(group_field)
        .and_then(|values| values.first())
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .ok_or_else(|| {
            SearchGatewayError::parse(format!("collapsed hit is missing field '{}'", group_field))
        })?;

    match hit.inner_hits.remove(INNER_HITS_NAME) {
        Some(inner) => {
            let docs: Vec<OrderItemDoc> = inner
                .hits
                .hits
                .into_iter()
                .filter_map(decode_source)
                .collect();
            let doc_count = inner
                .hits
                .total
                .map(|t| t.value)
                .unwrap_or(docs.len() as u64);
            Ok(GroupedHit {
                group_value,
                doc_count,
                docs,
            })
        }
        None => Ok(GroupedHit::new(
            group_value,
            decode_source(hit).into_iter().collect(),
        )),
    }
}

/// Decode one hit's `_source`. A malformed document is logged and skipped so
/// the rest of the page survives.
fn decode_source(hit: RawHit) -> Option<OrderItemDoc> {
    let source = hit.source?;
    match serde_json::from_value(source) {
        Ok(doc) => Some(doc),
        Err(e) => {
            warn!(doc_id = ?hit.id, error = %e, "Skipping malformed order item document");
            None
        }
    }
}
