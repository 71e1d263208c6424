//! Translation of a `StructuredQuery` into an OpenSearch search body.

use fulfillment_orders_shared::{CombineOp, FilterClause, FilterValue, SortOrder, StructuredQuery};
use serde_json::{json, Value};

/// Name of the inner hits block that carries each group's documents.
pub(crate) const INNER_HITS_NAME: &str = "items";

/// Name of the aggregation that counts groups.
pub(crate) const GROUP_COUNT_AGG: &str = "group_count";

/// Build the search body for a grouped query.
///
/// # Arguments
///
/// * `query` - The structured query to translate
/// * `group_field` - Field to collapse on
/// * `group_limit` - Maximum documents returned per group
pub fn build_search_body(query: &StructuredQuery, group_field: &str, group_limit: usize) -> Value {
    let mut body = json!({
        "from": query.offset(),
        "size": query.page_size,
        "track_total_hits": true,
        "query": {
            "bool": {
                "must": [text_query(query)],
                "filter": query.required_filters.iter().map(clause_query).collect::<Vec<_>>(),
                "must_not": query.excluded_filters.iter().map(clause_query).collect::<Vec<_>>(),
            }
        },
        "collapse": {
            "field": group_field,
            "inner_hits": {
                "name": INNER_HITS_NAME,
                "size": group_limit,
            }
        },
        "aggs": {
            GROUP_COUNT_AGG: {
                "cardinality": { "field": group_field }
            }
        }
    });

    if let Some(sort) = &query.sort {
        let order = match sort.order {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        };
        body["sort"] = json!([{ sort.field.as_str(): { "order": order } }]);
    }

    body
}

fn text_query(query: &StructuredQuery) -> Value {
    let text = query.text.trim();
    if text.is_empty() {
        return json!({ "match_all": {} });
    }

    json!({
        "simple_query_string": {
            "query": text,
            "fields": query.query_fields,
            "default_operator": "and",
        }
    })
}

fn clause_query(clause: &FilterClause) -> Value {
    let field = clause.field.as_str();
    match &clause.value {
        FilterValue::Term(value) => json!({ "term": { field: value } }),
        FilterValue::Terms(values) => match clause.combine_op {
            CombineOp::Or => json!({ "terms": { field: values } }),
            CombineOp::And => json!({
                "bool": {
                    "filter": values
                        .iter()
                        .map(|value| json!({ "term": { field: value } }))
                        .collect::<Vec<_>>()
                }
            }),
        },
        FilterValue::Expression(expression) => json!({
            "query_string": {
                "query": expression,
                "default_field": field,
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fulfillment_orders_shared::SortClause;

    fn query() -> StructuredQuery {
        StructuredQuery {
            text: String::new(),
            query_fields: vec!["orderId".to_string(), "customerName".to_string()],
            page_size: 10,
            page_index: 2,
            sort: Some(SortClause::asc("orderDate")),
            group_by: Some("picklistBinId".to_string()),
            required_filters: vec![
                FilterClause::term("facilityId", "STORE_1"),
                FilterClause::any_of("picklistId", ["P1", "P2"]),
            ],
            excluded_filters: vec![FilterClause::term("shipmentMethodTypeId", "STOREPICKUP")],
        }
    }

    #[test]
    fn test_paging_and_collapse() {
        let body = build_search_body(&query(), "picklistBinId", 50);
        assert_eq!(body["from"], 20);
        assert_eq!(body["size"], 10);
        assert_eq!(body["collapse"]["field"], "picklistBinId");
        assert_eq!(body["collapse"]["inner_hits"]["size"], 50);
        assert_eq!(body["aggs"]["group_count"]["cardinality"]["field"], "picklistBinId");
        assert_eq!(body["sort"][0]["orderDate"]["order"], "asc");
    }

    #[test]
    fn test_empty_text_matches_all() {
        let body = build_search_body(&query(), "picklistBinId", 50);
        assert!(body["query"]["bool"]["must"][0]["match_all"].is_object());
    }

    #[test]
    fn test_text_is_matched_against_query_fields() {
        let mut q = query();
        q.text = "  Jane ".to_string();
        let body = build_search_body(&q, "picklistBinId", 50);
        let text = &body["query"]["bool"]["must"][0]["simple_query_string"];
        assert_eq!(text["query"], "Jane");
        assert_eq!(text["fields"][1], "customerName");
    }

    #[test]
    fn test_filters_are_split_into_filter_and_must_not() {
        let body = build_search_body(&query(), "picklistBinId", 50);
        let filters = body["query"]["bool"]["filter"].as_array().unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0]["term"]["facilityId"], "STORE_1");
        assert_eq!(filters[1]["terms"]["picklistId"][1], "P2");

        let must_not = body["query"]["bool"]["must_not"].as_array().unwrap();
        assert_eq!(must_not[0]["term"]["shipmentMethodTypeId"], "STOREPICKUP");
    }

    #[test]
    fn test_expression_clause_uses_default_field() {
        let mut q = query();
        q.required_filters = vec![FilterClause::expression(
            "picklistItemStatusId",
            "PICKITEM_PICKED OR PICKITEM_COMPLETED",
        )];
        q.sort = None;
        let body = build_search_body(&q, "picklistBinId", 50);
        let clause = &body["query"]["bool"]["filter"][0]["query_string"];
        assert_eq!(clause["default_field"], "picklistItemStatusId");
        assert!(body.get("sort").is_none());
    }
}
