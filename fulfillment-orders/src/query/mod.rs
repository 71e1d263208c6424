//! Query builder.
//!
//! Turns a class's filter state and the fulfillment scope into the
//! class-specific structured query. Pure: no I/O, no errors.

use fulfillment_orders_shared::{
    Facet, FilterClause, FilterState, FulfillmentScope, OrderClass, SortClause, StructuredQuery,
    DEFAULT_VIEW_SIZE,
};
use serde::{Deserialize, Serialize};

/// Fields free text is matched against for item-level classes.
pub const ITEM_QUERY_FIELDS: [&str; 9] = [
    "productId",
    "productName",
    "virtualProductName",
    "orderId",
    "search_orderIdentifications",
    "productSku",
    "customerId",
    "customerName",
    "goodIdentifications",
];

/// Fields free text is matched against for open orders.
pub const OPEN_QUERY_FIELDS: [&str; 1] = ["orderId"];

/// Key picklist bins are grouped by.
pub const PICKLIST_BIN_FIELD: &str = "picklistBinId";

const ORDER_DATE_FIELD: &str = "orderDate";
const PICKLIST_ITEM_STATUS_FIELD: &str = "picklistItemStatusId";
const SHIPMENT_METHOD_FIELD: &str = "shipmentMethodTypeId";
const FULFILLMENT_STATUS_FIELD: &str = "fulfillmentStatus";
const STORE_PICKUP: &str = "STOREPICKUP";

/// Picked items, or items completed and shipped today.
const COMPLETED_ITEM_STATUS: &str =
    "PICKITEM_PICKED OR (PICKITEM_COMPLETED AND itemShippedDate:[now/d TO now/d+1d])";

/// Per-run overrides merged over the filter state snapshot.
///
/// Overrides shape only the query of the run they are passed to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueryOverrides {
    pub view_index: Option<usize>,
    pub view_size: Option<usize>,
    pub query_string: Option<String>,
}

impl QueryOverrides {
    /// Overrides requesting a specific page.
    pub fn page(view_index: usize, view_size: usize) -> Self {
        Self {
            view_index: Some(view_index),
            view_size: Some(view_size),
            query_string: None,
        }
    }
}

/// Optional facets a class honors, in the order their clauses are emitted.
pub fn optional_facets(class: OrderClass) -> &'static [Facet] {
    match class {
        OrderClass::InProgress => &[Facet::Picklist],
        OrderClass::Open => &[Facet::ShipmentMethod],
        OrderClass::Completed => &[Facet::CarrierParty, Facet::ShipmentMethod],
    }
}

/// Build the structured query for one pipeline run.
///
/// # Arguments
///
/// * `class` - Order class the query is for
/// * `filter` - Snapshot of the class's filter state
/// * `scope` - Facility and product store every query is restricted to
/// * `overrides` - Per-run paging and text overrides
///
/// A page size of zero (left behind by an empty run) falls back to
/// [`DEFAULT_VIEW_SIZE`].
pub fn build_query(
    class: OrderClass,
    filter: &FilterState,
    scope: &FulfillmentScope,
    overrides: &QueryOverrides,
) -> StructuredQuery {
    let text = overrides
        .query_string
        .clone()
        .unwrap_or_else(|| filter.query_string.clone());
    let page_size = match overrides.view_size.unwrap_or(filter.view_size) {
        0 => DEFAULT_VIEW_SIZE,
        size => size,
    };

    let mut query = StructuredQuery {
        text,
        query_fields: Vec::new(),
        page_size,
        page_index: overrides.view_index.unwrap_or(0),
        sort: None,
        group_by: None,
        required_filters: Vec::new(),
        excluded_filters: vec![FilterClause::term(SHIPMENT_METHOD_FIELD, STORE_PICKUP)],
    };

    match class {
        OrderClass::InProgress => {
            query.query_fields = to_fields(&ITEM_QUERY_FIELDS);
            query.sort = Some(SortClause::asc(ORDER_DATE_FIELD));
            query.group_by = Some(PICKLIST_BIN_FIELD.to_string());
            query
                .required_filters
                .push(FilterClause::term(PICKLIST_ITEM_STATUS_FIELD, "PICKITEM_PENDING"));
            query
                .excluded_filters
                .push(FilterClause::term(FULFILLMENT_STATUS_FIELD, "Rejected"));
        }
        OrderClass::Open => {
            query.query_fields = to_fields(&OPEN_QUERY_FIELDS);
            query.required_filters.extend([
                FilterClause::term("quantityNotAvailable", "0"),
                FilterClause::term("isPicked", "N"),
                FilterClause::term("orderStatusId", "ORDER_APPROVED"),
                FilterClause::term("orderTypeId", "SALES_ORDER"),
            ]);
            query
                .excluded_filters
                .push(FilterClause::term(FULFILLMENT_STATUS_FIELD, "Cancelled"));
        }
        OrderClass::Completed => {
            query.query_fields = to_fields(&ITEM_QUERY_FIELDS);
            query.sort = Some(SortClause::asc(ORDER_DATE_FIELD));
            query.group_by = Some(PICKLIST_BIN_FIELD.to_string());
            query.required_filters.push(FilterClause::expression(
                PICKLIST_ITEM_STATUS_FIELD,
                COMPLETED_ITEM_STATUS,
            ));
        }
    }

    query.required_filters.extend([
        FilterClause::term("facilityId", scope.facility_id.as_str()),
        FilterClause::term("productStoreId", scope.product_store_id.as_str()),
    ]);

    for facet in optional_facets(class) {
        if let Some(values) = filter.selection(*facet) {
            query
                .required_filters
                .push(FilterClause::any_of(facet.field(), values.iter().cloned()));
        }
    }

    query
}

fn to_fields(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fulfillment_orders_shared::{CombineOp, FilterValue};

    fn scope() -> FulfillmentScope {
        FulfillmentScope::new("WH_1", "STORE_1")
    }

    #[test]
    fn test_in_progress_shape() {
        let query = build_query(
            OrderClass::InProgress,
            &FilterState::default(),
            &scope(),
            &QueryOverrides::default(),
        );

        assert_eq!(query.group_by.as_deref(), Some("picklistBinId"));
        assert_eq!(query.sort, Some(SortClause::asc("orderDate")));
        assert_eq!(query.query_fields.len(), 9);
        assert_eq!(
            query.required("picklistItemStatusId").unwrap().value,
            FilterValue::Term("PICKITEM_PENDING".to_string())
        );
        assert_eq!(
            query.required("facilityId").unwrap().value,
            FilterValue::Term("WH_1".to_string())
        );
        assert!(query.required("productStoreId").is_some());
        assert!(query.excluded("fulfillmentStatus").is_some());
        assert!(query.excluded("shipmentMethodTypeId").is_some());
        assert!(query.required("picklistId").is_none());
    }

    #[test]
    fn test_open_shape() {
        let query = build_query(
            OrderClass::Open,
            &FilterState::default(),
            &scope(),
            &QueryOverrides::default(),
        );

        assert!(query.group_by.is_none());
        assert!(query.sort.is_none());
        assert_eq!(query.query_fields, vec!["orderId"]);
        for field in [
            "quantityNotAvailable",
            "isPicked",
            "orderStatusId",
            "orderTypeId",
            "facilityId",
            "productStoreId",
        ] {
            assert!(query.required(field).is_some(), "missing {}", field);
        }
        assert_eq!(
            query.excluded("fulfillmentStatus").unwrap().value,
            FilterValue::Term("Cancelled".to_string())
        );
        assert_eq!(query.required_filters.len(), 6);
    }

    #[test]
    fn test_completed_shape() {
        let query = build_query(
            OrderClass::Completed,
            &FilterState::default(),
            &scope(),
            &QueryOverrides::default(),
        );

        assert_eq!(query.group_by.as_deref(), Some("picklistBinId"));
        assert!(matches!(
            query.required("picklistItemStatusId").unwrap().value,
            FilterValue::Expression(_)
        ));
        assert_eq!(query.excluded_filters.len(), 1);
    }

    #[test]
    fn test_empty_selections_emit_no_clause() {
        let filter = FilterState::default()
            .with_selection(Facet::CarrierParty, Vec::<String>::new())
            .with_selection(Facet::ShipmentMethod, Vec::<String>::new());

        for class in OrderClass::ALL {
            let query = build_query(class, &filter, &scope(), &QueryOverrides::default());
            assert!(query.required("manifestContentId").is_none());
            assert!(query.required("picklistId").is_none());
            assert!(query
                .required_filters
                .iter()
                .all(|clause| clause.value != FilterValue::Terms(Vec::new())));
        }
    }

    #[test]
    fn test_selection_yields_single_or_clause() {
        let filter = FilterState::default()
            .with_selection(Facet::ShipmentMethod, ["NEXT_DAY", "SECOND_DAY", "STANDARD"]);
        let query = build_query(OrderClass::Open, &filter, &scope(), &QueryOverrides::default());

        let clauses: Vec<_> = query
            .required_filters
            .iter()
            .filter(|clause| clause.field == "shipmentMethodTypeId")
            .collect();
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].combine_op, CombineOp::Or);
        assert_eq!(clauses[0].value_count(), 3);
    }

    #[test]
    fn test_facets_not_honored_by_class_are_ignored() {
        let filter = FilterState::default().with_selection(Facet::Picklist, ["PL_1"]);
        let query = build_query(OrderClass::Completed, &filter, &scope(), &QueryOverrides::default());
        assert!(query.required("picklistId").is_none());

        let query = build_query(OrderClass::InProgress, &filter, &scope(), &QueryOverrides::default());
        assert_eq!(query.required("picklistId").unwrap().value_count(), 1);
    }

    #[test]
    fn test_completed_carrier_and_method_selections() {
        let filter = FilterState::default()
            .with_selection(Facet::CarrierParty, ["FEDEX", "UPS"])
            .with_selection(Facet::ShipmentMethod, ["NEXT_DAY"]);
        let query = build_query(OrderClass::Completed, &filter, &scope(), &QueryOverrides::default());

        assert_eq!(query.required("manifestContentId").unwrap().value_count(), 2);
        assert_eq!(query.required("shipmentMethodTypeId").unwrap().value_count(), 1);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let filter = FilterState {
            query_string: "jane".to_string(),
            view_size: 5,
            ..Default::default()
        };
        let overrides = QueryOverrides {
            query_string: Some("10023".to_string()),
            ..QueryOverrides::page(3, 20)
        };
        let query = build_query(OrderClass::InProgress, &filter, &scope(), &overrides);

        assert_eq!(query.text, "10023");
        assert_eq!(query.page_size, 20);
        assert_eq!(query.page_index, 3);

        let query = build_query(OrderClass::InProgress, &filter, &scope(), &QueryOverrides::default());
        assert_eq!(query.text, "jane");
        assert_eq!(query.page_size, 5);
        assert_eq!(query.page_index, 0);
    }

    #[test]
    fn test_zero_view_size_falls_back_to_default() {
        let filter = FilterState {
            view_size: 0,
            ..Default::default()
        };
        let query = build_query(OrderClass::Open, &filter, &scope(), &QueryOverrides::default());
        assert_eq!(query.page_size, DEFAULT_VIEW_SIZE);
    }
}
