//! # Fulfillment Orders Shared
//!
//! This crate defines the data structures shared across the fulfillment order
//! aggregation pipeline: per-class filter state, the backend-agnostic structured
//! query, typed grouped search hits, enrichment records and the projected order
//! views handed to presentation layers.

pub mod types;

pub use types::enrichment::{
    CarrierBoxType, EnrichmentBundle, ShipmentCarrier, ShipmentItemInfo, ShipmentPackage,
};
pub use types::filter_state::{
    Facet, FilterState, FilterUpdate, FulfillmentScope, DEFAULT_VIEW_SIZE,
};
pub use types::grouped_hit::{GroupedHit, GroupedSearchResponse, OrderItemDoc};
pub use types::order_class::OrderClass;
pub use types::order_view::{
    CompletedOrder, InProgressItem, InProgressOrder, OpenOrder, OrderPage, OrderView,
};
pub use types::structured_query::{
    CombineOp, FilterClause, FilterValue, SortClause, SortOrder, StructuredQuery,
};
