//! Filter state owned by the pipeline, one per order class.
//!
//! The state is mutated only through [`FilterState::apply`] and the
//! realized-page write that follows each run.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Default number of groups requested when no realized page size is known.
pub const DEFAULT_VIEW_SIZE: usize = 10;

/// User-selectable optional facets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Facet {
    /// Picklists selected in the in-progress view.
    Picklist,
    /// Shipment methods selected in the open and completed views.
    ShipmentMethod,
    /// Carrier parties selected in the completed view.
    CarrierParty,
}

impl Facet {
    /// Index field the facet filters on.
    pub fn field(&self) -> &'static str {
        match self {
            Facet::Picklist => "picklistId",
            Facet::ShipmentMethod => "shipmentMethodTypeId",
            Facet::CarrierParty => "manifestContentId",
        }
    }
}

/// Logical filter state for a single order class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Free-text query entered by the user.
    #[serde(default)]
    pub query_string: String,

    /// Number of groups to request. After every run this holds the number
    /// of orders the run actually produced.
    pub view_size: usize,

    /// Selected values per optional facet. Empty sets are allowed and mean
    /// "no selection".
    #[serde(default)]
    pub selected_facets: BTreeMap<Facet, BTreeSet<String>>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            query_string: String::new(),
            view_size: DEFAULT_VIEW_SIZE,
            selected_facets: BTreeMap::new(),
        }
    }
}

impl FilterState {
    /// Returns the selected values for a facet, if any were selected.
    pub fn selection(&self, facet: Facet) -> Option<&BTreeSet<String>> {
        self.selected_facets
            .get(&facet)
            .filter(|values| !values.is_empty())
    }

    /// Select values for a facet, replacing any previous selection.
    pub fn with_selection<I, S>(mut self, facet: Facet, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_facets
            .insert(facet, values.into_iter().map(Into::into).collect());
        self
    }

    /// Merge a partial update into this state.
    ///
    /// Facets present in the update replace the stored selection for that
    /// facet; facets absent from the update are left as they are.
    pub fn apply(&mut self, update: FilterUpdate) {
        if let Some(query_string) = update.query_string {
            self.query_string = query_string;
        }
        if let Some(view_size) = update.view_size {
            self.view_size = view_size;
        }
        for (facet, values) in update.selected_facets {
            self.selected_facets.insert(facet, values);
        }
    }
}

/// Partial filter state used by `update_filters`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_size: Option<usize>,
    #[serde(default)]
    pub selected_facets: BTreeMap<Facet, BTreeSet<String>>,
}

impl FilterUpdate {
    /// Update that only changes the selection of one facet.
    pub fn select<I, S>(facet: Facet, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selected_facets = BTreeMap::new();
        selected_facets.insert(facet, values.into_iter().map(Into::into).collect());
        Self {
            selected_facets,
            ..Default::default()
        }
    }

    /// Update that only changes the free-text query.
    pub fn query(query_string: impl Into<String>) -> Self {
        Self {
            query_string: Some(query_string.into()),
            ..Default::default()
        }
    }
}

/// Facility and product store the pipeline is scoped to.
///
/// Supplied by the caller of the pipeline rather than read from ambient
/// application state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentScope {
    pub facility_id: String,
    pub product_store_id: String,
}

impl FulfillmentScope {
    pub fn new(facility_id: impl Into<String>, product_store_id: impl Into<String>) -> Self {
        Self {
            facility_id: facility_id.into(),
            product_store_id: product_store_id.into(),
        }
    }
}
