//! Batched fulfillment lookup trait definition.

use std::collections::HashMap;

use async_trait::async_trait;
use fulfillment_orders_shared::{
    CarrierBoxType, ShipmentCarrier, ShipmentItemInfo, ShipmentPackage,
};

use crate::errors::LookupError;

/// Batched lookups against the order management system.
///
/// Every method takes a list of keys and returns a map. Keys with no data are
/// simply absent from the map; a missing key is never an error.
#[async_trait]
pub trait FulfillmentLookups: Send + Sync {
    /// Shipment ids per primary order id, restricted to the given picklist bins.
    async fn shipments_for_orders(
        &self,
        picklist_bin_ids: &[String],
        order_ids: &[String],
    ) -> Result<HashMap<String, Vec<String>>, LookupError>;

    /// Packages of the given shipments, keyed by primary order id.
    async fn packages_for_shipments(
        &self,
        shipment_ids: &[String],
    ) -> Result<HashMap<String, Vec<ShipmentPackage>>, LookupError>;

    /// Order item to shipment item links for the given shipments, keyed by order id.
    async fn shipment_items_for_shipments(
        &self,
        shipment_ids: &[String],
    ) -> Result<HashMap<String, Vec<ShipmentItemInfo>>, LookupError>;

    /// Carrier assignments keyed by shipment id.
    async fn carriers_for_shipments(
        &self,
        shipment_ids: &[String],
    ) -> Result<HashMap<String, Vec<ShipmentCarrier>>, LookupError>;

    /// Box types keyed by carrier party id.
    async fn box_types_for_carriers(
        &self,
        carrier_party_ids: &[String],
    ) -> Result<HashMap<String, Vec<CarrierBoxType>>, LookupError>;
}
