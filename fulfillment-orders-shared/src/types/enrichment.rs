//! Records returned by the dependent lookups and the per-run enrichment bundle.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A package packed (or to be packed) for a shipment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentPackage {
    pub shipment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_package_seq_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_box_type_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier_party_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_code: Option<String>,
}

/// Link between an order item and the shipment item that carries it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentItemInfo {
    pub order_id: String,
    pub order_item_seq_id: String,
    pub shipment_id: String,
    pub shipment_item_seq_id: String,
}

/// Carrier assigned to a shipment route segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentCarrier {
    pub shipment_id: String,
    pub carrier_party_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_method_type_id: Option<String>,
}

/// A box type a carrier accepts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CarrierBoxType {
    pub carrier_party_id: String,
    pub shipment_box_type_id: String,
}

/// Secondary data gathered for one in-progress run.
///
/// Built fresh for every run and dropped after projection. All maps are
/// ordered so that projection never depends on hash iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentBundle {
    /// Distinct shipment ids, sorted.
    pub shipment_ids: Vec<String>,

    /// Shipments per primary order id.
    pub shipment_ids_by_order: BTreeMap<String, Vec<String>>,

    /// Packages per primary order id, in lookup order.
    pub packages_by_order: BTreeMap<String, Vec<ShipmentPackage>>,

    /// `(order_id, order_item_seq_id)` to shipment item sequence id.
    pub item_shipment_seq: BTreeMap<(String, String), String>,

    /// Distinct carrier parties per shipment, in lookup order.
    pub carrier_party_ids_by_shipment: BTreeMap<String, Vec<String>>,

    /// Box types per carrier party, in lookup order.
    pub box_types_by_carrier_party: BTreeMap<String, Vec<String>>,
}

impl EnrichmentBundle {
    /// Returns true if no lookup contributed anything.
    pub fn is_empty(&self) -> bool {
        self.shipment_ids.is_empty()
            && self.shipment_ids_by_order.is_empty()
            && self.packages_by_order.is_empty()
            && self.item_shipment_seq.is_empty()
            && self.carrier_party_ids_by_shipment.is_empty()
            && self.box_types_by_carrier_party.is_empty()
    }

    /// Shipments resolved for an order, empty if the order had none.
    pub fn shipments_for_order(&self, order_id: &str) -> &[String] {
        self.shipment_ids_by_order
            .get(order_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Packages for an order, `None` if the lookup returned nothing for it.
    pub fn packages_for_order(&self, order_id: &str) -> Option<&[ShipmentPackage]> {
        self.packages_by_order.get(order_id).map(Vec::as_slice)
    }

    /// Shipment item sequence id for an order item.
    pub fn shipment_item_seq(&self, order_id: &str, order_item_seq_id: &str) -> Option<&str> {
        self.item_shipment_seq
            .get(&(order_id.to_string(), order_item_seq_id.to_string()))
            .map(String::as_str)
    }

    /// All distinct carrier parties across every shipment, sorted.
    pub fn carrier_party_ids(&self) -> Vec<String> {
        self.carrier_party_ids_by_shipment
            .values()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bundle_is_empty() {
        let bundle = EnrichmentBundle::default();
        assert!(bundle.is_empty());
        assert!(bundle.shipments_for_order("10023").is_empty());
        assert!(bundle.packages_for_order("10023").is_none());
        assert!(bundle.shipment_item_seq("10023", "00001").is_none());
    }

    #[test]
    fn test_carrier_party_ids_are_distinct_and_sorted() {
        let mut bundle = EnrichmentBundle::default();
        bundle
            .carrier_party_ids_by_shipment
            .insert("SH2".to_string(), vec!["UPS".to_string(), "FEDEX".to_string()]);
        bundle
            .carrier_party_ids_by_shipment
            .insert("SH1".to_string(), vec!["UPS".to_string()]);

        assert_eq!(bundle.carrier_party_ids(), vec!["FEDEX", "UPS"]);
        assert!(!bundle.is_empty());
    }

    #[test]
    fn test_shipment_item_seq_lookup() {
        let mut bundle = EnrichmentBundle::default();
        bundle
            .item_shipment_seq
            .insert(("10023".to_string(), "00002".to_string()), "00001".to_string());
        assert_eq!(bundle.shipment_item_seq("10023", "00002"), Some("00001"));
        assert_eq!(bundle.shipment_item_seq("10023", "00001"), None);
    }
}
