//! Enrichment fan-out coordinator.
//!
//! Resolves the shipments of a page of in-progress orders, then fans out the
//! dependent lookups and folds their results into an [`EnrichmentBundle`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use fulfillment_orders_repository::FulfillmentLookups;
use fulfillment_orders_shared::{EnrichmentBundle, GroupedHit};
use tracing::{debug, info, instrument};

use crate::errors::EnrichmentError;

/// Coordinates the dependent lookups behind one enrichment.
pub struct EnrichmentCoordinator {
    lookups: Arc<dyn FulfillmentLookups>,
}

impl EnrichmentCoordinator {
    /// Create a new coordinator with the given lookup backend.
    pub fn new(lookups: Arc<dyn FulfillmentLookups>) -> Self {
        Self { lookups }
    }

    /// Build the enrichment bundle for a page of groups.
    ///
    /// Runs in three steps:
    ///
    /// 1. Shipments for the given picklist bins and orders
    /// 2. Packages, item shipment sequences and carriers, concurrently
    /// 3. Box types for the distinct carriers found in step 2
    ///
    /// An empty order list or an empty shipment set ends the fan-out early
    /// with empty maps. No carriers means no box-type lookup.
    ///
    /// # Returns
    ///
    /// * `Ok(EnrichmentBundle)` - Maps from every lookup
    /// * `Err(EnrichmentError)` - If any lookup failed
    #[instrument(skip_all, fields(groups = group_ids.len(), orders = order_ids.len()))]
    pub async fn enrich(
        &self,
        group_ids: &[String],
        order_ids: &[String],
    ) -> Result<EnrichmentBundle, EnrichmentError> {
        let mut bundle = EnrichmentBundle::default();
        if order_ids.is_empty() {
            debug!("No orders to enrich");
            return Ok(bundle);
        }

        let shipments = self
            .lookups
            .shipments_for_orders(group_ids, order_ids)
            .await
            .map_err(|e| EnrichmentError::lookup("shipment", e))?;

        let mut shipment_ids = BTreeSet::new();
        for (order_id, ids) in shipments {
            let ids: Vec<String> = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
            shipment_ids.extend(ids.iter().cloned());
            bundle.shipment_ids_by_order.insert(order_id, ids);
        }
        bundle.shipment_ids = shipment_ids.into_iter().collect();

        if bundle.shipment_ids.is_empty() {
            info!("No shipments found for orders, skipping dependent lookups");
            return Ok(bundle);
        }

        let shipment_ids = bundle.shipment_ids.as_slice();
        let (packages, items, carriers) = tokio::try_join!(
            async {
                self.lookups
                    .packages_for_shipments(shipment_ids)
                    .await
                    .map_err(|e| EnrichmentError::lookup("package", e))
            },
            async {
                self.lookups
                    .shipment_items_for_shipments(shipment_ids)
                    .await
                    .map_err(|e| EnrichmentError::lookup("shipment item", e))
            },
            async {
                self.lookups
                    .carriers_for_shipments(shipment_ids)
                    .await
                    .map_err(|e| EnrichmentError::lookup("carrier", e))
            },
        )?;

        bundle.packages_by_order = packages.into_iter().collect();

        for info in items.into_values().flatten() {
            bundle
                .item_shipment_seq
                .entry((info.order_id, info.order_item_seq_id))
                .or_insert(info.shipment_item_seq_id);
        }

        bundle.carrier_party_ids_by_shipment = carriers
            .into_iter()
            .map(|(shipment_id, carriers)| {
                let ids: BTreeSet<String> =
                    carriers.into_iter().map(|c| c.carrier_party_id).collect();
                (shipment_id, ids.into_iter().collect())
            })
            .collect();

        let carrier_party_ids = bundle.carrier_party_ids();
        if carrier_party_ids.is_empty() {
            debug!("No carriers found for shipments, skipping box type lookup");
            return Ok(bundle);
        }

        let box_types = self
            .lookups
            .box_types_for_carriers(&carrier_party_ids)
            .await
            .map_err(|e| EnrichmentError::lookup("box type", e))?;

        bundle.box_types_by_carrier_party = box_types
            .into_iter()
            .map(|(carrier_party_id, box_types)| {
                let mut ids: Vec<String> = Vec::with_capacity(box_types.len());
                for box_type in box_types {
                    if !ids.contains(&box_type.shipment_box_type_id) {
                        ids.push(box_type.shipment_box_type_id);
                    }
                }
                (carrier_party_id, ids)
            })
            .collect::<BTreeMap<_, _>>();

        info!(
            shipment_count = bundle.shipment_ids.len(),
            carrier_count = carrier_party_ids.len(),
            "Enrichment completed"
        );
        Ok(bundle)
    }
}

/// Picklist bins and primary order ids of a page of groups, in group order.
///
/// Groups without a primary order id contribute only their bin.
pub fn group_keys(groups: &[GroupedHit]) -> (Vec<String>, Vec<String>) {
    let group_ids = groups.iter().map(|g| g.group_value.clone()).collect();
    let order_ids = groups
        .iter()
        .filter_map(|g| g.primary_order_id().map(str::to_string))
        .collect();
    (group_ids, order_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fulfillment_orders_repository::LookupError;
    use fulfillment_orders_shared::{
        CarrierBoxType, OrderItemDoc, ShipmentCarrier, ShipmentItemInfo, ShipmentPackage,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Mock lookups recording every call in order.
    #[derive(Default)]
    struct MockLookups {
        shipments: HashMap<String, Vec<String>>,
        carriers: HashMap<String, Vec<ShipmentCarrier>>,
        fail_items: bool,
        /// Delay applied to each packages, items and carriers lookup.
        step_two_delay: Option<Duration>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        step_two_finished: AtomicUsize,
        finished_before_box_types: Mutex<Option<usize>>,
        calls: Mutex<Vec<(&'static str, Vec<String>)>>,
    }

    impl MockLookups {
        fn record(&self, name: &'static str, keys: &[String]) {
            self.calls.lock().unwrap().push((name, keys.to_vec()));
        }

        async fn step_two(&self, name: &'static str, keys: &[String]) {
            self.record(name, keys);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.step_two_delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.step_two_finished.fetch_add(1, Ordering::SeqCst);
        }

        fn call_names(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().iter().map(|(name, _)| *name).collect()
        }
    }

    #[async_trait]
    impl FulfillmentLookups for MockLookups {
        async fn shipments_for_orders(
            &self,
            _picklist_bin_ids: &[String],
            order_ids: &[String],
        ) -> Result<HashMap<String, Vec<String>>, LookupError> {
            self.record("shipments", order_ids);
            Ok(self.shipments.clone())
        }

        async fn packages_for_shipments(
            &self,
            shipment_ids: &[String],
        ) -> Result<HashMap<String, Vec<ShipmentPackage>>, LookupError> {
            self.step_two("packages", shipment_ids).await;
            Ok(HashMap::new())
        }

        async fn shipment_items_for_shipments(
            &self,
            shipment_ids: &[String],
        ) -> Result<HashMap<String, Vec<ShipmentItemInfo>>, LookupError> {
            self.step_two("items", shipment_ids).await;
            if self.fail_items {
                return Err(LookupError::transport("connection reset"));
            }
            let mut items = HashMap::new();
            items.insert(
                "10023".to_string(),
                vec![
                    ShipmentItemInfo {
                        order_id: "10023".to_string(),
                        order_item_seq_id: "00001".to_string(),
                        shipment_id: "SH1".to_string(),
                        shipment_item_seq_id: "0001".to_string(),
                    },
                    ShipmentItemInfo {
                        order_id: "10023".to_string(),
                        order_item_seq_id: "00001".to_string(),
                        shipment_id: "SH2".to_string(),
                        shipment_item_seq_id: "0009".to_string(),
                    },
                ],
            );
            Ok(items)
        }

        async fn carriers_for_shipments(
            &self,
            shipment_ids: &[String],
        ) -> Result<HashMap<String, Vec<ShipmentCarrier>>, LookupError> {
            self.step_two("carriers", shipment_ids).await;
            Ok(self.carriers.clone())
        }

        async fn box_types_for_carriers(
            &self,
            carrier_party_ids: &[String],
        ) -> Result<HashMap<String, Vec<CarrierBoxType>>, LookupError> {
            self.record("box_types", carrier_party_ids);
            *self.finished_before_box_types.lock().unwrap() =
                Some(self.step_two_finished.load(Ordering::SeqCst));
            Ok(carrier_party_ids
                .iter()
                .map(|id| {
                    let box_type = |box_id: &str| CarrierBoxType {
                        carrier_party_id: id.clone(),
                        shipment_box_type_id: box_id.to_string(),
                    };
                    (id.clone(), vec![box_type("SMALL"), box_type("SMALL"), box_type("LARGE")])
                })
                .collect())
        }
    }

    fn carrier(shipment_id: &str, carrier_party_id: &str) -> ShipmentCarrier {
        ShipmentCarrier {
            shipment_id: shipment_id.to_string(),
            carrier_party_id: carrier_party_id.to_string(),
            shipment_method_type_id: None,
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_input_issues_no_lookups() {
        let lookups = Arc::new(MockLookups::default());
        let coordinator = EnrichmentCoordinator::new(lookups.clone());

        let bundle = coordinator.enrich(&[], &[]).await.unwrap();

        assert!(bundle.is_empty());
        assert!(lookups.call_names().is_empty());
    }

    #[tokio::test]
    async fn test_empty_shipments_skip_dependent_lookups() {
        let lookups = Arc::new(MockLookups::default());
        let coordinator = EnrichmentCoordinator::new(lookups.clone());

        let bundle = coordinator
            .enrich(&strings(&["BIN_1"]), &strings(&["10023"]))
            .await
            .unwrap();

        assert!(bundle.is_empty());
        assert_eq!(lookups.call_names(), vec!["shipments"]);
    }

    #[tokio::test]
    async fn test_full_fan_out() {
        let mut lookups = MockLookups::default();
        lookups
            .shipments
            .insert("10023".to_string(), strings(&["SH2", "SH1", "SH2"]));
        lookups
            .carriers
            .insert("SH1".to_string(), vec![carrier("SH1", "UPS"), carrier("SH1", "FEDEX")]);
        lookups
            .carriers
            .insert("SH2".to_string(), vec![carrier("SH2", "UPS")]);
        let lookups = Arc::new(lookups);
        let coordinator = EnrichmentCoordinator::new(lookups.clone());

        let bundle = coordinator
            .enrich(&strings(&["BIN_1"]), &strings(&["10023"]))
            .await
            .unwrap();

        assert_eq!(bundle.shipment_ids, strings(&["SH1", "SH2"]));
        assert_eq!(bundle.shipments_for_order("10023"), strings(&["SH1", "SH2"]).as_slice());
        // first row for an order item wins
        assert_eq!(bundle.shipment_item_seq("10023", "00001"), Some("0001"));
        assert_eq!(bundle.carrier_party_ids_by_shipment["SH1"], strings(&["FEDEX", "UPS"]));
        assert_eq!(bundle.box_types_by_carrier_party["UPS"], strings(&["SMALL", "LARGE"]));

        let calls = lookups.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 5);
        assert_eq!(calls.last().unwrap(), &("box_types", strings(&["FEDEX", "UPS"])));
        let step_two: BTreeSet<_> = calls[1..4].iter().map(|(name, _)| *name).collect();
        assert_eq!(step_two, ["carriers", "items", "packages"].into_iter().collect());
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_two_lookups_run_concurrently() {
        let mut lookups = MockLookups {
            step_two_delay: Some(Duration::from_millis(200)),
            ..Default::default()
        };
        lookups.shipments.insert("10023".to_string(), strings(&["SH1"]));
        lookups
            .carriers
            .insert("SH1".to_string(), vec![carrier("SH1", "UPS")]);
        let lookups = Arc::new(lookups);
        let coordinator = EnrichmentCoordinator::new(lookups.clone());

        let started = tokio::time::Instant::now();
        coordinator
            .enrich(&strings(&["BIN_1"]), &strings(&["10023"]))
            .await
            .unwrap();

        assert_eq!(lookups.max_in_flight.load(Ordering::SeqCst), 3);
        // joined before the box-type lookup starts
        assert_eq!(*lookups.finished_before_box_types.lock().unwrap(), Some(3));
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_no_carriers_skips_box_types() {
        let mut lookups = MockLookups::default();
        lookups.shipments.insert("10023".to_string(), strings(&["SH1"]));
        let lookups = Arc::new(lookups);
        let coordinator = EnrichmentCoordinator::new(lookups.clone());

        let bundle = coordinator
            .enrich(&strings(&["BIN_1"]), &strings(&["10023"]))
            .await
            .unwrap();

        assert!(bundle.box_types_by_carrier_party.is_empty());
        assert!(!lookups.call_names().contains(&"box_types"));
    }

    #[tokio::test]
    async fn test_failed_lookup_fails_enrichment() {
        let mut lookups = MockLookups {
            fail_items: true,
            ..Default::default()
        };
        lookups.shipments.insert("10023".to_string(), strings(&["SH1"]));
        let lookups = Arc::new(lookups);
        let coordinator = EnrichmentCoordinator::new(lookups.clone());

        let err = coordinator
            .enrich(&strings(&["BIN_1"]), &strings(&["10023"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EnrichmentError::Lookup { lookup: "shipment item", .. }
        ));
        assert!(!lookups.call_names().contains(&"box_types"));
    }

    #[test]
    fn test_group_keys() {
        let doc = OrderItemDoc {
            order_id: Some("10023".to_string()),
            ..Default::default()
        };
        let groups = vec![
            GroupedHit::new("BIN_1", vec![doc]),
            GroupedHit::new("BIN_2", Vec::new()),
        ];

        let (group_ids, order_ids) = group_keys(&groups);
        assert_eq!(group_ids, strings(&["BIN_1", "BIN_2"]));
        assert_eq!(order_ids, strings(&["10023"]));
    }
}
