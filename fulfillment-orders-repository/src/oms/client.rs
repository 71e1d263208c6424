//! OMS lookup client.

use std::collections::HashMap;
use std::hash::Hash;

use async_trait::async_trait;
use fulfillment_orders_shared::{
    CarrierBoxType, ShipmentCarrier, ShipmentItemInfo, ShipmentPackage,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client as ReqwestClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::OmsClientConfig;
use crate::errors::LookupError;
use crate::interfaces::FulfillmentLookups;
use crate::oms::find_request::{error_message, has_error, FindRequest};

const SHIPMENT_ENTITY: &str = "Shipment";
const PACKAGE_ENTITY: &str = "ShipmentPackageRouteSegDetail";
const ORDER_SHIPMENT_ENTITY: &str = "OrderShipment";
const ROUTE_SEGMENT_ENTITY: &str = "ShipmentRouteSegment";
const CARRIER_BOX_TYPE_ENTITY: &str = "CarrierShipmentBoxType";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShipmentRow {
    shipment_id: String,
    primary_order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteSegmentRow {
    shipment_id: String,
    carrier_party_id: Option<String>,
    shipment_method_type_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CarrierBoxTypeRow {
    party_id: String,
    shipment_box_type_id: String,
}

/// Lookup client for the OMS `performFind` endpoint.
///
/// # Example
///
/// ```ignore
/// use fulfillment_orders_repository::{FulfillmentLookups, OmsClientConfig, OmsLookupClient};
///
/// let client = OmsLookupClient::new(OmsClientConfig::new("https://oms.example.com/api/"))?;
/// let carriers = client.carriers_for_shipments(&["SH1".to_string()]).await?;
/// ```
pub struct OmsLookupClient {
    client: ReqwestClient,
    find_url: Url,
    view_size: usize,
}

impl OmsLookupClient {
    /// Create a new client.
    ///
    /// # Returns
    ///
    /// * `Ok(OmsLookupClient)` - A client ready to issue lookups
    /// * `Err(LookupError::ConfigurationError)` - If the base URL or token is invalid
    pub fn new(config: OmsClientConfig) -> Result<Self, LookupError> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let find_url = Url::parse(&base)
            .and_then(|url| url.join("performFind"))
            .map_err(|e| LookupError::configuration(format!("Invalid OMS base URL: {}", e)))?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.api_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| LookupError::configuration(format!("Invalid OMS token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = ReqwestClient::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| LookupError::configuration(e.to_string()))?;

        info!(url = %find_url, view_size = config.view_size, "Created OMS lookup client");

        Ok(Self {
            client,
            find_url,
            view_size: config.view_size,
        })
    }

    /// Issue a `performFind` call and decode the returned rows.
    async fn perform_find<T: DeserializeOwned>(
        &self,
        request: &FindRequest,
    ) -> Result<Vec<T>, LookupError> {
        let response = self
            .client
            .post(self.find_url.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                entity = %request.entity_name,
                body = %error_body,
                "performFind request failed"
            );
            return Err(LookupError::backend(status.as_u16(), error_body));
        }

        let body: Value = response.json().await?;
        if has_error(&body) {
            return Err(LookupError::backend(status.as_u16(), error_message(&body)));
        }

        let rows: Vec<T> = match body.get("docs") {
            Some(docs) => serde_json::from_value(docs.clone())
                .map_err(|e| LookupError::parse(format!("{}: {}", request.entity_name, e)))?,
            None => Vec::new(),
        };

        if reached_view_size(rows.len(), self.view_size) {
            warn!(
                entity = %request.entity_name,
                view_size = self.view_size,
                "performFind returned a full page, lookup may be truncated"
            );
        }

        debug!(entity = %request.entity_name, rows = rows.len(), "performFind completed");
        Ok(rows)
    }
}

/// A full page means the OMS may have had more rows than were returned.
fn reached_view_size(row_count: usize, view_size: usize) -> bool {
    view_size > 0 && row_count >= view_size
}

/// Group rows by key, keeping row order within each key.
fn group_rows<K, V, F>(rows: impl IntoIterator<Item = V>, key: F) -> HashMap<K, Vec<V>>
where
    K: Eq + Hash,
    F: Fn(&V) -> Option<K>,
{
    let mut grouped: HashMap<K, Vec<V>> = HashMap::new();
    for row in rows {
        if let Some(k) = key(&row) {
            grouped.entry(k).or_default().push(row);
        }
    }
    grouped
}

#[async_trait]
impl FulfillmentLookups for OmsLookupClient {
    #[instrument(skip_all, fields(bins = picklist_bin_ids.len(), orders = order_ids.len()))]
    async fn shipments_for_orders(
        &self,
        picklist_bin_ids: &[String],
        order_ids: &[String],
    ) -> Result<HashMap<String, Vec<String>>, LookupError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut request = FindRequest::entity(SHIPMENT_ENTITY, self.view_size)
            .field_in("primaryOrderId", order_ids)
            .field_not_equal("statusId", "SHIPMENT_CANCELLED")
            .fields(&["shipmentId", "primaryOrderId", "picklistBinId"]);
        if !picklist_bin_ids.is_empty() {
            request = request.field_in("picklistBinId", picklist_bin_ids);
        }

        let rows: Vec<ShipmentRow> = self.perform_find(&request).await?;
        let grouped = group_rows(rows, |row| row.primary_order_id.clone());
        Ok(grouped
            .into_iter()
            .map(|(order_id, rows)| {
                (
                    order_id,
                    rows.into_iter().map(|row| row.shipment_id).collect(),
                )
            })
            .collect())
    }

    #[instrument(skip_all, fields(shipments = shipment_ids.len()))]
    async fn packages_for_shipments(
        &self,
        shipment_ids: &[String],
    ) -> Result<HashMap<String, Vec<ShipmentPackage>>, LookupError> {
        if shipment_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let request = FindRequest::entity(PACKAGE_ENTITY, self.view_size)
            .field_in("shipmentId", shipment_ids)
            .fields(&[
                "shipmentId",
                "shipmentPackageSeqId",
                "packageName",
                "shipmentBoxTypeId",
                "primaryOrderId",
                "carrierPartyId",
                "trackingCode",
            ]);

        let rows: Vec<ShipmentPackage> = self.perform_find(&request).await?;
        Ok(group_rows(rows, |row| row.primary_order_id.clone()))
    }

    #[instrument(skip_all, fields(shipments = shipment_ids.len()))]
    async fn shipment_items_for_shipments(
        &self,
        shipment_ids: &[String],
    ) -> Result<HashMap<String, Vec<ShipmentItemInfo>>, LookupError> {
        if shipment_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let request = FindRequest::entity(ORDER_SHIPMENT_ENTITY, self.view_size)
            .field_in("shipmentId", shipment_ids)
            .fields(&["orderId", "orderItemSeqId", "shipmentId", "shipmentItemSeqId"]);

        let rows: Vec<ShipmentItemInfo> = self.perform_find(&request).await?;
        Ok(group_rows(rows, |row| Some(row.order_id.clone())))
    }

    #[instrument(skip_all, fields(shipments = shipment_ids.len()))]
    async fn carriers_for_shipments(
        &self,
        shipment_ids: &[String],
    ) -> Result<HashMap<String, Vec<ShipmentCarrier>>, LookupError> {
        if shipment_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let request = FindRequest::entity(ROUTE_SEGMENT_ENTITY, self.view_size)
            .field_in("shipmentId", shipment_ids)
            .fields(&["shipmentId", "carrierPartyId", "shipmentMethodTypeId"]);

        let rows: Vec<RouteSegmentRow> = self.perform_find(&request).await?;
        let carriers = rows.into_iter().filter_map(|row| {
            row.carrier_party_id.map(|carrier_party_id| ShipmentCarrier {
                shipment_id: row.shipment_id,
                carrier_party_id,
                shipment_method_type_id: row.shipment_method_type_id,
            })
        });
        Ok(group_rows(carriers, |carrier| {
            Some(carrier.shipment_id.clone())
        }))
    }

    #[instrument(skip_all, fields(carriers = carrier_party_ids.len()))]
    async fn box_types_for_carriers(
        &self,
        carrier_party_ids: &[String],
    ) -> Result<HashMap<String, Vec<CarrierBoxType>>, LookupError> {
        if carrier_party_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let request = FindRequest::entity(CARRIER_BOX_TYPE_ENTITY, self.view_size)
            .field_in("partyId", carrier_party_ids)
            .fields(&["partyId", "shipmentBoxTypeId"]);

        let rows: Vec<CarrierBoxTypeRow> = self.perform_find(&request).await?;
        let box_types = rows.into_iter().map(|row| CarrierBoxType {
            carrier_party_id: row.party_id,
            shipment_box_type_id: row.shipment_box_type_id,
        });
        Ok(group_rows(box_types, |box_type| {
            Some(box_type.carrier_party_id.clone())
        }))
    }
}
