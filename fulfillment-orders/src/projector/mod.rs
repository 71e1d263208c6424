//! Order projector.
//!
//! Joins grouped hits with an enrichment bundle into the order views of a
//! class. Deterministic: every "first match" follows document order.

use std::collections::{BTreeMap, BTreeSet};

use fulfillment_orders_shared::{
    CompletedOrder, EnrichmentBundle, GroupedHit, InProgressItem, InProgressOrder, OpenOrder,
    OrderClass, OrderItemDoc, OrderView, ShipmentPackage,
};

/// Project a page of groups into order views.
///
/// `bundle` is only read for in-progress orders; a missing bundle behaves like
/// an empty one.
pub fn project(
    class: OrderClass,
    groups: &[GroupedHit],
    bundle: Option<&EnrichmentBundle>,
) -> Vec<OrderView> {
    match class {
        OrderClass::InProgress => {
            let empty = EnrichmentBundle::default();
            let bundle = bundle.unwrap_or(&empty);
            groups
                .iter()
                .map(|group| OrderView::InProgress(project_in_progress(group, bundle)))
                .collect()
        }
        OrderClass::Open => groups
            .iter()
            .map(|group| {
                OrderView::Open(OpenOrder {
                    group_value: group.group_value.clone(),
                    doc_count: group.doc_count,
                    items: group.docs.clone(),
                })
            })
            .collect(),
        OrderClass::Completed => groups
            .iter()
            .map(|group| OrderView::Completed(project_completed(group)))
            .collect(),
    }
}

fn project_in_progress(group: &GroupedHit, bundle: &EnrichmentBundle) -> InProgressOrder {
    let order_id = group.primary_order_id();
    let packages = order_id.and_then(|id| bundle.packages_for_order(id));

    let carrier_party_ids: Vec<String> = order_id
        .map(|id| bundle.shipments_for_order(id))
        .unwrap_or_default()
        .iter()
        .filter_map(|shipment_id| bundle.carrier_party_ids_by_shipment.get(shipment_id))
        .flatten()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let shipment_box_type_by_carrier_party: BTreeMap<String, Vec<String>> = carrier_party_ids
        .iter()
        .filter_map(|carrier| {
            bundle
                .box_types_by_carrier_party
                .get(carrier)
                .map(|box_types| (carrier.clone(), box_types.clone()))
        })
        .collect();

    let items = group
        .docs
        .iter()
        .map(|doc| InProgressItem {
            shipment_item_seq_id: item_shipment_seq(doc, bundle),
            selected_box: selected_box(doc, packages),
            doc: doc.clone(),
        })
        .collect();

    InProgressOrder {
        group_value: group.group_value.clone(),
        doc_count: group.doc_count,
        order_id: order_id.map(str::to_string),
        items,
        shipment_packages: packages.map(<[ShipmentPackage]>::to_vec),
        carrier_party_ids,
        shipment_box_type_by_carrier_party,
    }
}

fn item_shipment_seq(doc: &OrderItemDoc, bundle: &EnrichmentBundle) -> Option<String> {
    let order_id = doc.order_id.as_deref()?;
    let order_item_seq_id = doc.order_item_seq_id.as_deref()?;
    bundle
        .shipment_item_seq(order_id, order_item_seq_id)
        .map(str::to_string)
}

/// Package name of the first package on the item's shipment.
fn selected_box(doc: &OrderItemDoc, packages: Option<&[ShipmentPackage]>) -> Option<String> {
    let shipment_id = doc.shipment_id.as_deref()?;
    packages?
        .iter()
        .find(|package| package.shipment_id == shipment_id)
        .and_then(|package| package.package_name.clone())
}

fn project_completed(group: &GroupedHit) -> CompletedOrder {
    let first = group.first_doc();

    CompletedOrder {
        group_value: group.group_value.clone(),
        customer_id: first.and_then(|doc| doc.customer_id.clone()),
        customer_name: first.and_then(|doc| doc.customer_name.clone()),
        order_id: first.and_then(|doc| doc.order_id.clone()),
        order_date: first.and_then(|doc| doc.order_date),
        shipment_id: first.and_then(|doc| doc.shipment_id.clone()),
        shipment_method_type_id: first.and_then(|doc| doc.shipment_method_type_id.clone()),
        shipment_method_type_desc: first.and_then(|doc| doc.shipment_method_type_desc.clone()),
        items: group.docs.clone(),
    }
}
