//! Downstream notifications.
//!
//! Product-information requests go to a bounded channel with `try_send`, so a
//! slow or missing consumer never blocks a pipeline run. Run lifecycle events
//! are broadcast to any number of subscribers.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use fulfillment_orders_shared::{OrderClass, OrderView};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

/// Default capacity of the run event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Request to fetch product information for a page of projected orders.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInfoRequest {
    pub order_class: OrderClass,
    pub orders: Vec<OrderView>,
}

impl ProductInfoRequest {
    pub fn new(order_class: OrderClass, orders: &[OrderView]) -> Self {
        Self {
            order_class,
            orders: orders.to_vec(),
        }
    }

    /// Distinct product ids across all orders.
    pub fn product_ids(&self) -> BTreeSet<String> {
        self.orders.iter().flat_map(OrderView::product_ids).collect()
    }
}

/// Lifecycle of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Started {
        run_id: Uuid,
        order_class: OrderClass,
        at: DateTime<Utc>,
    },
    Completed {
        run_id: Uuid,
        order_class: OrderClass,
        order_count: usize,
        total: u64,
        at: DateTime<Utc>,
    },
    /// The run failed and committed an empty page.
    Failed {
        run_id: Uuid,
        order_class: OrderClass,
        error: String,
        at: DateTime<Utc>,
    },
}

impl RunEvent {
    pub fn run_id(&self) -> Uuid {
        match self {
            RunEvent::Started { run_id, .. }
            | RunEvent::Completed { run_id, .. }
            | RunEvent::Failed { run_id, .. } => *run_id,
        }
    }

    pub fn order_class(&self) -> OrderClass {
        match self {
            RunEvent::Started { order_class, .. }
            | RunEvent::Completed { order_class, .. }
            | RunEvent::Failed { order_class, .. } => *order_class,
        }
    }
}

/// Sender side of both notification channels.
#[derive(Clone)]
pub struct Notifier {
    product_info_tx: mpsc::Sender<ProductInfoRequest>,
    events_tx: broadcast::Sender<RunEvent>,
}

impl Notifier {
    /// Create a notifier and the receiver for product-information requests.
    pub fn new(product_info_capacity: usize) -> (Self, mpsc::Receiver<ProductInfoRequest>) {
        let (product_info_tx, product_info_rx) = mpsc::channel(product_info_capacity.max(1));
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        (
            Self {
                product_info_tx,
                events_tx,
            },
            product_info_rx,
        )
    }

    /// Submit a product-information request without waiting.
    ///
    /// Returns true if the request was queued. A full or closed channel is
    /// logged and otherwise ignored.
    pub fn request_product_info(&self, request: ProductInfoRequest) -> bool {
        let order_class = request.order_class;
        match self.product_info_tx.try_send(request) {
            Ok(()) => {
                debug!(order_class = %order_class, "Queued product information request");
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(order_class = %order_class, "Product information channel full, dropping request");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(order_class = %order_class, "Product information channel closed, dropping request");
                false
            }
        }
    }

    /// Broadcast a run event. Having no subscribers is not an error.
    pub fn emit(&self, event: RunEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Subscribe to run events.
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.events_tx.subscribe()
    }
}
