//! Orchestrator module for the order pipelines.
//!
//! Sequences query building, search, enrichment and projection for each order
//! class, and owns the committed filter state and order page of every class.

use std::sync::Arc;

use chrono::Utc;
use fulfillment_orders_repository::{FulfillmentLookups, SearchGateway};
use fulfillment_orders_shared::{
    FilterState, FilterUpdate, FulfillmentScope, OrderClass, OrderPage, StructuredQuery,
};
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, error, info, instrument, Span};
use uuid::Uuid;

use crate::enrichment::{group_keys, EnrichmentCoordinator};
use crate::errors::PipelineError;
use crate::notifier::{Notifier, ProductInfoRequest, RunEvent};
use crate::projector::project;
use crate::query::{build_query, QueryOverrides};

/// Filter state and order page last committed for a class.
///
/// Both are written together at the end of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommittedState {
    pub filter: FilterState,
    pub page: OrderPage,
}

#[derive(Default)]
struct ClassSlot {
    /// Held for the whole snapshot-to-commit sequence of a run.
    run_lock: Mutex<()>,
    committed: RwLock<CommittedState>,
}

/// Runs the per-class order pipelines.
///
/// Runs of the same class are serialized; runs of different classes proceed
/// independently.
pub struct OrderPipeline {
    gateway: Arc<dyn SearchGateway>,
    enrichment: EnrichmentCoordinator,
    notifier: Notifier,
    scope: RwLock<FulfillmentScope>,
    in_progress: ClassSlot,
    open: ClassSlot,
    completed: ClassSlot,
}

impl OrderPipeline {
    /// Create a new pipeline with default filter state for every class.
    pub fn new(
        gateway: Arc<dyn SearchGateway>,
        lookups: Arc<dyn FulfillmentLookups>,
        notifier: Notifier,
        scope: FulfillmentScope,
    ) -> Self {
        Self {
            gateway,
            enrichment: EnrichmentCoordinator::new(lookups),
            notifier,
            scope: RwLock::new(scope),
            in_progress: ClassSlot::default(),
            open: ClassSlot::default(),
            completed: ClassSlot::default(),
        }
    }

    fn slot(&self, class: OrderClass) -> &ClassSlot {
        match class {
            OrderClass::InProgress => &self.in_progress,
            OrderClass::Open => &self.open,
            OrderClass::Completed => &self.completed,
        }
    }

    /// Run a class's pipeline and commit the result.
    ///
    /// Never fails: a search or enrichment failure is logged, reported as a
    /// [`RunEvent::Failed`] and committed as an empty page. The committed page
    /// size becomes the number of orders returned.
    #[instrument(skip_all, fields(order_class = %class, run_id = tracing::field::Empty))]
    pub async fn run(&self, class: OrderClass, overrides: QueryOverrides) -> OrderPage {
        let slot = self.slot(class);
        let _run = slot.run_lock.lock().await;
        self.run_locked(class, slot, None, &overrides).await
    }

    /// Merge `update` into a class's filter state, then run its pipeline once.
    ///
    /// The merged state becomes visible together with the run's orders.
    #[instrument(skip_all, fields(order_class = %class, run_id = tracing::field::Empty))]
    pub async fn update_filters(&self, class: OrderClass, update: FilterUpdate) -> OrderPage {
        let slot = self.slot(class);
        let _run = slot.run_lock.lock().await;
        self.run_locked(class, slot, Some(update), &QueryOverrides::default())
            .await
    }

    /// Reset a class's committed orders. The filter state is kept.
    pub async fn clear(&self, class: OrderClass) {
        self.slot(class).committed.write().await.page = OrderPage::empty();
        debug!(order_class = %class, "Cleared committed orders");
    }

    /// Reset the committed orders of every class.
    pub async fn clear_all(&self) {
        for class in OrderClass::ALL {
            self.clear(class).await;
        }
    }

    /// Committed filter state and orders of a class.
    pub async fn snapshot(&self, class: OrderClass) -> CommittedState {
        self.slot(class).committed.read().await.clone()
    }

    /// Replace the facility and store used by subsequent runs.
    pub async fn set_scope(&self, scope: FulfillmentScope) {
        info!(
            facility_id = %scope.facility_id,
            product_store_id = %scope.product_store_id,
            "Fulfillment scope updated"
        );
        *self.scope.write().await = scope;
    }

    /// Subscribe to run lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.notifier.subscribe()
    }

    /// Body of a run. The caller must hold the class's run lock.
    async fn run_locked(
        &self,
        class: OrderClass,
        slot: &ClassSlot,
        update: Option<FilterUpdate>,
        overrides: &QueryOverrides,
    ) -> OrderPage {
        let run_id = Uuid::new_v4();
        Span::current().record("run_id", tracing::field::display(run_id));
        self.notifier.emit(RunEvent::Started {
            run_id,
            order_class: class,
            at: Utc::now(),
        });

        let mut filter = slot.committed.read().await.filter.clone();
        if let Some(update) = update {
            filter.apply(update);
        }
        let scope = self.scope.read().await.clone();
        let query = build_query(class, &filter, &scope, overrides);

        let page = match self.fetch(class, &query).await {
            Ok(page) => {
                info!(
                    order_count = page.len(),
                    total = page.total,
                    "Pipeline run completed"
                );
                self.notifier.emit(RunEvent::Completed {
                    run_id,
                    order_class: class,
                    order_count: page.len(),
                    total: page.total,
                    at: Utc::now(),
                });
                page
            }
            Err(e) => {
                error!(error = %e, query = ?query, "Pipeline run failed, committing empty page");
                self.notifier.emit(RunEvent::Failed {
                    run_id,
                    order_class: class,
                    error: e.to_string(),
                    at: Utc::now(),
                });
                OrderPage::empty()
            }
        };

        filter.view_size = page.len();
        let mut committed = slot.committed.write().await;
        committed.filter = filter;
        committed.page = page.clone();
        page
    }

    /// Search, enrich and project one page without committing it.
    async fn fetch(
        &self,
        class: OrderClass,
        query: &StructuredQuery,
    ) -> Result<OrderPage, PipelineError> {
        let response = self.gateway.execute(query).await?;
        if !response.is_success() {
            return Err(PipelineError::BackendStatus(response.status_code));
        }
        if !response.has_matches() {
            info!(query = ?query, "No orders found");
            return Ok(OrderPage::empty());
        }

        debug!(
            matches = response.matches,
            group_count = response.group_count,
            "Search returned groups"
        );

        let bundle = if class.requires_enrichment() {
            let (group_ids, order_ids) = group_keys(&response.groups);
            Some(self.enrichment.enrich(&group_ids, &order_ids).await?)
        } else {
            None
        };

        let orders = project(class, &response.groups, bundle.as_ref());
        self.notifier
            .request_product_info(ProductInfoRequest::new(class, &orders));

        Ok(OrderPage {
            orders,
            total: response.group_count,
        })
    }
}
