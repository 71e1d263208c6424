//! Fulfillment Orders Main Entry Point
//!
//! Runs the in-progress, open and completed pipelines once for the configured
//! facility and store, and logs the realized pages and the product information
//! requests they produced.

use dotenv::dotenv;
use fulfillment_orders::notifier::RunEvent;
use fulfillment_orders::{AppError, Dependencies, QueryOverrides};
use fulfillment_orders_shared::OrderClass;
use std::env;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("fulfillment_orders=info,fulfillment_orders_repository=info")
    });

    let json_output = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| AppError::config(format!("Failed to initialize tracing: {}", e)))?;

        info!(
            service_name = "fulfillment-orders",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| AppError::config(format!("Failed to initialize tracing: {}", e)))?;

        info!(
            service_name = "fulfillment-orders",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }

    Ok(())
}

/// Log run events until the pipeline is dropped. Returns the number logged.
async fn log_run_events(mut events: broadcast::Receiver<RunEvent>) -> usize {
    let mut logged = 0;
    loop {
        match events.recv().await {
            Ok(event) => {
                debug!(event = ?event, "Run event");
                logged += 1;
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Run event logger lagged behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
    logged
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    info!("Starting fulfillment order aggregation");

    let Dependencies {
        pipeline,
        mut product_info_rx,
    } = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let events = pipeline.subscribe();
    let event_logger = tokio::spawn(log_run_events(events));

    for class in OrderClass::ALL {
        let page = pipeline.run(class, QueryOverrides::default()).await;
        let committed = pipeline.snapshot(class).await;
        info!(
            order_class = %class,
            orders = page.len(),
            total = page.total,
            view_size = committed.filter.view_size,
            "Fetched orders"
        );
    }

    while let Ok(request) = product_info_rx.try_recv() {
        let product_ids = request.product_ids();
        info!(
            order_class = %request.order_class,
            orders = request.orders.len(),
            products = product_ids.len(),
            "Product information requested"
        );
        debug!(product_ids = ?product_ids, "Requested product ids");
    }

    drop(pipeline);
    let _ = event_logger.await;

    info!("Fulfillment order aggregation completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn started(order_class: OrderClass) -> RunEvent {
        RunEvent::Started {
            run_id: Uuid::new_v4(),
            order_class,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_event_logger_survives_lag() {
        let (sender, receiver) = broadcast::channel(1);
        for class in OrderClass::ALL {
            sender.send(started(class)).unwrap();
        }
        drop(sender);

        // the two oldest events are skipped, the newest is still logged
        assert_eq!(log_run_events(receiver).await, 1);
    }
}
