//! Dependency initialization and wiring for the order pipelines.

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::notifier::{Notifier, ProductInfoRequest};
use crate::orchestrator::OrderPipeline;
use crate::AppError;
use fulfillment_orders_repository::opensearch::{IndexConfig, INDEX_NAME};
use fulfillment_orders_repository::{
    GatewayConfig, OmsClientConfig, OmsLookupClient, OpenSearchGateway,
};
use fulfillment_orders_shared::FulfillmentScope;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Default capacity of the product information request channel.
const DEFAULT_PRODUCT_INFO_CHANNEL_SIZE: usize = 64;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection at a fixed interval until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse connection mode from environment variable.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive)
    /// Defaults to "retry" if not set or invalid.
    fn from_env() -> Self {
        match env::var("OPENSEARCH_CONNECTION_MODE")
            .unwrap_or_else(|_| "retry".to_string())
            .to_lowercase()
            .as_str()
        {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured pipelines ready to run.
    pub pipeline: OrderPipeline,
    /// Receiver for product information requests emitted by runs.
    pub product_info_rx: mpsc::Receiver<ProductInfoRequest>,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `ORDER_INDEX_ALIAS`: Index alias name (default: "order_fulfillment")
    /// - `ORDER_INDEX_GROUP_LIMIT`: Documents returned per group (default: 100)
    /// - `OMS_BASE_URL`: OMS REST API base URL (default: http://localhost:8080/api/)
    /// - `OMS_API_TOKEN`: Bearer token for the OMS (optional)
    /// - `OMS_LOOKUP_VIEW_SIZE`: Rows requested per lookup (default: 250)
    /// - `OMS_TIMEOUT_SECS`: Lookup request timeout (default: 30)
    /// - `FACILITY_ID`: Facility every query is scoped to (required)
    /// - `PRODUCT_STORE_ID`: Product store every query is scoped to (required)
    /// - `PRODUCT_INFO_CHANNEL_SIZE`: Product information channel capacity (default: 64)
    /// - `OPENSEARCH_CONNECTION_MODE`: Connection mode - "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(AppError)` - If required variables are missing or a client cannot be built
    pub async fn new() -> Result<Self, AppError> {
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let connection_mode = ConnectionMode::from_env();
        let retry_interval = env_or("OPENSEARCH_RETRY_INTERVAL_SECS", DEFAULT_RETRY_INTERVAL_SECS);

        let scope = FulfillmentScope::new(required("FACILITY_ID")?, required("PRODUCT_STORE_ID")?);

        info!(
            opensearch_url = %opensearch_url,
            facility_id = %scope.facility_id,
            product_store_id = %scope.product_store_id,
            connection_mode = ?connection_mode,
            retry_interval_secs = retry_interval,
            "Initializing dependencies"
        );

        let index_alias = env::var("ORDER_INDEX_ALIAS").unwrap_or_else(|_| INDEX_NAME.to_string());
        let index_config = IndexConfig::new(index_alias);
        let gateway_config = GatewayConfig::with_group_limit(env_or(
            "ORDER_INDEX_GROUP_LIMIT",
            GatewayConfig::default().group_limit,
        ));

        // Initialize the search gateway with retry logic
        let gateway = Self::connect_to_opensearch(
            &opensearch_url,
            index_config,
            gateway_config,
            connection_mode,
            Duration::from_secs(retry_interval),
        )
        .await?;

        info!("OpenSearch connection established");

        let oms_defaults = OmsClientConfig::default();
        let mut oms_config = OmsClientConfig {
            base_url: env::var("OMS_BASE_URL").unwrap_or(oms_defaults.base_url),
            api_token: None,
            view_size: env_or("OMS_LOOKUP_VIEW_SIZE", oms_defaults.view_size),
            timeout: Duration::from_secs(env_or(
                "OMS_TIMEOUT_SECS",
                oms_defaults.timeout.as_secs(),
            )),
        };
        if let Ok(token) = env::var("OMS_API_TOKEN") {
            oms_config = oms_config.with_token(token);
        }

        let lookups = OmsLookupClient::new(oms_config)
            .map_err(|e| AppError::config(format!("Failed to create OMS client: {}", e)))?;

        let (notifier, product_info_rx) = Notifier::new(env_or(
            "PRODUCT_INFO_CHANNEL_SIZE",
            DEFAULT_PRODUCT_INFO_CHANNEL_SIZE,
        ));

        let pipeline = OrderPipeline::new(Arc::new(gateway), Arc::new(lookups), notifier, scope);

        Ok(Self {
            pipeline,
            product_info_rx,
        })
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    async fn connect_to_opensearch(
        url: &str,
        index_config: IndexConfig,
        gateway_config: GatewayConfig,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchGateway, AppError> {
        loop {
            match Self::try_connect_opensearch(url, index_config.clone(), gateway_config.clone())
                .await
            {
                Ok(gateway) => return Ok(gateway),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(AppError::config(format!(
                            "Failed to connect to OpenSearch: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }

    /// Attempt to connect to OpenSearch and check that it answers.
    async fn try_connect_opensearch(
        url: &str,
        index_config: IndexConfig,
        gateway_config: GatewayConfig,
    ) -> Result<OpenSearchGateway, AppError> {
        let gateway = OpenSearchGateway::new(url, index_config, gateway_config)
            .await
            .map_err(|e| AppError::config(format!("Failed to create OpenSearch gateway: {}", e)))?;

        gateway
            .ping()
            .await
            .map_err(|e| AppError::config(format!("OpenSearch did not answer: {}", e)))?;

        Ok(gateway)
    }
}

/// Read and parse an environment variable, falling back to `default`.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

fn required(key: &str) -> Result<String, AppError> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::config(format!("{} must be set", key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back_on_missing_or_invalid() {
        assert_eq!(env_or("FULFILLMENT_ORDERS_TEST_UNSET_VAR", 42usize), 42);

        env::set_var("FULFILLMENT_ORDERS_TEST_INVALID_VAR", "not-a-number");
        assert_eq!(env_or("FULFILLMENT_ORDERS_TEST_INVALID_VAR", 7u64), 7);

        env::set_var("FULFILLMENT_ORDERS_TEST_VALID_VAR", "25");
        assert_eq!(env_or("FULFILLMENT_ORDERS_TEST_VALID_VAR", 7u64), 25);
    }

    #[test]
    fn test_required_rejects_missing_and_blank() {
        assert!(matches!(
            required("FULFILLMENT_ORDERS_TEST_MISSING_REQUIRED"),
            Err(AppError::Config(_))
        ));

        env::set_var("FULFILLMENT_ORDERS_TEST_BLANK_REQUIRED", "  ");
        assert!(required("FULFILLMENT_ORDERS_TEST_BLANK_REQUIRED").is_err());

        env::set_var("FULFILLMENT_ORDERS_TEST_SET_REQUIRED", "WH_1");
        assert_eq!(required("FULFILLMENT_ORDERS_TEST_SET_REQUIRED").unwrap(), "WH_1");
    }
}
