//! Configuration types for the search gateway and the lookup client.

use std::time::Duration;

/// Configuration for the grouped-search gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Field to group by when a query does not name one.
    ///
    /// Defaults to `orderId`, so ungrouped queries come back one group per order.
    pub default_group_field: String,

    /// Maximum number of documents returned inside each group.
    pub group_limit: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            default_group_field: "orderId".to_string(),
            group_limit: 100,
        }
    }
}

impl GatewayConfig {
    /// Create a config with a custom per-group document limit.
    pub fn with_group_limit(group_limit: usize) -> Self {
        Self {
            group_limit,
            ..Default::default()
        }
    }
}

/// Configuration for the OMS lookup client.
#[derive(Debug, Clone)]
pub struct OmsClientConfig {
    /// Base URL of the OMS REST API, e.g. `https://oms.example.com/api/`.
    pub base_url: String,

    /// Bearer token sent with every request, if set.
    pub api_token: Option<String>,

    /// Maximum rows requested from each `performFind` call.
    pub view_size: usize,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for OmsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/".to_string(),
            api_token: None,
            view_size: 250,
            timeout: Duration::from_secs(30),
        }
    }
}

impl OmsClientConfig {
    /// Create a config for the given base URL with default limits.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }
}
