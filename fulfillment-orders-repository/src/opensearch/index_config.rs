//! OpenSearch index configuration for the order fulfillment index.

/// The default alias of the fulfillment index.
pub const INDEX_NAME: &str = "order_fulfillment";

/// Configuration for the index searched by the gateway.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// The alias name searched by every query.
    pub alias: String,
}

impl IndexConfig {
    /// Create a new index configuration for `alias`.
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(INDEX_NAME)
    }
}
