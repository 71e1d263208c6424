//! OpenSearch gateway implementation.

use async_trait::async_trait;
use fulfillment_orders_shared::{GroupedSearchResponse, StructuredQuery};
use opensearch::{
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    OpenSearch, SearchParts,
};
use serde_json::Value;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::config::GatewayConfig;
use crate::errors::SearchGatewayError;
use crate::interfaces::SearchGateway;
use crate::opensearch::index_config::IndexConfig;
use crate::opensearch::request::build_search_body;
use crate::opensearch::response::parse_grouped_response;

/// Grouped-search gateway backed by OpenSearch.
///
/// # Example
///
/// ```ignore
/// use fulfillment_orders_repository::opensearch::IndexConfig;
/// use fulfillment_orders_repository::{GatewayConfig, OpenSearchGateway, SearchGateway};
///
/// let gateway = OpenSearchGateway::new(
///     "http://localhost:9200",
///     IndexConfig::default(),
///     GatewayConfig::default(),
/// )
/// .await?;
/// let response = gateway.execute(&query).await?;
/// ```
pub struct OpenSearchGateway {
    client: OpenSearch,
    index_config: IndexConfig,
    config: GatewayConfig,
}

impl OpenSearchGateway {
    /// Create a new gateway connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index alias to search
    /// * `config` - Grouping defaults
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchGateway)` - A new gateway instance
    /// * `Err(SearchGatewayError)` - If connection setup fails
    pub async fn new(
        url: &str,
        index_config: IndexConfig,
        config: GatewayConfig,
    ) -> Result<Self, SearchGatewayError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchGatewayError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchGatewayError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            alias = %index_config.alias,
            group_limit = config.group_limit,
            "Created OpenSearch gateway"
        );

        Ok(Self {
            client,
            index_config,
            config,
        })
    }

    /// Check that the cluster answers.
    pub async fn ping(&self) -> Result<(), SearchGatewayError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchGatewayError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(SearchGatewayError::connection(format!(
                "Ping failed with status {}",
                status
            )));
        }
        Ok(())
    }

    fn group_field<'a>(&'a self, query: &'a StructuredQuery) -> &'a str {
        query
            .group_by
            .as_deref()
            .unwrap_or(&self.config.default_group_field)
    }
}

#[async_trait]
impl SearchGateway for OpenSearchGateway {
    #[instrument(skip(self, query), fields(alias = %self.index_config.alias))]
    async fn execute(
        &self,
        query: &StructuredQuery,
    ) -> Result<GroupedSearchResponse, SearchGatewayError> {
        let group_field = self.group_field(query);
        let body = build_search_body(query, group_field, self.config.group_limit);

        let response = self
            .client
            .search(SearchParts::Index(&[&self.index_config.alias]))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchGatewayError::transport(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Search request failed");
            return Err(SearchGatewayError::backend(status.as_u16(), error_body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchGatewayError::parse(e.to_string()))?;

        let grouped = parse_grouped_response(status.as_u16(), body, group_field)?;

        debug!(
            group_field = %group_field,
            matches = grouped.matches,
            group_count = grouped.group_count,
            returned = grouped.groups.len(),
            "Grouped search executed"
        );
        Ok(grouped)
    }
}
