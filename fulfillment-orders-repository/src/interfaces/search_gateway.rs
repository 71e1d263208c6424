//! Grouped search gateway trait definition.

use async_trait::async_trait;
use fulfillment_orders_shared::{GroupedSearchResponse, StructuredQuery};

use crate::errors::SearchGatewayError;

/// Executes structured queries against the grouped-search backend.
///
/// Implementations translate the backend-agnostic [`StructuredQuery`] into
/// their own request format and resolve raw hits into typed documents before
/// returning.
#[async_trait]
pub trait SearchGateway: Send + Sync {
    /// Execute a grouped search.
    ///
    /// # Returns
    ///
    /// * `Ok(GroupedSearchResponse)` - Groups for the requested page, plus match and group counts
    /// * `Err(SearchGatewayError::TransportError)` - If the request could not be completed
    /// * `Err(SearchGatewayError::BackendReported)` - If the backend signalled a failure
    async fn execute(
        &self,
        query: &StructuredQuery,
    ) -> Result<GroupedSearchResponse, SearchGatewayError>;
}
