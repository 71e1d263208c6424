//! Error types for the order pipeline.
//!
//! None of these reach callers of a pipeline run: a failed run is logged and
//! committed as an empty page.

use fulfillment_orders_repository::{LookupError, SearchGatewayError};
use thiserror::Error;

/// Errors from the enrichment fan-out.
#[derive(Error, Debug)]
pub enum EnrichmentError {
    /// One of the dependent lookups failed, failing the whole fan-out.
    #[error("{lookup} lookup failed: {source}")]
    Lookup {
        lookup: &'static str,
        #[source]
        source: LookupError,
    },
}

impl EnrichmentError {
    /// Create a lookup error for the named lookup.
    pub fn lookup(lookup: &'static str, source: LookupError) -> Self {
        Self::Lookup { lookup, source }
    }
}

/// Errors that end a pipeline run early.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The grouped search could not be executed.
    #[error("Search error: {0}")]
    Search(#[from] SearchGatewayError),

    /// The search answered with a non-success status.
    #[error("Search returned status {0}")]
    BackendStatus(u16),

    /// The enrichment fan-out failed.
    #[error("Enrichment error: {0}")]
    Enrichment(#[from] EnrichmentError),
}
