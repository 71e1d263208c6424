//! # Fulfillment Orders
//!
//! Aggregates order-fulfillment data from a grouped search index and the order
//! management system's lookups into per-order views for three order classes:
//! in-progress, open and completed.
//!
//! ## Architecture
//!
//! Each pipeline run follows the same sequence:
//!
//! 1. **Query**: Builds a faceted, class-specific query from the filter state
//! 2. **Search**: Executes it against the grouped-search gateway
//! 3. **Enrichment**: Fans out dependent lookups (in-progress orders only)
//! 4. **Projector**: Joins hits and lookups into order views
//! 5. **Orchestrator**: Sequences the steps and commits the result per class
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`query`]: Query builder
//! - [`enrichment`]: Enrichment fan-out coordinator
//! - [`projector`]: Order projection
//! - [`notifier`]: Product-information requests and run lifecycle events
//! - [`orchestrator`]: Per-class pipelines and committed state
//! - [`errors`]: Error types for the pipeline

pub mod config;
pub mod enrichment;
pub mod errors;
pub mod notifier;
pub mod orchestrator;
pub mod projector;
pub mod query;

pub use config::Dependencies;
pub use errors::{EnrichmentError, PipelineError};
pub use orchestrator::{CommittedState, OrderPipeline};
pub use query::QueryOverrides;

use thiserror::Error;

/// Errors that can occur during start-up or execution.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
