//! # Fulfillment Orders Repository
//!
//! This crate provides the seams the order pipeline talks to and their
//! concrete backends: a grouped-search gateway over OpenSearch and a batched
//! lookup client for the order management system's `performFind` endpoint.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod oms;
pub mod opensearch;

pub use config::{GatewayConfig, OmsClientConfig};
pub use errors::{LookupError, SearchGatewayError};
pub use interfaces::{FulfillmentLookups, SearchGateway};
pub use oms::OmsLookupClient;
pub use opensearch::OpenSearchGateway;
