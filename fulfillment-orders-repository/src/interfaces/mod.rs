//! Interface definitions for the pipeline's external collaborators.
//!
//! The pipeline depends only on these traits, so backends can be swapped and
//! tests can inject mock implementations.

mod fulfillment_lookups;
mod search_gateway;

pub use fulfillment_lookups::FulfillmentLookups;
pub use search_gateway::SearchGateway;
