//! Error types for the fulfillment orders repository.
//!
//! Search and lookup calls fail in the same two ways: at the transport level,
//! or with a response whose body reports a logical failure.

mod lookup_error;
mod search_gateway_error;

pub use lookup_error::LookupError;
pub use search_gateway_error::SearchGatewayError;
