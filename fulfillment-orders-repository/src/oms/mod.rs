//! Order management system (OMS) implementation of the fulfillment lookups.
//!
//! Every lookup is a single `performFind` call with an `in` condition on the
//! batch of keys.

mod client;
mod find_request;

pub use client::OmsLookupClient;
pub use find_request::{has_error, FindRequest};
