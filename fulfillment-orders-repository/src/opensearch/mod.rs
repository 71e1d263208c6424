//! OpenSearch implementation of the search gateway.
//!
//! Groups are produced with field collapsing: each collapsed hit is one group,
//! its inner hits are the group's documents, and a cardinality aggregation on
//! the group field reports the number of groups.

mod gateway;
mod index_config;
mod request;
mod response;

pub use gateway::OpenSearchGateway;
pub use index_config::{IndexConfig, INDEX_NAME};
pub use request::build_search_body;
pub use response::parse_grouped_response;
