//! This module defines the core data structures used across the fulfillment
//! order pipeline, from filter state through to projected order views.

pub mod enrichment;
pub mod filter_state;
pub mod grouped_hit;
pub mod order_class;
pub mod order_view;
pub mod structured_query;
