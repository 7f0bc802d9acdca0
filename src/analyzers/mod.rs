//! Price aggregation.
//!
//! This module groups filtered calendar rows by day, listing, room type and
//! neighbourhood and computes mean, median and quartiles of the canonical
//! prices in each group.

pub mod aggregate;
pub mod types;
pub mod utility;

pub use aggregate::{SplitOptions, aggregate};
pub use types::{Aggregates, DailyRow, ListingRow, PriceStats, SegmentRow, SummaryRow};
