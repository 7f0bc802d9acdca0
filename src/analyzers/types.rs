//! Data types produced by the aggregation pipeline.

use chrono::NaiveDate;
use serde::Serialize;

use crate::analyzers::utility::{mean, median, percentile, sorted};

/// Descriptive statistics over the non-missing prices of one group.
///
/// Only exists for groups with at least one price, so `p25 <= median <= p75`
/// always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceStats {
    pub mean: f64,
    pub median: f64,
    pub p25: f64,
    pub p75: f64,
    pub count: usize,
}

impl PriceStats {
    /// Returns `None` when `prices` is empty.
    pub fn from_prices(prices: Vec<f64>) -> Option<Self> {
        let values = sorted(prices);
        Some(Self {
            mean: mean(&values)?,
            median: median(&values)?,
            p25: percentile(&values, 25.0)?,
            p75: percentile(&values, 75.0)?,
            count: values.len(),
        })
    }
}

/// Overall statistics for the whole filtered window (`prices_summary.csv`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Listings with at least one priced night.
    pub listings_active: usize,
    pub mean: f64,
    pub median: f64,
    pub p25: f64,
    pub p75: f64,
    pub count: usize,
}

/// One row of `daily_avg_price.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub mean: f64,
    pub median: f64,
    pub p25: f64,
    pub p75: f64,
    pub count: usize,
}

/// One row of `listing_avg_price_oct_nov.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingRow {
    pub listing_id: String,
    pub mean: f64,
    pub median: f64,
    pub p25: f64,
    pub p75: f64,
    pub count: usize,
}

/// One row of a categorical split (room type or neighbourhood).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRow {
    pub segment: String,
    /// Distinct listings in the segment.
    pub listings: usize,
    pub mean: f64,
    pub median: f64,
    pub p25: f64,
    pub p75: f64,
    pub count: usize,
}

/// Lets callers read the shared statistic columns of any row type.
pub trait HasPriceStats {
    fn price_stats(&self) -> PriceStats;
}

macro_rules! impl_has_price_stats {
    ($($row:ty),*) => {
        $(
            impl HasPriceStats for $row {
                fn price_stats(&self) -> PriceStats {
                    PriceStats {
                        mean: self.mean,
                        median: self.median,
                        p25: self.p25,
                        p75: self.p75,
                        count: self.count,
                    }
                }
            }
        )*
    };
}

impl_has_price_stats!(SummaryRow, DailyRow, ListingRow, SegmentRow);

/// The five aggregate views of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    /// `None` when the window has no priced nights.
    pub summary: Option<SummaryRow>,
    pub daily: Vec<DailyRow>,
    pub per_listing: Vec<ListingRow>,
    /// `None` when the split was not computed (no listings data, no
    /// room type column, or split disabled).
    pub room_type: Option<Vec<SegmentRow>>,
    pub neighbourhood: Option<Vec<SegmentRow>>,
}
