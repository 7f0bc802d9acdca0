//! Data-quality counters collected during a run.

use serde::Serialize;
use std::path::PathBuf;

use crate::config::DateWindow;

/// Counters gathered while reading one input file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Data rows seen, including dropped ones.
    pub rows_read: usize,
    pub dropped_rows: usize,
    /// Kept rows whose price is missing, for any reason.
    pub missing_prices: usize,
    /// Subset of `missing_prices` where a non-empty value failed to parse.
    pub unparseable_prices: usize,
}

impl LoadStats {
    pub fn kept_rows(&self) -> usize {
        self.rows_read - self.dropped_rows
    }
}

/// Summary of a completed run, reported alongside the exported files.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub window: Option<DateWindow>,
    pub only_booked: bool,
    pub calendar_path: Option<PathBuf>,
    pub listings_path: Option<PathBuf>,

    // calendar input
    pub calendar: LoadStats,

    // listings input
    pub listings_loaded: usize,
    pub listings_dropped: usize,
    pub duplicate_listing_ids: usize,

    // filtering
    pub rows_in_window: usize,
    pub rows_analyzed: usize,
    pub rows_with_listing: usize,
    pub priced_rows: usize,

    pub outputs: Vec<PathBuf>,
}

impl RunReport {
    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    /// Share of read calendar rows that were dropped as malformed.
    pub fn dropped_pct(&self) -> f64 {
        Self::pct(self.calendar.dropped_rows, self.calendar.rows_read)
    }

    /// Share of kept calendar rows without a usable price.
    pub fn missing_price_pct(&self) -> f64 {
        Self::pct(self.calendar.missing_prices, self.calendar.kept_rows())
    }

    /// Share of analyzed rows that matched a listing.
    pub fn join_match_pct(&self) -> f64 {
        Self::pct(self.rows_with_listing, self.rows_analyzed)
    }
}
