//! Runs one analysis end to end: load, filter and join, aggregate, export.

use tracing::{info, warn};

use crate::analyzers::{SplitOptions, aggregate};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::filter::filter_and_join;
use crate::loader::{load_calendar, load_listings};
use crate::output::{export, log_report};
use crate::stats::RunReport;

/// Executes the full pipeline for `config` and returns the run report.
///
/// # Errors
///
/// Fails on a missing calendar file, a missing required column, unreadable
/// input, or any output write failure. Row-level problems only show up as
/// counters in the report.
#[tracing::instrument(skip_all, fields(data_dir = %config.data_dir.display()))]
pub fn run(config: &AnalysisConfig) -> Result<RunReport> {
    let calendar = load_calendar(&config.data_dir, &config.availability)?;
    let listings = load_listings(&config.data_dir)?;

    let filtered = filter_and_join(
        &calendar.records,
        config.window,
        config.only_booked,
        listings.as_ref(),
    );
    if filtered.rows.is_empty() {
        warn!(
            start = %config.window.start(),
            end = %config.window.end(),
            "No calendar rows in the requested window"
        );
    }

    let aggregates = aggregate(
        &filtered,
        SplitOptions {
            room_type: config.room_type_split,
            neighbourhood: config.neighbourhood_split,
        },
    );

    let outputs = export(&aggregates, &filtered, &config.output_dir)?;

    let report = RunReport {
        window: Some(config.window),
        only_booked: config.only_booked,
        calendar_path: Some(calendar.source.clone()),
        listings_path: listings.as_ref().map(|l| l.source.clone()),
        calendar: calendar.stats.clone(),
        listings_loaded: listings.as_ref().map_or(0, |l| l.listings.len()),
        listings_dropped: listings.as_ref().map_or(0, |l| l.dropped_rows),
        duplicate_listing_ids: filtered.listings.as_ref().map_or(0, |idx| idx.duplicates()),
        rows_in_window: filtered.rows_in_window,
        rows_analyzed: filtered.rows.len(),
        rows_with_listing: filtered.rows_with_listing(),
        priced_rows: aggregates.summary.as_ref().map_or(0, |s| s.count),
        outputs,
    };

    log_report(&report);
    info!(output_dir = %config.output_dir.display(), "Analysis complete");
    Ok(report)
}
