//! Output formatting and persistence for aggregate views.
//!
//! Writes each view as a CSV table under the output directory, renders the
//! charts, and logs the run report.

use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::Aggregates;
use crate::charts;
use crate::error::{PipelineError, Result};
use crate::filter::FilteredTable;
use crate::stats::RunReport;

pub const SUMMARY_FILE: &str = "prices_summary.csv";
pub const DAILY_FILE: &str = "daily_avg_price.csv";
pub const LISTING_FILE: &str = "listing_avg_price_oct_nov.csv";
pub const ROOM_TYPE_FILE: &str = "price_roomtype.csv";
pub const NEIGHBOURHOOD_FILE: &str = "price_neighbourhood.csv";
pub const CHARTS_DIR: &str = "charts";
pub const DAILY_CHART_FILE: &str = "daily_avg_price.png";
pub const BOX_CHART_FILE: &str = "price_box_oct_nov.png";

const STAT_COLUMNS: [&str; 5] = ["mean", "median", "p25", "p75", "count"];

fn header(keys: &[&'static str]) -> Vec<&'static str> {
    keys.iter().copied().chain(STAT_COLUMNS).collect()
}

/// Logs the run report using Rust's debug pretty-print format.
pub fn print_pretty(report: &RunReport) {
    debug!("{:#?}", report);
}

/// Prints the run report as pretty JSON on stdout.
pub fn print_json(report: &RunReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Logs the data-quality summary that accompanies a successful run.
pub fn log_report(report: &RunReport) {
    info!(
        rows_read = report.calendar.rows_read,
        dropped_rows = report.calendar.dropped_rows,
        dropped_pct = report.dropped_pct(),
        missing_prices = report.calendar.missing_prices,
        missing_price_pct = report.missing_price_pct(),
        unparseable_prices = report.calendar.unparseable_prices,
        rows_in_window = report.rows_in_window,
        rows_analyzed = report.rows_analyzed,
        priced_rows = report.priced_rows,
        duplicate_listing_ids = report.duplicate_listing_ids,
        join_match_pct = report.join_match_pct(),
        outputs = report.outputs.len(),
        "Run summary"
    );
}

/// Writes `rows` to a fresh CSV file at `path`, header first.
///
/// The header is written even when `rows` is empty.
pub fn write_table<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing CSV table");

    let file = File::create(path).map_err(|e| PipelineError::write(path, e))?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    writer
        .write_record(header)
        .map_err(|e| PipelineError::write(path, e))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| PipelineError::write(path, e))?;
    }
    writer.flush().map_err(|e| PipelineError::write(path, e))?;

    Ok(())
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| PipelineError::write(path, e))
}

/// Writes every aggregate table and both charts under `output_dir`.
///
/// Returns the written paths in order. The first failure aborts the export;
/// files written before it stay on disk.
#[tracing::instrument(skip_all, fields(output_dir = %output_dir.display()))]
pub fn export(
    aggregates: &Aggregates,
    table: &FilteredTable<'_>,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let charts_dir = output_dir.join(CHARTS_DIR);
    create_dir(output_dir)?;
    create_dir(&charts_dir)?;

    let mut written = Vec::new();

    let path = output_dir.join(SUMMARY_FILE);
    let summary: Vec<_> = aggregates.summary.iter().collect();
    write_table(
        &path,
        &header(&["period_start", "period_end", "listings_active"]),
        &summary,
    )?;
    written.push(path);

    let path = output_dir.join(DAILY_FILE);
    write_table(&path, &header(&["date"]), &aggregates.daily)?;
    written.push(path);

    let path = output_dir.join(LISTING_FILE);
    write_table(&path, &header(&["listing_id"]), &aggregates.per_listing)?;
    written.push(path);

    if let Some(rows) = &aggregates.room_type {
        let path = output_dir.join(ROOM_TYPE_FILE);
        write_table(&path, &header(&["room_type", "listings"]), rows)?;
        written.push(path);
    }

    if let Some(rows) = &aggregates.neighbourhood {
        let path = output_dir.join(NEIGHBOURHOOD_FILE);
        write_table(&path, &header(&["neighbourhood", "listings"]), rows)?;
        written.push(path);
    }

    let path = charts_dir.join(DAILY_CHART_FILE);
    charts::daily_line(&path, &aggregates.daily, table.window)
        .map_err(|e| PipelineError::write(&path, e))?;
    written.push(path);

    let path = charts_dir.join(BOX_CHART_FILE);
    charts::price_boxplot(&path, table).map_err(|e| PipelineError::write(&path, e))?;
    written.push(path);

    info!(files = written.len(), "Outputs written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::{DailyRow, SegmentRow};
    use crate::stats::RunReport;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_print_pretty_does_not_panic() {
        let report = RunReport::default();
        print_pretty(&report);
    }

    #[test]
    fn test_print_json_does_not_panic() {
        let report = RunReport::default();
        print_json(&report).unwrap();
    }

    #[test]
    fn test_write_table_empty_has_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        let rows: Vec<DailyRow> = Vec::new();

        write_table(&path, &header(&["date"]), &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "date,mean,median,p25,p75,count\n");
    }

    #[test]
    fn test_write_table_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("daily.csv");
        let rows = vec![DailyRow {
            date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            mean: 120.0,
            median: 120.0,
            p25: 110.5,
            p75: 130.0,
            count: 2,
        }];

        write_table(&path, &header(&["date"]), &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "2025-10-01,120.0,120.0,110.5,130.0,2");
    }

    #[test]
    fn test_segment_header_names_the_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rooms.csv");
        let rows = vec![SegmentRow {
            segment: "Private room".to_string(),
            listings: 3,
            mean: 80.0,
            median: 80.0,
            p25: 80.0,
            p75: 80.0,
            count: 9,
        }];

        write_table(&path, &header(&["room_type", "listings"]), &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("room_type,listings,mean,median,p25,p75,count\n"));
        assert!(content.contains("Private room,3,80.0,80.0,80.0,80.0,9"));
    }

    #[test]
    fn test_write_table_into_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let rows: Vec<DailyRow> = Vec::new();

        let err = write_table(&path, &header(&["date"]), &rows).unwrap_err();
        assert!(matches!(err, PipelineError::OutputWrite { .. }));
    }
}
