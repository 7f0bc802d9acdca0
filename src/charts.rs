//! PNG charts rendered from the aggregate views.
//!
//! Only the bitmap backend is compiled in, without a font backend. Plotters
//! panics when asked to rasterize text in that configuration, so the charts
//! have no caption and no label areas: mesh, series and boxes only. Titles go
//! to the log instead.

use chrono::Datelike;
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

use crate::analyzers::DailyRow;
use crate::config::DateWindow;
use crate::error::BoxError;
use crate::filter::FilteredTable;

const SIZE: (u32, u32) = (1200, 600);

/// Vertical range covering `values` with a small margin.
fn value_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    if lo == hi {
        return (lo - 1.0).max(0.0)..hi + 1.0;
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad).max(0.0)..hi + pad
}

/// Line chart of the per-day mean price across the window.
pub fn daily_line(path: &Path, daily: &[DailyRow], window: DateWindow) -> Result<(), BoxError> {
    let root = BitMapBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let start = window.start();
    let offset = |row: &DailyRow| (row.date - start).num_days() as i32;
    let last_day = (window.num_days() as i32 - 1).max(1);
    let y_range = value_range(daily.iter().map(|r| r.mean));

    debug!(
        path = %path.display(),
        points = daily.len(),
        "Daily Average Price ({} to {})",
        window.start(),
        window.end()
    );

    // No label areas: a zero-sized area is never handed a label to draw.
    let mut chart = ChartBuilder::on(&root)
        .margin(15)
        .build_cartesian_2d(0i32..last_day, y_range)?;

    chart.configure_mesh().draw()?;

    chart.draw_series(LineSeries::new(
        daily.iter().map(|row| (offset(row), row.mean)),
        &BLUE,
    ))?;
    chart.draw_series(
        daily
            .iter()
            .map(|row| Circle::new((offset(row), row.mean), 3, BLUE.filled())),
    )?;

    root.present()?;
    Ok(())
}

/// Price groups for the boxplot: by room type when listings provide one,
/// otherwise by calendar month.
fn box_groups(table: &FilteredTable<'_>) -> BTreeMap<String, Vec<f64>> {
    let by_room_type = table
        .listings
        .as_ref()
        .is_some_and(|idx| idx.has_room_type())
        && table.rows.iter().any(|r| r.room_type().is_some());

    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in &table.rows {
        let Some(price) = row.record.price else {
            continue;
        };
        let key = if by_room_type {
            match row.room_type() {
                Some(room_type) => room_type.to_string(),
                None => continue,
            }
        } else {
            format!("{}-{:02}", row.record.date.year(), row.record.date.month())
        };
        groups.entry(key).or_default().push(price);
    }
    groups
}

/// Boxplot of the price distribution in the filtered window.
pub fn price_boxplot(path: &Path, table: &FilteredTable<'_>) -> Result<(), BoxError> {
    let root = BitMapBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let groups = box_groups(table);
    debug!(
        path = %path.display(),
        groups = groups.len(),
        "Price Distribution ({} to {})",
        table.window.start(),
        table.window.end()
    );
    if groups.is_empty() {
        root.present()?;
        return Ok(());
    }

    let labels: Vec<String> = groups.keys().cloned().collect();
    let quartiles: Vec<Quartiles> = groups.values().map(|prices| Quartiles::new(prices.as_slice())).collect();

    let y = value_range(quartiles.iter().flat_map(|q| q.values()).map(f64::from));
    let y_range = y.start as f32..y.end as f32;

    let mut chart = ChartBuilder::on(&root)
        .margin(15)
        .build_cartesian_2d(labels[..].into_segmented(), y_range)?;

    chart.configure_mesh().draw()?;

    chart.draw_series(
        labels
            .iter()
            .zip(quartiles.iter())
            .map(|(label, q)| Boxplot::new_vertical(SegmentValue::CenterOf(label), q)),
    )?;

    root.present()?;
    Ok(())
}
