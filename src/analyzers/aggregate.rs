use crate::analyzers::types::{
    Aggregates, DailyRow, ListingRow, PriceStats, SegmentRow, SummaryRow,
};
use crate::filter::{FilteredTable, JoinedRow};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Which categorical splits the caller wants. A split is only produced when
/// it is requested *and* the listings data can support it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitOptions {
    pub room_type: bool,
    pub neighbourhood: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            room_type: true,
            neighbourhood: true,
        }
    }
}

#[derive(Default)]
struct Group<'a> {
    prices: Vec<f64>,
    listings: BTreeSet<&'a str>,
}

/// Groups rows by `key`, collecting non-missing prices. Rows whose key is
/// `None` are skipped.
fn group_by<'a, K, F>(rows: &[JoinedRow<'a>], key: F) -> BTreeMap<K, Group<'a>>
where
    K: Ord,
    F: Fn(&JoinedRow<'a>) -> Option<K>,
{
    let mut groups: BTreeMap<K, Group<'a>> = BTreeMap::new();
    for row in rows {
        let Some(k) = key(row) else {
            continue;
        };
        let group = groups.entry(k).or_default();
        group.listings.insert(row.record.listing_id.as_str());
        if let Some(price) = row.record.price {
            group.prices.push(price);
        }
    }
    groups
}

fn summarize(table: &FilteredTable<'_>) -> Option<SummaryRow> {
    let prices: Vec<f64> = table.rows.iter().filter_map(|r| r.record.price).collect();
    let listings_active = table
        .rows
        .iter()
        .filter(|r| r.record.price.is_some())
        .map(|r| r.record.listing_id.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    let stats = PriceStats::from_prices(prices)?;
    Some(SummaryRow {
        period_start: table.window.start(),
        period_end: table.window.end(),
        listings_active,
        mean: stats.mean,
        median: stats.median,
        p25: stats.p25,
        p75: stats.p75,
        count: stats.count,
    })
}

/// One row per window day with at least one price, in date order.
fn daily(table: &FilteredTable<'_>) -> Vec<DailyRow> {
    let mut by_date = group_by(&table.rows, |r| Some(r.record.date));

    table
        .window
        .days()
        .filter_map(|date| {
            let group = by_date.remove(&date)?;
            let stats = PriceStats::from_prices(group.prices)?;
            Some(DailyRow {
                date,
                mean: stats.mean,
                median: stats.median,
                p25: stats.p25,
                p75: stats.p75,
                count: stats.count,
            })
        })
        .collect()
}

/// One row per listing with at least one price, ordered by listing id.
fn per_listing(table: &FilteredTable<'_>) -> Vec<ListingRow> {
    group_by(&table.rows, |r| Some(r.record.listing_id.as_str()))
        .into_iter()
        .filter_map(|(listing_id, group)| {
            let stats = PriceStats::from_prices(group.prices)?;
            Some(ListingRow {
                listing_id: listing_id.to_string(),
                mean: stats.mean,
                median: stats.median,
                p25: stats.p25,
                p75: stats.p75,
                count: stats.count,
            })
        })
        .collect()
}

/// Segment rows ordered by distinct listings (descending), then by name.
fn by_segment<'a, F>(rows: &[JoinedRow<'a>], key: F) -> Vec<SegmentRow>
where
    F: Fn(&JoinedRow<'a>) -> Option<&'a str>,
{
    let mut segments: Vec<SegmentRow> = group_by(rows, key)
        .into_iter()
        .filter_map(|(segment, group)| {
            let listings = group.listings.len();
            let stats = PriceStats::from_prices(group.prices)?;
            Some(SegmentRow {
                segment: segment.to_string(),
                listings,
                mean: stats.mean,
                median: stats.median,
                p25: stats.p25,
                p75: stats.p75,
                count: stats.count,
            })
        })
        .collect();

    segments.sort_by(|a, b| b.listings.cmp(&a.listings).then_with(|| a.segment.cmp(&b.segment)));
    segments
}

/// Computes every aggregate view over the filtered table.
///
/// Room type and neighbourhood views are `None` unless listings were loaded,
/// the relevant column exists, and the split is enabled in `splits`.
#[tracing::instrument(skip_all, fields(rows = table.rows.len()))]
pub fn aggregate(table: &FilteredTable<'_>, splits: SplitOptions) -> Aggregates {
    let room_type = table
        .listings
        .as_ref()
        .filter(|idx| splits.room_type && idx.has_room_type())
        .map(|_| by_segment(&table.rows, |r| r.room_type()));

    let neighbourhood = table
        .listings
        .as_ref()
        .filter(|idx| splits.neighbourhood && idx.has_neighbourhood())
        .map(|_| by_segment(&table.rows, |r| r.neighbourhood()));

    if room_type.is_none() {
        debug!("Room type split skipped");
    }
    if neighbourhood.is_none() {
        debug!("Neighbourhood split skipped");
    }

    let aggregates = Aggregates {
        summary: summarize(table),
        daily: daily(table),
        per_listing: per_listing(table),
        room_type,
        neighbourhood,
    };

    info!(
        priced_rows = aggregates.summary.as_ref().map_or(0, |s| s.count),
        days = aggregates.daily.len(),
        listings = aggregates.per_listing.len(),
        room_types = aggregates.room_type.as_ref().map(Vec::len),
        neighbourhoods = aggregates.neighbourhood.as_ref().map(Vec::len),
        "Aggregation complete"
    );

    aggregates
}
