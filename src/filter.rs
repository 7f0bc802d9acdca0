//! Restricts calendar rows to a date window and left-joins listing metadata.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, info, warn};

use crate::config::DateWindow;
use crate::loader::{CalendarRecord, Listing, ListingTable};

/// Listings keyed by id. The first listing seen for an id wins.
#[derive(Debug)]
pub struct ListingIndex<'a> {
    table: &'a ListingTable,
    by_id: HashMap<&'a str, &'a Listing>,
    duplicates: usize,
}

impl<'a> ListingIndex<'a> {
    pub fn build(table: &'a ListingTable) -> Self {
        let mut by_id = HashMap::with_capacity(table.listings.len());
        let mut duplicates = 0;

        for listing in &table.listings {
            match by_id.entry(listing.id.as_str()) {
                Entry::Vacant(slot) => {
                    slot.insert(listing);
                }
                Entry::Occupied(_) => {
                    duplicates += 1;
                    debug!(listing_id = %listing.id, "Duplicate listing id, keeping first");
                }
            }
        }

        if duplicates > 0 {
            warn!(duplicates, "Listings file contains duplicate ids, first occurrence kept");
        }

        Self {
            table,
            by_id,
            duplicates,
        }
    }

    pub fn get(&self, id: &str) -> Option<&'a Listing> {
        self.by_id.get(id).copied()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn has_room_type(&self) -> bool {
        self.table.has_room_type
    }

    pub fn has_neighbourhood(&self) -> bool {
        self.table.has_neighbourhood
    }
}

/// A calendar row with its (possibly absent) listing metadata.
#[derive(Debug, Clone, Copy)]
pub struct JoinedRow<'a> {
    pub record: &'a CalendarRecord,
    pub listing: Option<&'a Listing>,
}

impl<'a> JoinedRow<'a> {
    pub fn room_type(&self) -> Option<&'a str> {
        self.listing.and_then(|l| l.room_type.as_deref())
    }

    pub fn neighbourhood(&self) -> Option<&'a str> {
        self.listing.and_then(|l| l.neighbourhood.as_deref())
    }
}

/// Output of [`filter_and_join`].
#[derive(Debug)]
pub struct FilteredTable<'a> {
    pub window: DateWindow,
    pub rows: Vec<JoinedRow<'a>>,
    /// Rows inside the window, before `only_booked` is applied.
    pub rows_in_window: usize,
    /// `None` when no listings table was loaded.
    pub listings: Option<ListingIndex<'a>>,
}

impl FilteredTable<'_> {
    pub fn rows_with_listing(&self) -> usize {
        self.rows.iter().filter(|r| r.listing.is_some()).count()
    }
}

/// Keeps rows with `window.start() <= date <= window.end()`.
///
/// With `only_booked`, only rows whose availability is known to be true are
/// kept; unknown availability is excluded.
pub fn filter_window<'a>(
    records: &'a [CalendarRecord],
    window: &DateWindow,
    only_booked: bool,
) -> (Vec<&'a CalendarRecord>, usize) {
    let in_window: Vec<&CalendarRecord> = records.iter().filter(|r| window.contains(r.date)).collect();
    let rows_in_window = in_window.len();

    let kept = if only_booked {
        in_window
            .into_iter()
            .filter(|r| r.available == Some(true))
            .collect()
    } else {
        in_window
    };

    (kept, rows_in_window)
}

/// Left-joins listing metadata onto `rows`. Never drops or duplicates rows.
pub fn left_join<'a>(
    rows: Vec<&'a CalendarRecord>,
    listings: Option<&ListingIndex<'a>>,
) -> Vec<JoinedRow<'a>> {
    rows.into_iter()
        .map(|record| JoinedRow {
            record,
            listing: listings.and_then(|idx| idx.get(&record.listing_id)),
        })
        .collect()
}

/// Applies the date window and `only_booked`, then joins listings if present.
#[tracing::instrument(skip_all, fields(start = %window.start(), end = %window.end(), only_booked = only_booked))]
pub fn filter_and_join<'a>(
    records: &'a [CalendarRecord],
    window: DateWindow,
    only_booked: bool,
    listings: Option<&'a ListingTable>,
) -> FilteredTable<'a> {
    let (kept, rows_in_window) = filter_window(records, &window, only_booked);
    let index = listings.map(ListingIndex::build);
    let rows = left_join(kept, index.as_ref());

    info!(
        rows_in_window,
        rows_kept = rows.len(),
        listings_present = index.is_some(),
        "Calendar filtered"
    );

    FilteredTable {
        window,
        rows,
        rows_in_window,
        listings: index,
    }
}
