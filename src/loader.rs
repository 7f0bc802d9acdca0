//! Loads the calendar (required) and listings (optional) tables from a data
//! directory. Plain and gzip-compressed CSV are both accepted.

use csv::{ReaderBuilder, StringRecord};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::AvailabilityFlags;
use crate::error::{PipelineError, Result, RowIssue};
use crate::parser::{RawPrice, parse_date};
use crate::stats::LoadStats;

/// Calendar files tried in order. The last one is what the scraper writes.
pub const CALENDAR_CANDIDATES: &[&str] = &["calendar.csv", "calendar.csv.gz", "scraped_calendar.csv"];

/// Listings files tried in order.
pub const LISTINGS_CANDIDATES: &[&str] = &[
    "listings.csv",
    "listings.csv.gz",
    "scraped_listings_detail.csv",
];

/// One night of one listing.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarRecord {
    pub listing_id: String,
    pub date: chrono::NaiveDate,
    pub price: Option<f64>,
    pub available: Option<bool>,
}

/// Listing metadata joined onto calendar rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub id: String,
    pub room_type: Option<String>,
    pub neighbourhood: Option<String>,
}

#[derive(Debug)]
pub struct CalendarTable {
    pub source: PathBuf,
    pub records: Vec<CalendarRecord>,
    pub stats: LoadStats,
}

#[derive(Debug)]
pub struct ListingTable {
    pub source: PathBuf,
    pub listings: Vec<Listing>,
    pub has_room_type: bool,
    pub has_neighbourhood: bool,
    /// Rows skipped because their id was empty.
    pub dropped_rows: usize,
}

/// Returns the first candidate that exists as a file under `dir`.
pub fn locate(dir: &Path, candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

/// Opens a CSV file, decompressing on the fly when it ends in `.gz`.
fn open_csv(path: &Path) -> Result<csv::Reader<Box<dyn Read>>> {
    let file = File::open(path).map_err(|e| PipelineError::read(path, e))?;
    let input: Box<dyn Read> = if is_gzip(path) {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    Ok(ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input))
}

fn read_headers(rdr: &mut csv::Reader<Box<dyn Read>>, path: &Path) -> Result<Vec<String>> {
    let headers = rdr.headers().map_err(|e| PipelineError::read(path, e))?;
    Ok(headers.iter().map(|h| h.to_lowercase()).collect())
}

fn column(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn required_column(headers: &[String], name: &str, path: &Path) -> Result<usize> {
    column(headers, name).ok_or_else(|| PipelineError::MissingColumn {
        path: path.to_path_buf(),
        column: name.to_string(),
    })
}

/// `price`, then `adjusted_price`, then any header mentioning price.
fn price_column(headers: &[String]) -> Option<usize> {
    column(headers, "price")
        .or_else(|| column(headers, "adjusted_price"))
        .or_else(|| headers.iter().position(|h| h.contains("price")))
}

/// `neighbourhood_cleansed` (or a variant), then plain `neighbourhood`.
fn neighbourhood_column(headers: &[String]) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.contains("neighbourhood") && h.contains("cleansed"))
        .or_else(|| column(headers, "neighbourhood"))
}

fn non_empty(field: Option<&str>) -> Option<String> {
    field
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Reads the next record, turning decode failures into a dropped-row issue.
///
/// `Ok(None)` means end of input. I/O failures are fatal.
fn next_record(
    rdr: &mut csv::Reader<Box<dyn Read>>,
    record: &mut StringRecord,
    path: &Path,
) -> Result<Option<std::result::Result<(), RowIssue>>> {
    match rdr.read_record(record) {
        Ok(true) => Ok(Some(Ok(()))),
        Ok(false) => Ok(None),
        Err(e) if e.is_io_error() => Err(PipelineError::read(path, e)),
        Err(e) => {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            Ok(Some(Err(RowIssue::MalformedRow {
                line,
                reason: e.to_string(),
            })))
        }
    }
}

fn record_line(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

struct CalendarColumns {
    listing_id: usize,
    date: usize,
    price: Option<usize>,
    available: Option<usize>,
}

impl CalendarColumns {
    fn from_headers(headers: &[String], path: &Path) -> Result<Self> {
        let cols = Self {
            listing_id: required_column(headers, "listing_id", path)?,
            date: required_column(headers, "date", path)?,
            price: price_column(headers),
            available: column(headers, "available"),
        };
        if cols.price.is_none() {
            warn!(path = %path.display(), "Calendar has no price column, every price is missing");
        }
        if cols.available.is_none() {
            debug!(path = %path.display(), "Calendar has no available column, treating every night as available");
        }
        Ok(cols)
    }

    /// Builds a record, or explains why the row has to be dropped.
    fn parse(
        &self,
        record: &StringRecord,
        flags: &AvailabilityFlags,
        stats: &mut LoadStats,
    ) -> std::result::Result<CalendarRecord, RowIssue> {
        let line = record_line(record);

        let Some(listing_id) = non_empty(record.get(self.listing_id)) else {
            return Err(RowIssue::MalformedRow {
                line,
                reason: "empty listing_id".to_string(),
            });
        };

        let raw_date = record.get(self.date).unwrap_or("");
        let Some(date) = parse_date(raw_date) else {
            return Err(RowIssue::MalformedRow {
                line,
                reason: format!("unparseable date {raw_date:?}"),
            });
        };

        let raw_price = RawPrice::classify(self.price.and_then(|i| record.get(i)));
        let price = raw_price.canonical();
        if price.is_none() {
            stats.missing_prices += 1;
            let raw = match raw_price {
                RawPrice::Text(text) => Some(text.to_string()),
                RawPrice::Numeric(value) => Some(value.to_string()),
                RawPrice::Missing => None,
            };
            if let Some(raw) = raw {
                stats.unparseable_prices += 1;
                let issue = RowIssue::UnparseablePrice { line, raw };
                debug!(%issue, "Price normalization failed");
            }
        }

        let available = match self.available {
            Some(i) => record.get(i).and_then(|raw| flags.parse(raw)),
            None => Some(true),
        };

        Ok(CalendarRecord {
            listing_id,
            date,
            price,
            available,
        })
    }
}

/// Loads the calendar table from `dir`.
///
/// # Errors
///
/// [`PipelineError::MissingRequiredFile`] when no calendar file exists,
/// [`PipelineError::MissingColumn`] when `listing_id` or `date` is absent, and
/// [`PipelineError::Read`] on I/O failures. Malformed rows are dropped and
/// counted instead.
#[tracing::instrument(skip_all, fields(dir = %dir.display()))]
pub fn load_calendar(dir: &Path, flags: &AvailabilityFlags) -> Result<CalendarTable> {
    let path = locate(dir, CALENDAR_CANDIDATES).ok_or_else(|| PipelineError::MissingRequiredFile {
        dir: dir.to_path_buf(),
        candidates: CALENDAR_CANDIDATES.join(", "),
    })?;
    debug!(path = %path.display(), "Reading calendar");

    let mut rdr = open_csv(&path)?;
    let headers = read_headers(&mut rdr, &path)?;
    let columns = CalendarColumns::from_headers(&headers, &path)?;

    let mut stats = LoadStats::default();
    let mut records = Vec::new();
    let mut record = StringRecord::new();

    while let Some(read) = next_record(&mut rdr, &mut record, &path)? {
        stats.rows_read += 1;
        match read.and_then(|()| columns.parse(&record, flags, &mut stats)) {
            Ok(parsed) => records.push(parsed),
            Err(issue) => {
                stats.dropped_rows += 1;
                debug!(%issue, "Dropping calendar row");
            }
        }
    }

    if stats.dropped_rows > 0 {
        warn!(dropped = stats.dropped_rows, "Malformed calendar rows dropped");
    }
    if stats.unparseable_prices > 0 {
        warn!(
            unparseable = stats.unparseable_prices,
            "Calendar prices could not be normalized and were treated as missing"
        );
    }
    info!(
        path = %path.display(),
        rows = records.len(),
        dropped = stats.dropped_rows,
        missing_prices = stats.missing_prices,
        "Calendar loaded"
    );

    Ok(CalendarTable {
        source: path,
        records,
        stats,
    })
}

/// Loads the optional listings table from `dir`.
///
/// Returns `Ok(None)` when no listings file exists or when it has no `id`
/// column; neither case is an error.
#[tracing::instrument(skip_all, fields(dir = %dir.display()))]
pub fn load_listings(dir: &Path) -> Result<Option<ListingTable>> {
    let Some(path) = locate(dir, LISTINGS_CANDIDATES) else {
        info!("No listings file found, room type and neighbourhood splits will be skipped");
        return Ok(None);
    };

    let mut rdr = open_csv(&path)?;
    let headers = read_headers(&mut rdr, &path)?;

    let Some(id_col) = column(&headers, "id") else {
        warn!(path = %path.display(), "Listings file has no id column, ignoring it");
        return Ok(None);
    };
    let room_type_col = column(&headers, "room_type");
    let neighbourhood_col = neighbourhood_column(&headers);

    let mut listings = Vec::new();
    let mut dropped_rows = 0;
    let mut record = StringRecord::new();

    while let Some(read) = next_record(&mut rdr, &mut record, &path)? {
        if let Err(issue) = read {
            dropped_rows += 1;
            debug!(%issue, "Dropping listings row");
            continue;
        }
        let Some(id) = non_empty(record.get(id_col)) else {
            dropped_rows += 1;
            debug!(line = record_line(&record), "Dropping listings row without id");
            continue;
        };
        listings.push(Listing {
            id,
            room_type: room_type_col.and_then(|i| non_empty(record.get(i))),
            neighbourhood: neighbourhood_col.and_then(|i| non_empty(record.get(i))),
        });
    }

    info!(
        path = %path.display(),
        listings = listings.len(),
        dropped = dropped_rows,
        has_room_type = room_type_col.is_some(),
        has_neighbourhood = neighbourhood_col.is_some(),
        "Listings loaded"
    );

    Ok(Some(ListingTable {
        source: path,
        listings,
        has_room_type: room_type_col.is_some(),
        has_neighbourhood: neighbourhood_col.is_some(),
        dropped_rows,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_missing_calendar_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = load_calendar(dir.path(), &AvailabilityFlags::default()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingRequiredFile { .. }));
    }

    #[test]
    fn test_missing_date_column_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "calendar.csv", "listing_id,price\n1,R$10\n");
        let err = load_calendar(dir.path(), &AvailabilityFlags::default()).unwrap_err();
        match err {
            PipelineError::MissingColumn { column, .. } => assert_eq!(column, "date"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_calendar_parses_fields() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "calendar.csv",
            "listing_id,date,price,available\n\
             1,2025-10-01,R$120.00,t\n\
             1,2025-10-02,\"$1.234,56\",f\n\
             2,2025-10-03,,x\n",
        );

        let table = load_calendar(dir.path(), &AvailabilityFlags::default()).unwrap();
        assert_eq!(table.records.len(), 3);
        assert_eq!(
            table.records[0],
            CalendarRecord {
                listing_id: "1".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
                price: Some(120.0),
                available: Some(true),
            }
        );
        assert_eq!(table.records[1].price, Some(1234.56));
        assert_eq!(table.records[1].available, Some(false));
        assert_eq!(table.records[2].price, None);
        assert_eq!(table.records[2].available, None);
        assert_eq!(table.stats.missing_prices, 1);
        assert_eq!(table.stats.unparseable_prices, 0);
    }

    #[test]
    fn test_malformed_rows_are_dropped_and_counted() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "calendar.csv",
            "listing_id,date,price,available\n\
             1,2025-10-01,100,t\n\
             1,10/02/2025,100,t\n\
             ,2025-10-03,100,t\n\
             1,2025-10-04,abc,t\n",
        );

        let table = load_calendar(dir.path(), &AvailabilityFlags::default()).unwrap();
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.stats.rows_read, 4);
        assert_eq!(table.stats.dropped_rows, 2);
        assert_eq!(table.stats.missing_prices, 1);
        assert_eq!(table.stats.unparseable_prices, 1);
    }

    #[test]
    fn test_adjusted_price_fallback_and_no_available_column() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "calendar.csv",
            "listing_id,date,adjusted_price\n7,2025-10-01,\"R$ 99,90\"\n",
        );

        let table = load_calendar(dir.path(), &AvailabilityFlags::default()).unwrap();
        assert_eq!(table.records[0].price, Some(99.9));
        assert_eq!(table.records[0].available, Some(true));
    }

    #[test]
    fn test_gzip_calendar() {
        let dir = TempDir::new().unwrap();
        let file = File::create(dir.path().join("calendar.csv.gz")).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(b"listing_id,date,price,available\n1,2025-10-01,R$50.00,t\n")
            .unwrap();
        encoder.finish().unwrap();

        let table = load_calendar(dir.path(), &AvailabilityFlags::default()).unwrap();
        assert!(table.source.ends_with("calendar.csv.gz"));
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].price, Some(50.0));
    }

    #[test]
    fn test_gzip_listings() {
        let dir = TempDir::new().unwrap();
        let file = File::create(dir.path().join("listings.csv.gz")).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(
                "id,room_type,neighbourhood_cleansed\n\
                 1,Private room,Nazaré\n\
                 2,Entire home/apt,Reduto\n"
                    .as_bytes(),
            )
            .unwrap();
        encoder.finish().unwrap();

        let table = load_listings(dir.path()).unwrap().unwrap();
        assert!(table.source.ends_with("listings.csv.gz"));
        assert!(table.has_room_type);
        assert!(table.has_neighbourhood);
        assert_eq!(table.listings.len(), 2);
        assert_eq!(table.listings[0].room_type.as_deref(), Some("Private room"));
        assert_eq!(table.listings[1].neighbourhood.as_deref(), Some("Reduto"));
    }

    #[test]
    fn test_plain_calendar_preferred_over_scraped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "scraped_calendar.csv", "listing_id,date,price\n9,2025-10-01,1\n");
        write(dir.path(), "calendar.csv", "listing_id,date,price\n1,2025-10-01,1\n");

        let table = load_calendar(dir.path(), &AvailabilityFlags::default()).unwrap();
        assert!(table.source.ends_with("calendar.csv"));
        assert_eq!(table.records[0].listing_id, "1");
    }

    #[test]
    fn test_absent_listings_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(load_listings(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_listings_columns() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "listings.csv",
            "id,name,room_type,neighbourhood_cleansed,extra\n\
             1,A,Entire home/apt,Nazaré,x\n\
             2,B,,Umarizal,y\n\
             ,C,Private room,Reduto,z\n",
        );

        let table = load_listings(dir.path()).unwrap().unwrap();
        assert!(table.has_room_type);
        assert!(table.has_neighbourhood);
        assert_eq!(table.dropped_rows, 1);
        assert_eq!(
            table.listings,
            vec![
                Listing {
                    id: "1".to_string(),
                    room_type: Some("Entire home/apt".to_string()),
                    neighbourhood: Some("Nazaré".to_string()),
                },
                Listing {
                    id: "2".to_string(),
                    room_type: None,
                    neighbourhood: Some("Umarizal".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_listings_without_id_column_are_ignored() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "listings.csv", "listing,room_type\n1,Private room\n");
        assert!(load_listings(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_listings_without_optional_columns() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "listings.csv", "id,name\n1,A\n");
        let table = load_listings(dir.path()).unwrap().unwrap();
        assert!(!table.has_room_type);
        assert!(!table.has_neighbourhood);
        assert_eq!(table.listings[0].room_type, None);
    }
}
