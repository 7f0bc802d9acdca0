//! Synthetic listings and calendar data in the scraper's output schema.
//!
//! Useful for trying the analysis without real data. The files land under the
//! names the loader falls back to (`scraped_calendar.csv`,
//! `scraped_listings_detail.csv`).

use chrono::{DateTime, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::DateWindow;
use crate::error::{PipelineError, Result};
use crate::output::write_table;

pub const CALENDAR_FILE: &str = "scraped_calendar.csv";
pub const LISTINGS_FILE: &str = "scraped_listings_detail.csv";

const SOURCE: &str = "sample_generator";

const TITLES: &[&str] = &[
    "Apartamento aconchegante no centro de Belém",
    "Casa moderna próxima ao Ver-o-Peso",
    "Loft com vista para a Baía do Guajará",
    "Quarto privativo em Nazaré",
    "Casa completa em Icoaraci",
    "Apartamento no Umarizal",
    "Suíte confortável em Batista Campos",
    "Casa de praia em Mosqueiro",
    "Flat no Reduto",
    "Chalé rústico em Outeiro",
];

const ROOM_TYPES: &[&str] = &["Entire home/apt", "Private room", "Shared room"];

const NEIGHBOURHOODS: &[&str] = &[
    "Batista Campos",
    "Cidade Velha",
    "Icoaraci",
    "Mosqueiro",
    "Nazaré",
    "Outeiro",
    "Reduto",
    "Umarizal",
];

/// What to generate.
#[derive(Debug, Clone)]
pub struct SampleOptions {
    pub listings: usize,
    pub year: i32,
    pub location: String,
    /// Fixed seed for reproducible output; random when `None`.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleListing {
    pub id: String,
    pub name: String,
    pub room_type: String,
    pub neighbourhood_cleansed: String,
    pub location: String,
    pub price: f64,
    pub rating: f64,
    pub scraped_at: DateTime<Utc>,
    pub source: &'static str,
}

impl SampleListing {
    const HEADER: [&'static str; 9] = [
        "id",
        "name",
        "room_type",
        "neighbourhood_cleansed",
        "location",
        "price",
        "rating",
        "scraped_at",
        "source",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleCalendarRow {
    pub listing_id: String,
    pub date: NaiveDate,
    /// Formatted the way scraped prices look, e.g. `R$123.45`.
    pub price: String,
    pub available: &'static str,
}

impl SampleCalendarRow {
    const HEADER: [&'static str; 4] = ["listing_id", "date", "price", "available"];
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub listings: Vec<SampleListing>,
    pub calendar: Vec<SampleCalendarRow>,
}

fn pick<R: Rng>(rng: &mut R, items: &[&'static str]) -> &'static str {
    items[rng.gen_range(0..items.len())]
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Generates `options.listings` listings, each with one calendar row per day
/// from October 1 to November 30 of `options.year`.
pub fn generate(options: &SampleOptions) -> SampleData {
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let scraped_at = Utc::now();
    let window = DateWindow::oct_nov(options.year);

    let listings: Vec<SampleListing> = (1..=options.listings)
        .map(|i| SampleListing {
            id: format!("sample_{i}"),
            name: pick(&mut rng, TITLES).to_string(),
            room_type: pick(&mut rng, ROOM_TYPES).to_string(),
            neighbourhood_cleansed: pick(&mut rng, NEIGHBOURHOODS).to_string(),
            location: options.location.clone(),
            price: round2(rng.gen_range(80.0..400.0)),
            rating: round2(rng.gen_range(3.5..5.0)),
            scraped_at,
            source: SOURCE,
        })
        .collect();

    let calendar = listings
        .iter()
        .flat_map(|listing| window.days().map(move |date| (listing, date)))
        .map(|(listing, date)| SampleCalendarRow {
            listing_id: listing.id.clone(),
            date,
            price: format!("R${:.2}", listing.price),
            available: if rng.gen_bool(0.5) { "t" } else { "f" },
        })
        .collect();

    SampleData { listings, calendar }
}

/// Writes the generated tables into `dir`, creating it if needed.
#[tracing::instrument(skip_all, fields(dir = %dir.display()))]
pub fn write_sample(data: &SampleData, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| PipelineError::write(dir, e))?;

    let listings_path = dir.join(LISTINGS_FILE);
    write_table(&listings_path, &SampleListing::HEADER, &data.listings)?;

    let calendar_path = dir.join(CALENDAR_FILE);
    write_table(&calendar_path, &SampleCalendarRow::HEADER, &data.calendar)?;

    info!(
        listings = data.listings.len(),
        calendar_rows = data.calendar.len(),
        "Sample data written"
    );
    Ok(vec![listings_path, calendar_path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AvailabilityFlags;
    use crate::loader::{load_calendar, load_listings};
    use crate::parser::parse_price;
    use tempfile::TempDir;

    fn options(seed: u64) -> SampleOptions {
        SampleOptions {
            listings: 3,
            year: 2025,
            location: "Belém, PA".to_string(),
            seed: Some(seed),
        }
    }

    #[test]
    fn test_generate_covers_oct_nov() {
        let data = generate(&options(7));
        assert_eq!(data.listings.len(), 3);
        assert_eq!(data.calendar.len(), 3 * 61);
        assert_eq!(data.calendar[0].date, NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
        assert_eq!(data.calendar[60].date, NaiveDate::from_ymd_opt(2025, 11, 30).unwrap());
        assert_eq!(data.calendar[61].listing_id, "sample_2");
    }

    #[test]
    fn test_generated_prices_parse() {
        let data = generate(&options(11));
        for row in &data.calendar {
            let price = parse_price(&row.price).unwrap();
            assert!((80.0..=400.0).contains(&price), "{}", row.price);
            assert!(row.available == "t" || row.available == "f");
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = generate(&options(42));
        let b = generate(&options(42));
        assert_eq!(a.calendar, b.calendar);
        let prices = |d: &SampleData| d.listings.iter().map(|l| l.price).collect::<Vec<_>>();
        assert_eq!(prices(&a), prices(&b));
    }

    #[test]
    fn test_written_sample_loads() {
        let dir = TempDir::new().unwrap();
        let data = generate(&options(3));
        let written = write_sample(&data, dir.path()).unwrap();
        assert_eq!(written.len(), 2);

        let calendar = load_calendar(dir.path(), &AvailabilityFlags::default()).unwrap();
        assert_eq!(calendar.records.len(), data.calendar.len());
        assert_eq!(calendar.stats.dropped_rows, 0);
        assert_eq!(calendar.stats.missing_prices, 0);

        let listings = load_listings(dir.path()).unwrap().unwrap();
        assert_eq!(listings.listings.len(), 3);
        assert!(listings.has_room_type);
        assert!(listings.has_neighbourhood);
    }
}
