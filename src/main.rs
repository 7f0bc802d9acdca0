//! CLI entry point for the rental price analysis tool.
//!
//! Provides subcommands for analyzing a calendar/listings dataset over a date
//! window and for generating synthetic sample data in the same schema.

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{ArgAction, Parser, Subcommand};
use rental_price_analysis::{
    config::{AnalysisConfig, AvailabilityFlags, DateWindow},
    output::{print_json, print_pretty},
    pipeline,
    sample::{SampleOptions, generate, write_sample},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "rental_price_analysis")]
#[command(about = "Price statistics for short-term rental calendars", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute price statistics and charts for a date window
    Analyze {
        /// Folder with calendar/listings CSVs (plain or .gz)
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Folder to write CSV outputs and charts to
        #[arg(short, long, default_value = "./output")]
        output_dir: PathBuf,

        /// Start date YYYY-MM-DD (defaults to Oct 1 of the current year)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End date YYYY-MM-DD (defaults to Nov 30 of the current year)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Only count nights whose availability flag matches the truthy encoding
        #[arg(long, default_value_t = false)]
        only_booked: bool,

        /// Write the per-room-type split when listings data allows it
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        room_type_split: bool,

        /// Write the per-neighbourhood split when listings data allows it
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        neighbourhood_split: bool,

        /// Raw `available` values read as true
        #[arg(long, value_delimiter = ',', default_value = "t,true,1")]
        available_values: Vec<String>,

        /// Raw `available` values read as false
        #[arg(long, value_delimiter = ',', default_value = "f,false,0")]
        unavailable_values: Vec<String>,

        /// Print the run report as JSON on stdout
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Generate synthetic listings and calendar data
    GenerateSample {
        /// Folder to write the sample CSVs to
        #[arg(short, long, default_value = "./data")]
        output_dir: PathBuf,

        /// Number of listings to generate
        #[arg(short, long, default_value_t = 20)]
        listings: usize,

        /// Year of the October to November calendar (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Seed for reproducible output
        #[arg(short, long)]
        seed: Option<u64>,

        /// Location label stored with each listing
        #[arg(long, default_value = "Belém, PA")]
        location: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/rental_price_analysis.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("rental_price_analysis.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            data_dir,
            output_dir,
            start,
            end,
            only_booked,
            room_type_split,
            neighbourhood_split,
            available_values,
            unavailable_values,
            json,
        } => {
            let window = DateWindow::resolve(start, end)?;
            let config = AnalysisConfig {
                data_dir,
                output_dir,
                window,
                only_booked,
                room_type_split,
                neighbourhood_split,
                availability: AvailabilityFlags {
                    truthy: available_values,
                    falsy: unavailable_values,
                },
            };
            info!(
                data_dir = %config.data_dir.display(),
                start = %window.start(),
                end = %window.end(),
                only_booked,
                "Starting analysis"
            );

            let report = pipeline::run(&config).with_context(|| {
                format!("analysis of {} failed", config.data_dir.display())
            })?;

            print_pretty(&report);
            if json {
                print_json(&report)?;
            }
        }
        Commands::GenerateSample {
            output_dir,
            listings,
            year,
            seed,
            location,
        } => {
            let options = SampleOptions {
                listings,
                year: year.unwrap_or_else(|| Local::now().year()),
                location,
                seed,
            };
            let data = generate(&options);
            let written = write_sample(&data, &output_dir)?;

            for path in &written {
                info!(path = %path.display(), "Wrote sample file");
            }
            info!(
                data_dir = %output_dir.display(),
                "Run `analyze --data-dir {}` to analyze the sample",
                output_dir.display()
            );
        }
    }

    Ok(())
}
