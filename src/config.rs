//! Run configuration: the date window, the availability flag encoding and the
//! full set of analysis options.

use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use std::path::PathBuf;

use crate::error::{PipelineError, Result};

/// An inclusive calendar date range. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(PipelineError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// October 1 to November 30 of `year`.
    pub fn oct_nov(year: i32) -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(year, 10, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(year, 11, 30).unwrap_or(NaiveDate::MAX),
        }
    }

    /// Builds a window from optional bounds, filling whichever is absent from
    /// the October to November window of the current year.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        let default = Self::oct_nov(Local::now().year());
        Self::new(start.unwrap_or(default.start), end.unwrap_or(default.end))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days in the window, both ends included.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Every date in the window, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Raw encodings of the `available` column.
///
/// Matching is case-insensitive on trimmed values; anything that matches
/// neither list is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityFlags {
    pub truthy: Vec<String>,
    pub falsy: Vec<String>,
}

impl Default for AvailabilityFlags {
    fn default() -> Self {
        Self {
            truthy: vec!["t".into(), "true".into(), "1".into()],
            falsy: vec!["f".into(), "false".into(), "0".into()],
        }
    }
}

impl AvailabilityFlags {
    pub fn parse(&self, raw: &str) -> Option<bool> {
        let raw = raw.trim();
        if self.truthy.iter().any(|t| t.eq_ignore_ascii_case(raw)) {
            Some(true)
        } else if self.falsy.iter().any(|f| f.eq_ignore_ascii_case(raw)) {
            Some(false)
        } else {
            None
        }
    }
}

/// Everything a single analysis run needs.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub window: DateWindow,
    pub only_booked: bool,
    pub room_type_split: bool,
    pub neighbourhood_split: bool,
    pub availability: AvailabilityFlags,
}

impl AnalysisConfig {
    /// A config with every split enabled and the default flag encoding.
    pub fn new(data_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, window: DateWindow) -> Self {
        Self {
            data_dir: data_dir.into(),
            output_dir: output_dir.into(),
            window,
            only_booked: false,
            room_type_split: true,
            neighbourhood_split: true,
            availability: AvailabilityFlags::default(),
        }
    }
}
