//! Error types for the analysis pipeline.
//!
//! [`PipelineError`] covers file- and directory-level failures, which abort a
//! run. [`RowIssue`] covers row-level problems, which are logged and counted
//! but never propagated.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed error used where the underlying cause comes from several crates
/// (csv, io, plotters).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fatal errors produced by the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// None of the candidate files for a required input exist.
    #[error("required input not found in {dir}: expected one of {candidates}")]
    MissingRequiredFile { dir: PathBuf, candidates: String },

    /// A required column is absent from an input file header.
    #[error("{path} has no `{column}` column")]
    MissingColumn { path: PathBuf, column: String },

    /// The requested window ends before it starts.
    #[error("invalid date window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    /// An input file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// An output directory or file could not be created or written.
    #[error("failed to write {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

impl PipelineError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        PipelineError::Read {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        PipelineError::OutputWrite {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Recoverable, row-level problems found while loading input files.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowIssue {
    /// The row was dropped.
    #[error("line {line}: malformed row dropped ({reason})")]
    MalformedRow { line: u64, reason: String },

    /// The price was kept as missing.
    #[error("line {line}: unparseable price {raw:?} treated as missing")]
    UnparseablePrice { line: u64, raw: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_missing_required_file() {
        let err = PipelineError::MissingRequiredFile {
            dir: PathBuf::from("/data"),
            candidates: "calendar.csv, calendar.csv.gz".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/data"));
        assert!(msg.contains("calendar.csv.gz"));
    }

    #[test]
    fn test_error_display_invalid_window() {
        let err = PipelineError::InvalidWindow {
            start: NaiveDate::from_ymd_opt(2025, 11, 30).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "invalid date window: start 2025-11-30 is after end 2025-10-01"
        );
    }

    #[test]
    fn test_output_write_keeps_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = PipelineError::write("/readonly/out.csv", io_err);
        let msg = err.to_string();
        assert!(msg.contains("/readonly/out.csv"));
        assert!(msg.contains("denied"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_row_issue_display() {
        let issue = RowIssue::UnparseablePrice {
            line: 7,
            raw: "abc".to_string(),
        };
        assert_eq!(
            issue.to_string(),
            "line 7: unparseable price \"abc\" treated as missing"
        );
    }
}
