use chrono::NaiveDate;
use thiserror::Error;

use crate::data::model::Column;

// ---------------------------------------------------------------------------
// Core error type
// ---------------------------------------------------------------------------

/// Errors raised by the pure filter / aggregate / bin pipeline.
///
/// I/O and parsing failures are not represented here: the loader reports
/// those through `anyhow` with file and row context.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("row {row}: {column} value {value} falls outside every bin")]
    OutOfRange {
        row: usize,
        column: String,
        value: f64,
    },

    #[error("invalid bin specification: {0}")]
    InvalidBinSpec(String),

    #[error("invalid derived column: {0}")]
    InvalidDerivedColumn(String),

    #[error("column '{}' is not numeric", .0.source_name())]
    NonNumericColumn(Column),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
