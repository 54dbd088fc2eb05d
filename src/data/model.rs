use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// CellValue – a single cell, used as a group key
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
/// Group keys end up in a `BTreeMap`, so `CellValue` must be `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
}

// -- Manual Eq/Ord so floats can be grouped (total order) --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Integer(_) => 0,
                Float(_) => 1,
                Date(_) => 2,
            }
        }
        match (self, other) {
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

// ---------------------------------------------------------------------------
// Column – the fixed schema
// ---------------------------------------------------------------------------

/// Addressable columns of the rental table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Column {
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "season")]
    Season,
    #[serde(rename = "weathersit")]
    WeatherCondition,
    #[serde(rename = "hr")]
    HourOfDay,
    #[serde(rename = "temp")]
    Temperature,
    #[serde(rename = "hum")]
    Humidity,
    #[serde(rename = "windspeed")]
    Windspeed,
    #[serde(rename = "cnt")]
    RentalCount,
}

impl Column {
    /// Header name in the input file.
    pub fn source_name(self) -> &'static str {
        match self {
            Column::Date => "date",
            Column::Season => "season",
            Column::WeatherCondition => "weathersit",
            Column::HourOfDay => "hr",
            Column::Temperature => "temp",
            Column::Humidity => "hum",
            Column::Windspeed => "windspeed",
            Column::RentalCount => "cnt",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Column::Date)
    }

    /// The cell of this column in `record`.
    pub fn cell(self, record: &Record) -> CellValue {
        match self {
            Column::Date => CellValue::Date(record.date),
            Column::Season => CellValue::Integer(record.season),
            Column::WeatherCondition => CellValue::Integer(record.weather_condition),
            Column::HourOfDay => CellValue::Integer(i64::from(record.hour_of_day)),
            Column::Temperature => CellValue::Float(record.temperature),
            Column::Humidity => CellValue::Float(record.humidity),
            Column::Windspeed => CellValue::Float(record.windspeed),
            // Counts past i64::MAX keep their magnitude as a float key.
            Column::RentalCount => i64::try_from(record.rental_count)
                .map(CellValue::Integer)
                .unwrap_or(CellValue::Float(record.rental_count as f64)),
        }
    }

    /// Numeric value of this column in `record`, or `None` for the date.
    pub fn numeric(self, record: &Record) -> Option<f64> {
        match self {
            Column::Date => None,
            Column::Season => Some(record.season as f64),
            Column::WeatherCondition => Some(record.weather_condition as f64),
            Column::HourOfDay => Some(f64::from(record.hour_of_day)),
            Column::Temperature => Some(record.temperature),
            Column::Humidity => Some(record.humidity),
            Column::Windspeed => Some(record.windspeed),
            Column::RentalCount => Some(record.rental_count as f64),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_name())
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the table
// ---------------------------------------------------------------------------

/// One hourly observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub season: i64,
    pub weather_condition: i64,
    /// 0–23.
    pub hour_of_day: u8,
    pub temperature: f64,
    /// Percentage.
    pub humidity: f64,
    pub windspeed: f64,
    pub rental_count: u64,
}

// ---------------------------------------------------------------------------
// DerivedColumn – a categorical column appended by binning
// ---------------------------------------------------------------------------

/// Categorical column: one label index per row into `labels`.
/// Every code is a valid index into `labels`.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedColumn {
    name: String,
    source: Column,
    labels: Vec<String>,
    codes: Vec<usize>,
}

impl DerivedColumn {
    pub fn new(
        name: impl Into<String>,
        source: Column,
        labels: Vec<String>,
        codes: Vec<usize>,
    ) -> Result<Self> {
        let name = name.into();
        if let Some(row) = codes.iter().position(|&c| c >= labels.len()) {
            return Err(DashboardError::InvalidDerivedColumn(format!(
                "{name}: row {row} has code {} but only {} labels",
                codes[row],
                labels.len()
            )));
        }
        Ok(DerivedColumn {
            name,
            source,
            labels,
            codes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Column {
        self.source
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Label index per row.
    pub fn codes(&self) -> &[usize] {
        &self.codes
    }

    /// Label assigned to `row`.
    pub fn label(&self, row: usize) -> Option<&str> {
        self.codes
            .get(row)
            .and_then(|&code| self.labels.get(code))
            .map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Dataset – an immutable table
// ---------------------------------------------------------------------------

/// Ordered records plus any derived columns.
///
/// Records are shared behind an `Arc`, so appending a derived column yields a
/// new `Dataset` without copying rows. Nothing mutates a dataset in place.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Arc<[Record]>,
    derived: Vec<DerivedColumn>,
    /// Earliest and latest date, `None` when empty.
    bounds: Option<(NaiveDate, NaiveDate)>,
}

impl Default for Dataset {
    fn default() -> Self {
        Dataset::from_records(Vec::new())
    }
}

impl Dataset {
    /// Build a dataset and its date bounds from loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let bounds = records.iter().fold(None, |acc, r| match acc {
            None => Some((r.date, r.date)),
            Some((lo, hi)) => Some((r.date.min(lo), r.date.max(hi))),
        });
        Dataset {
            records: records.into(),
            derived: Vec::new(),
            bounds,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn min_date(&self) -> Option<NaiveDate> {
        self.bounds.map(|(lo, _)| lo)
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.bounds.map(|(_, hi)| hi)
    }

    pub fn derived_columns(&self) -> &[DerivedColumn] {
        &self.derived
    }

    pub fn derived(&self, name: &str) -> Option<&DerivedColumn> {
        self.derived.iter().find(|c| c.name == name)
    }

    /// All values of a numeric column, in row order.
    pub fn numeric_values(&self, column: Column) -> Result<Vec<f64>> {
        if !column.is_numeric() {
            return Err(DashboardError::NonNumericColumn(column));
        }
        Ok(self
            .records
            .iter()
            .filter_map(|r| column.numeric(r))
            .collect())
    }

    /// A new dataset sharing these records with `column` appended.
    /// A derived column of the same name is replaced; the column must have
    /// one code per record.
    pub fn with_derived(&self, column: DerivedColumn) -> Result<Self> {
        if column.codes.len() != self.len() {
            return Err(DashboardError::InvalidDerivedColumn(format!(
                "{}: {} codes for {} records",
                column.name,
                column.codes.len(),
                self.len()
            )));
        }
        let mut derived: Vec<DerivedColumn> = self
            .derived
            .iter()
            .filter(|c| c.name != column.name)
            .cloned()
            .collect();
        derived.push(column);
        Ok(Dataset {
            records: Arc::clone(&self.records),
            derived,
            bounds: self.bounds,
        })
    }

    /// A new dataset holding only the rows at `indices` (ascending),
    /// derived columns included.
    pub(crate) fn select_rows(&self, indices: &[usize]) -> Self {
        let records: Vec<Record> = indices.iter().map(|&i| self.records[i].clone()).collect();
        let derived = self
            .derived
            .iter()
            .map(|c| DerivedColumn {
                name: c.name.clone(),
                source: c.source,
                labels: c.labels.clone(),
                codes: indices.iter().map(|&i| c.codes[i]).collect(),
            })
            .collect();
        Dataset {
            derived,
            ..Dataset::from_records(records)
        }
    }
}
