use std::cmp::Ordering;

use serde::Serialize;

use super::model::{Column, Dataset, DerivedColumn};
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// BinSpec: edges + labels
// ---------------------------------------------------------------------------

/// Labelled intervals over a numeric domain.
///
/// Label `i` covers `(edges[i], edges[i + 1]]`, except the first label which
/// also includes `edges[0]`. Outer edges may be infinite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinSpec {
    edges: Vec<f64>,
    labels: Vec<String>,
}

impl BinSpec {
    pub fn new<S: Into<String>>(edges: Vec<f64>, labels: Vec<S>) -> Result<Self> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if edges.len() < 2 {
            return Err(DashboardError::InvalidBinSpec(format!(
                "need at least two edges, got {}",
                edges.len()
            )));
        }
        if labels.len() != edges.len() - 1 {
            return Err(DashboardError::InvalidBinSpec(format!(
                "{} edges need {} labels, got {}",
                edges.len(),
                edges.len() - 1,
                labels.len()
            )));
        }
        // NaN compares as unordered and is rejected here too.
        if let Some(w) = edges
            .windows(2)
            .find(|w| w[0].partial_cmp(&w[1]) != Some(Ordering::Less))
        {
            return Err(DashboardError::InvalidBinSpec(format!(
                "edges must be strictly increasing, found {} then {}",
                w[0], w[1]
            )));
        }
        Ok(BinSpec { edges, labels })
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Index of the interval holding `value`, `None` if outside every one.
    pub fn assign(&self, value: f64) -> Option<usize> {
        let first = self.edges[0];
        let last = self.edges[self.edges.len() - 1];
        if value.is_nan() || value < first || value > last {
            return None;
        }
        if value == first {
            return Some(0);
        }
        // First upper edge >= value; right-closed intervals.
        Some(self.edges[1..].partition_point(|&e| e < value))
    }

    /// Label for `value`.
    pub fn label_for(&self, value: f64) -> Option<&str> {
        self.assign(value).map(|i| self.labels[i].as_str())
    }
}

// ---------------------------------------------------------------------------
// The five dashboard bin specs
// ---------------------------------------------------------------------------

/// Fixed binning applied in clustering mode, in display order.
pub fn standard_specs() -> Vec<(Column, BinSpec)> {
    const INF: f64 = f64::INFINITY;
    let table: [(Column, &[f64], &[&str]); 5] = [
        (
            Column::HourOfDay,
            &[0.0, 5.0, 11.0, 17.0, 23.0],
            &["Night", "Morning", "Afternoon", "Evening"],
        ),
        (Column::Temperature, &[-INF, 10.0, 20.0, INF], &["Cold", "Moderate", "Warm"]),
        (Column::Humidity, &[-INF, 50.0, 75.0, INF], &["Low", "Medium", "High"]),
        (Column::Windspeed, &[-INF, 5.0, 15.0, INF], &["Calm", "Moderate", "Strong"]),
        (Column::RentalCount, &[-INF, 10.0, 30.0, INF], &["Low", "Medium", "High"]),
    ];

    table
        .into_iter()
        .map(|(column, edges, labels)| {
            let spec = BinSpec {
                edges: edges.to_vec(),
                labels: labels.iter().map(|s| s.to_string()).collect(),
            };
            (column, spec)
        })
        .collect()
}

/// Name of the derived column produced for `source`.
pub fn bin_column_name(source: Column) -> String {
    format!("{}_bin", source.source_name())
}

// ---------------------------------------------------------------------------
// Binning a dataset
// ---------------------------------------------------------------------------

/// A new dataset with `<source>_bin` appended.
///
/// Fails on the first row whose value no interval covers; nothing is
/// partially binned.
pub fn bin(dataset: &Dataset, source: Column, spec: &BinSpec) -> Result<Dataset> {
    let values = dataset.numeric_values(source)?;
    let codes = values
        .iter()
        .enumerate()
        .map(|(row, &value)| {
            spec.assign(value).ok_or_else(|| DashboardError::OutOfRange {
                row,
                column: source.source_name().to_string(),
                value,
            })
        })
        .collect::<Result<Vec<usize>>>()?;

    let column = DerivedColumn::new(bin_column_name(source), source, spec.labels.clone(), codes)?;
    dataset.with_derived(column)
}

/// Apply every spec from [`standard_specs`] in turn.
pub fn bin_standard(dataset: &Dataset) -> Result<Dataset> {
    standard_specs()
        .iter()
        .try_fold(dataset.clone(), |ds, (column, spec)| bin(&ds, *column, spec))
}

// ---------------------------------------------------------------------------
// Frequency tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Label → count for one binned column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyTable {
    pub column: String,
    pub rows: Vec<LabelCount>,
}

impl FrequencyTable {
    pub fn count_of(&self, label: &str) -> Option<usize> {
        self.rows.iter().find(|r| r.label == label).map(|r| r.count)
    }

    pub fn total(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }
}

/// Count rows per label. Every label is listed, unused ones with zero,
/// most frequent first; ties keep bin order.
pub fn value_counts(column: &DerivedColumn) -> FrequencyTable {
    let mut counts = vec![0usize; column.labels().len()];
    for &code in column.codes() {
        counts[code] += 1;
    }
    let mut rows: Vec<LabelCount> = column
        .labels()
        .iter()
        .zip(counts)
        .map(|(label, count)| LabelCount {
            label: label.clone(),
            count,
        })
        .collect();
    // Stable sort keeps bin order among equal counts.
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    FrequencyTable {
        column: column.name().to_string(),
        rows,
    }
}
