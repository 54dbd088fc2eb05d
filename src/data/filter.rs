use chrono::NaiveDate;
use serde::Serialize;

use super::model::Dataset;
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// DateRange: the inclusive interval picked by the user
// ---------------------------------------------------------------------------

/// Inclusive date interval with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Reject a reversed range before anything is computed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(DashboardError::InvalidRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    /// The whole span of `dataset`, `None` when it is empty.
    pub fn full(dataset: &Dataset) -> Option<Self> {
        Some(DateRange {
            start: dataset.min_date()?,
            end: dataset.max_date()?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Intersect with the dataset's bounds.
    ///
    /// Returns `None` if the dataset is empty or the two do not overlap.
    pub fn clamp_to(&self, dataset: &Dataset) -> Option<Self> {
        let bounds = DateRange::full(dataset)?;
        let start = self.start.max(bounds.start);
        let end = self.end.min(bounds.end);
        (start <= end).then_some(DateRange { start, end })
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Return indices of records whose date lies within `range`.
pub fn filtered_indices(dataset: &Dataset, range: &DateRange) -> Vec<usize> {
    dataset
        .records()
        .iter()
        .enumerate()
        .filter(|(_, r)| range.contains(r.date))
        .map(|(i, _)| i)
        .collect()
}

/// Records dated within `[start, end]`, original order kept.
///
/// A range outside the data yields an empty dataset, not an error.
pub fn filter(dataset: &Dataset, start: NaiveDate, end: NaiveDate) -> Result<Dataset> {
    let requested = DateRange::new(start, end)?;
    Ok(filter_range(dataset, &requested))
}

/// Like [`filter`] for an already validated range.
pub fn filter_range(dataset: &Dataset, range: &DateRange) -> Dataset {
    match range.clamp_to(dataset) {
        Some(clamped) => dataset.select_rows(&filtered_indices(dataset, &clamped)),
        None => dataset.select_rows(&[]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{date, record};

    fn january() -> Dataset {
        Dataset::from_records(vec![
            record(date(2011, 1, 3), 1, 10),
            record(date(2011, 1, 1), 1, 20),
            record(date(2011, 1, 2), 1, 30),
            record(date(2011, 1, 3), 1, 40),
            record(date(2011, 1, 5), 1, 50),
        ])
    }

    #[test]
    fn keeps_records_in_range_in_order() {
        let ds = january();
        let out = filter(&ds, date(2011, 1, 2), date(2011, 1, 3)).unwrap();
        let counts: Vec<u64> = out.records().iter().map(|r| r.rental_count).collect();
        assert_eq!(counts, vec![10, 30, 40]);
        assert!(out
            .records()
            .iter()
            .all(|r| date(2011, 1, 2) <= r.date && r.date <= date(2011, 1, 3)));
        assert_eq!(ds.len(), 5);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = filter(&january(), date(2011, 1, 4), date(2011, 1, 2)).unwrap_err();
        assert_eq!(
            err,
            DashboardError::InvalidRange {
                start: date(2011, 1, 4),
                end: date(2011, 1, 2)
            }
        );
    }

    #[test]
    fn single_day_range_is_valid() {
        let out = filter(&january(), date(2011, 1, 1), date(2011, 1, 1)).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn range_is_clamped_to_dataset_bounds() {
        let ds = january();
        let wide = DateRange::new(date(2010, 6, 1), date(2012, 6, 1)).unwrap();
        assert_eq!(
            wide.clamp_to(&ds),
            Some(DateRange::new(date(2011, 1, 1), date(2011, 1, 5)).unwrap())
        );
        assert_eq!(filter_range(&ds, &wide).len(), ds.len());
    }

    #[test]
    fn disjoint_range_gives_empty_dataset() {
        let out = filter(&january(), date(2012, 1, 1), date(2012, 2, 1)).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.min_date(), None);

        let gap = filter(&january(), date(2011, 1, 4), date(2011, 1, 4)).unwrap();
        assert!(gap.is_empty());
    }

    #[test]
    fn filtering_empty_dataset_is_empty() {
        let out = filter(&Dataset::default(), date(2011, 1, 1), date(2011, 1, 2)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn filter_is_idempotent() {
        let ds = january();
        let (s, e) = (date(2011, 1, 2), date(2011, 1, 4));
        let once = filter(&ds, s, e).unwrap();
        let twice = filter(&once, s, e).unwrap();
        assert_eq!(once.records(), twice.records());
    }
}
