use std::collections::BTreeMap;

use serde::Serialize;

use super::model::{CellValue, Column, Dataset};
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Group-by aggregation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggMethod {
    Sum,
    Mean,
}

/// One output row: a group key and its aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupRow {
    pub key: CellValue,
    pub value: f64,
}

/// Per-group aggregates, ascending by key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub group_by: Column,
    pub target: Column,
    pub method: AggMethod,
    pub rows: Vec<GroupRow>,
}

impl AggregationResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(key, value)` pairs in output order.
    pub fn pairs(&self) -> Vec<(CellValue, f64)> {
        self.rows.iter().map(|r| (r.key, r.value)).collect()
    }
}

/// Sum or mean of `target` per distinct value of `group_by`.
///
/// Only observed keys produce groups, so a mean never divides by zero.
/// An empty dataset gives an empty result.
pub fn aggregate(
    dataset: &Dataset,
    group_by: Column,
    target: Column,
    method: AggMethod,
) -> Result<AggregationResult> {
    if !target.is_numeric() {
        return Err(DashboardError::NonNumericColumn(target));
    }

    // key → (sum, count)
    let mut groups: BTreeMap<CellValue, (f64, usize)> = BTreeMap::new();
    for record in dataset.records() {
        let Some(value) = target.numeric(record) else {
            continue;
        };
        let entry = groups.entry(group_by.cell(record)).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let rows = groups
        .into_iter()
        .map(|(key, (sum, count))| GroupRow {
            key,
            value: match method {
                AggMethod::Sum => sum,
                AggMethod::Mean => sum / count as f64,
            },
        })
        .collect();

    Ok(AggregationResult {
        group_by,
        target,
        method,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{date, record};
    use crate::data::model::Record;

    fn seasons() -> Dataset {
        Dataset::from_records(vec![
            record(date(2011, 1, 1), 1, 5),
            record(date(2011, 1, 2), 1, 7),
            record(date(2011, 4, 1), 2, 9),
        ])
    }

    #[test]
    fn sums_rentals_per_season() {
        let res = aggregate(&seasons(), Column::Season, Column::RentalCount, AggMethod::Sum).unwrap();
        assert_eq!(
            res.pairs(),
            vec![(CellValue::Integer(1), 12.0), (CellValue::Integer(2), 9.0)]
        );
    }

    #[test]
    fn keys_come_out_sorted_not_in_input_order() {
        let ds = Dataset::from_records(vec![
            record(date(2011, 1, 1), 4, 1),
            record(date(2011, 1, 1), 2, 1),
            record(date(2011, 1, 1), 3, 1),
            record(date(2011, 1, 1), 2, 1),
        ]);
        let res = aggregate(&ds, Column::Season, Column::RentalCount, AggMethod::Sum).unwrap();
        let keys: Vec<CellValue> = res.rows.iter().map(|r| r.key).collect();
        assert_eq!(
            keys,
            vec![CellValue::Integer(2), CellValue::Integer(3), CellValue::Integer(4)]
        );
    }

    #[test]
    fn sum_is_conserved_across_groups() {
        let ds = Dataset::from_records(
            (0..48u64)
                .map(|i| Record {
                    hour_of_day: (i % 24) as u8,
                    weather_condition: (i % 3) as i64 + 1,
                    ..record(date(2011, 1, 1 + (i / 24) as u32), (i % 4) as i64 + 1, i * 3)
                })
                .collect(),
        );
        let total: f64 = ds.records().iter().map(|r| r.rental_count as f64).sum();
        for col in [Column::Season, Column::WeatherCondition, Column::HourOfDay, Column::Date] {
            let res = aggregate(&ds, col, Column::RentalCount, AggMethod::Sum).unwrap();
            let grouped: f64 = res.rows.iter().map(|r| r.value).sum();
            assert_eq!(grouped, total, "grouping by {col}");
        }
    }

    #[test]
    fn mean_of_singleton_group_is_the_value() {
        let res = aggregate(&seasons(), Column::Season, Column::RentalCount, AggMethod::Mean).unwrap();
        assert_eq!(res.rows[1].value, 9.0);
        assert_eq!(res.rows[0].value, 6.0);
    }

    #[test]
    fn mean_by_hour() {
        let mk = |hour: u8, cnt: u64| Record {
            hour_of_day: hour,
            ..record(date(2011, 1, 1), 1, cnt)
        };
        let ds = Dataset::from_records(vec![mk(8, 100), mk(17, 40), mk(8, 50), mk(17, 60)]);
        let res = aggregate(&ds, Column::HourOfDay, Column::RentalCount, AggMethod::Mean).unwrap();
        assert_eq!(
            res.pairs(),
            vec![(CellValue::Integer(8), 75.0), (CellValue::Integer(17), 50.0)]
        );
    }

    #[test]
    fn empty_dataset_gives_empty_result() {
        let res = aggregate(&Dataset::default(), Column::Season, Column::RentalCount, AggMethod::Sum)
            .unwrap();
        assert!(res.is_empty());
    }

    #[test]
    fn date_target_is_rejected() {
        let err = aggregate(&seasons(), Column::Season, Column::Date, AggMethod::Sum).unwrap_err();
        assert_eq!(err, DashboardError::NonNumericColumn(Column::Date));
    }
}
