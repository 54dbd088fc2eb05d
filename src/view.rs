use serde::Serialize;

use crate::data::aggregate::{aggregate, AggMethod, AggregationResult};
use crate::data::binning::{bin_column_name, bin_standard, value_counts, FrequencyTable};
use crate::data::filter::{filter_range, DateRange};
use crate::data::histogram::{histogram, Histogram, DEFAULT_BINS};
use crate::data::model::{Column, Dataset};
use crate::error::Result;

/// Rows shown in the binning preview table.
pub const PREVIEW_ROWS: usize = 5;

// ---------------------------------------------------------------------------
// Mode – the analysis menu
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    Distribution,
    SeasonWeather,
    BusyHours,
    Binning,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::Distribution,
        Mode::SeasonWeather,
        Mode::BusyHours,
        Mode::Binning,
    ];

    /// Menu label.
    pub fn title(self) -> &'static str {
        match self {
            Mode::Distribution => "Distribution",
            Mode::SeasonWeather => "Season & Weather",
            Mode::BusyHours => "Busy Hours",
            Mode::Binning => "Clustering/Binning",
        }
    }
}

// ---------------------------------------------------------------------------
// View – what the presentation layer receives for one pass
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub mode: Mode,
    pub title: &'static str,
    /// Range actually applied after clamping; `None` if no data matched.
    pub range: Option<DateRange>,
    /// Records that passed the filter.
    pub rows: usize,
    pub content: ViewContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewContent {
    Distribution {
        rental_counts: Vec<f64>,
        histogram: Histogram,
    },
    SeasonWeather {
        by_season: AggregationResult,
        by_weather: AggregationResult,
    },
    BusyHours {
        by_hour: AggregationResult,
    },
    Binning {
        preview: Vec<BinnedRow>,
        frequencies: Vec<FrequencyTable>,
    },
}

/// One row of the binning preview: each source value next to its label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinnedRow {
    pub hr: u8,
    pub hr_bin: String,
    pub temp: f64,
    pub temp_bin: String,
    pub hum: f64,
    pub hum_bin: String,
    pub windspeed: f64,
    pub windspeed_bin: String,
    pub cnt: u64,
    pub cnt_bin: String,
}

// ---------------------------------------------------------------------------
// One recompute pass
// ---------------------------------------------------------------------------

/// Filter `dataset` to `range` (whole dataset if `None`) and compute what
/// `mode` displays.
pub fn compute_view(dataset: &Dataset, range: Option<&DateRange>, mode: Mode) -> Result<View> {
    let (filtered, applied) = match range {
        Some(r) => (filter_range(dataset, r), r.clamp_to(dataset)),
        None => (dataset.clone(), DateRange::full(dataset)),
    };
    log::debug!(
        "{}: {} of {} records in range {:?}",
        mode.title(),
        filtered.len(),
        dataset.len(),
        applied
    );

    let content = match mode {
        Mode::Distribution => {
            let rental_counts = filtered.numeric_values(Column::RentalCount)?;
            let histogram = histogram(&rental_counts, DEFAULT_BINS);
            ViewContent::Distribution {
                rental_counts,
                histogram,
            }
        }
        Mode::SeasonWeather => ViewContent::SeasonWeather {
            by_season: aggregate(&filtered, Column::Season, Column::RentalCount, AggMethod::Sum)?,
            by_weather: aggregate(
                &filtered,
                Column::WeatherCondition,
                Column::RentalCount,
                AggMethod::Sum,
            )?,
        },
        Mode::BusyHours => ViewContent::BusyHours {
            by_hour: aggregate(&filtered, Column::HourOfDay, Column::RentalCount, AggMethod::Mean)?,
        },
        Mode::Binning => {
            let binned = bin_standard(&filtered)?;
            ViewContent::Binning {
                preview: preview_rows(&binned, PREVIEW_ROWS),
                frequencies: binned.derived_columns().iter().map(value_counts).collect(),
            }
        }
    };

    Ok(View {
        mode,
        title: mode.title(),
        range: applied,
        rows: filtered.len(),
        content,
    })
}

/// First `n` rows of a dataset carrying the standard bin columns.
fn preview_rows(binned: &Dataset, n: usize) -> Vec<BinnedRow> {
    let label = |source: Column, row: usize| -> String {
        binned
            .derived(&bin_column_name(source))
            .and_then(|c| c.label(row))
            .unwrap_or_default()
            .to_string()
    };

    binned
        .records()
        .iter()
        .take(n)
        .enumerate()
        .map(|(row, r)| BinnedRow {
            hr: r.hour_of_day,
            hr_bin: label(Column::HourOfDay, row),
            temp: r.temperature,
            temp_bin: label(Column::Temperature, row),
            hum: r.humidity,
            hum_bin: label(Column::Humidity, row),
            windspeed: r.windspeed,
            windspeed_bin: label(Column::Windspeed, row),
            cnt: r.rental_count,
            cnt_bin: label(Column::RentalCount, row),
        })
        .collect()
}
