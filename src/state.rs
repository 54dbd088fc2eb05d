use chrono::NaiveDate;

use crate::data::filter::DateRange;
use crate::data::model::Dataset;
use crate::error::Result;
use crate::view::{compute_view, Mode, View};

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// Everything a session holds, independent of rendering.
///
/// Each control change triggers one full recompute of `view`; nothing is
/// carried over between passes except the loaded dataset.
#[derive(Debug, Default)]
pub struct AppState {
    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<Dataset>,

    /// Selected analysis.
    pub mode: Mode,

    /// Selected date range; `None` means the whole dataset.
    pub range: Option<DateRange>,

    /// Output of the last successful pass.
    pub view: Option<View>,

    /// Status / error message shown to the user.
    pub status_message: Option<String>,
}

impl AppState {
    /// Ingest a newly loaded dataset and reset the range to its full span.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.dataset = Some(dataset);
        self.range = None;
        self.refresh();
    }

    /// Bounds offered by the date picker.
    pub fn selectable_range(&self) -> Option<DateRange> {
        self.dataset.as_ref().and_then(DateRange::full)
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.refresh();
    }

    /// Select `[start, end]`. A reversed range is reported and leaves the
    /// previous selection and view in place.
    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) -> Result<()> {
        match DateRange::new(start, end) {
            Ok(range) => {
                self.range = Some(range);
                self.refresh();
                Ok(())
            }
            Err(e) => {
                log::warn!("Rejected date range: {e}");
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    /// Select a range where either bound may be left open. An open bound is
    /// unbounded; clamping to the data happens when the view is computed, so
    /// only two given bounds can form a reversed range.
    pub fn set_partial_range(
        &mut self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<()> {
        if start.is_none() && end.is_none() {
            self.clear_date_range();
            return Ok(());
        }
        self.set_date_range(
            start.unwrap_or(NaiveDate::MIN),
            end.unwrap_or(NaiveDate::MAX),
        )
    }

    pub fn clear_date_range(&mut self) {
        self.range = None;
        self.refresh();
    }

    /// Recompute `view` for the current mode and range.
    pub fn refresh(&mut self) {
        let Some(ds) = &self.dataset else {
            self.view = None;
            return;
        };
        match compute_view(ds, self.range.as_ref(), self.mode) {
            Ok(view) => {
                self.view = Some(view);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("{} failed: {e}", self.mode.title());
                self.view = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;
    use crate::error::DashboardError;
    use crate::view::ViewContent;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2012, 7, d).unwrap()
    }

    fn loaded() -> AppState {
        let records = (1..=10)
            .map(|d| Record {
                date: day(d),
                season: 3,
                weather_condition: 1,
                hour_of_day: 12,
                temperature: 28.0,
                humidity: 55.0,
                windspeed: 9.0,
                rental_count: u64::from(d) * 10,
            })
            .collect();
        let mut state = AppState::default();
        state.set_dataset(Dataset::from_records(records));
        state
    }

    #[test]
    fn loading_computes_the_default_view() {
        let state = loaded();
        let view = state.view.as_ref().unwrap();
        assert_eq!(view.mode, Mode::Distribution);
        assert_eq!(view.rows, 10);
        assert_eq!(state.selectable_range(), Some(DateRange::new(day(1), day(10)).unwrap()));
    }

    #[test]
    fn changing_mode_recomputes() {
        let mut state = loaded();
        state.set_mode(Mode::SeasonWeather);
        let view = state.view.as_ref().unwrap();
        assert!(matches!(view.content, ViewContent::SeasonWeather { .. }));
    }

    #[test]
    fn reversed_range_is_rejected_and_keeps_last_view() {
        let mut state = loaded();
        state.set_date_range(day(2), day(4)).unwrap();
        assert_eq!(state.view.as_ref().unwrap().rows, 3);

        let err = state.set_date_range(day(6), day(5)).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidRange { .. }));
        assert_eq!(state.range, Some(DateRange::new(day(2), day(4)).unwrap()));
        assert_eq!(state.view.as_ref().unwrap().rows, 3);
        assert!(state.status_message.as_deref().unwrap().contains("invalid date range"));
    }

    #[test]
    fn open_bounds_take_dataset_limits() {
        let mut state = loaded();
        state.set_partial_range(Some(day(8)), None).unwrap();
        let view = state.view.as_ref().unwrap();
        assert_eq!(view.range, Some(DateRange::new(day(8), day(10)).unwrap()));
        assert_eq!(view.rows, 3);

        state.set_partial_range(None, Some(day(2))).unwrap();
        let view = state.view.as_ref().unwrap();
        assert_eq!(view.range, Some(DateRange::new(day(1), day(2)).unwrap()));
        assert_eq!(view.rows, 2);

        state.set_partial_range(None, None).unwrap();
        assert_eq!(state.range, None);
        assert_eq!(state.view.as_ref().unwrap().rows, 10);
    }

    #[test]
    fn one_sided_range_outside_data_is_empty_not_an_error() {
        let mut state = loaded();
        state.set_partial_range(Some(day(20)), None).unwrap();
        let view = state.view.as_ref().unwrap();
        assert_eq!(view.rows, 0);
        assert_eq!(view.range, None);
        assert_eq!(state.status_message, None);

        let before = NaiveDate::from_ymd_opt(2012, 6, 1).unwrap();
        state.set_partial_range(None, Some(before)).unwrap();
        let view = state.view.as_ref().unwrap();
        assert_eq!(view.rows, 0);
        assert_eq!(view.range, None);
    }

    #[test]
    fn two_given_bounds_can_still_be_reversed() {
        let mut state = loaded();
        let err = state.set_partial_range(Some(day(9)), Some(day(3))).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidRange { .. }));
    }

    #[test]
    fn no_dataset_means_no_view() {
        let mut state = AppState::default();
        state.set_mode(Mode::Binning);
        assert!(state.view.is_none());
    }
}
