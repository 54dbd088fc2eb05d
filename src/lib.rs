//! Bike-rental dashboard core.
//!
//! Loads an hourly rental table, narrows it to a date range and computes
//! the tables each dashboard mode displays. Rendering is left to whatever
//! consumes the serialised [`view::View`].

pub mod data;
pub mod error;
pub mod state;
pub mod view;

pub use data::model::{Column, Dataset, Record};
pub use error::DashboardError;
pub use state::AppState;
pub use view::{compute_view, Mode, View};
