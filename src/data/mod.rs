//! Data layer: core types, loading, filtering, aggregation and binning.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Dataset
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  inclusive date range → new Dataset
//!   └──────────┘
//!        │
//!        ├──────────────┬───────────────┐
//!        ▼              ▼               ▼
//!   ┌───────────┐  ┌──────────┐  ┌───────────┐
//!   │ aggregate  │  │ binning   │  │ histogram  │
//!   └───────────┘  └──────────┘  └───────────┘
//! ```
//!
//! Every step returns a new value; a loaded `Dataset` is never mutated.

pub mod aggregate;
pub mod binning;
pub mod filter;
pub mod histogram;
pub mod loader;
pub mod model;
