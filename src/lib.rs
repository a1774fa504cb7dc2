//! Tabular data explorer.
//!
//! Load a CSV / JSON / Parquet file, classify its columns, filter rows by
//! checked values and a free-text query, rank the top groups into a chart
//! spec, place rows on a map (directly or via rate-limited geocoding) and
//! export the filtered view.
//!
//! [`state::AppState`] is the controller tying these stages together.

pub mod chart;
pub mod color;
pub mod config;
pub mod data;
pub mod debounce;
pub mod demo;
pub mod error;
pub mod export;
pub mod geo;
pub mod state;

pub use error::{GeocodeError, PipelineError};
pub use state::AppState;
