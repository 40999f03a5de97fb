//! Normalize irregular time-series sources into timestamp-indexed datasets and
//! compute descriptive statistics and pairwise correlation over them.

pub mod analysis;
pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod registry;
pub mod state;
pub mod variables;
pub mod weather;

pub use analysis::correlation::{CorrelationResult, correlate};
pub use analysis::stats::{StatisticsSummary, summarize};
pub use data::filter::{TimeRange, filter_range};
pub use data::loader::{Loaded, NormalizeOptions, SourceKind, normalize};
pub use data::model::{Dataset, Diagnostic, Normalized, TimeSeriesRecord, VariableCatalog};
pub use error::{Error, Result};
