//! Aggregation of fetched statistics into chart-ready series
//!
//! Everything here is synchronous and free of I/O. Missing optional values
//! (a product with no baseline) stay `None` all the way to the presenter.

pub mod quarterly;
pub mod shipments;
pub mod weekly;

pub use quarterly::{quarter_series, quarter_weeks, QuarterBar, QuarterSeries};
pub use shipments::{build_units_report, UnitsReport};
pub use weekly::{series_for, week_series, SeriesPoint, WeekSeries};
