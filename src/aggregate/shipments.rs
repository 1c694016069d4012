//! Weekly shipped-units report: units per model type, week by week.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::stats::{ShipmentWeek, TypeCount};
use crate::types::UnitCount;

/// Week counts offered by the shipped-units report.
pub const REPORT_WEEK_CHOICES: [u32; 4] = [4, 6, 8, 12];

/// One week's shipped units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekUnits {
    /// Week start as an ISO date
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_units: UnitCount,
    /// Summed across shipments, in first-seen order
    pub type_counts: Vec<TypeCount>,
}

impl WeekUnits {
    /// Units of `model_type` this week, 0 when absent.
    #[must_use]
    pub fn count_of(&self, model_type: &str) -> UnitCount {
        self.type_counts
            .iter()
            .find(|t| t.model_type == model_type)
            .map_or_else(UnitCount::default, |t| t.count)
    }
}

/// One stacked series: a model type's count in each week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSeries {
    pub model_type: String,
    pub counts: Vec<UnitCount>,
}

/// Stacked-bar data for the shipped-units report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitsReport {
    pub weeks: Vec<WeekUnits>,
    /// One per model type, in first-seen order across all weeks
    pub series: Vec<TypeSeries>,
    /// Total units per week, for the optional overlay line
    pub totals: Vec<UnitCount>,
}

impl UnitsReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }
}

/// Dates to request for an `n`-week report: the anchor, then one week back
/// at a time.
#[must_use]
pub fn report_dates(anchor: NaiveDate, weeks: u32) -> Vec<NaiveDate> {
    (0..weeks)
        .map(|i| anchor - Duration::weeks(i64::from(i)))
        .collect()
}

fn add_count(counts: &mut Vec<TypeCount>, model_type: &str, n: UnitCount) {
    match counts.iter_mut().find(|t| t.model_type == model_type) {
        Some(entry) => entry.count += n,
        None => counts.push(TypeCount {
            model_type: model_type.to_string(),
            count: n,
        }),
    }
}

/// Summarize fetched shipment weeks, keeping their order.
#[must_use]
pub fn build_units_report(weeks: &[ShipmentWeek]) -> UnitsReport {
    let weeks: Vec<WeekUnits> = weeks
        .iter()
        .map(|week| {
            let mut type_counts = Vec::new();
            for t in week.shipments.iter().flat_map(|s| &s.units_by_type) {
                add_count(&mut type_counts, &t.model_type, t.count);
            }
            WeekUnits {
                label: week.start.to_string(),
                start: week.start,
                end: week.end,
                total_units: week.shipments.iter().map(|s| s.total_units).sum(),
                type_counts,
            }
        })
        .collect();

    let mut model_types: Vec<&str> = Vec::new();
    for t in weeks.iter().flat_map(|w| &w.type_counts) {
        if !model_types.contains(&t.model_type.as_str()) {
            model_types.push(&t.model_type);
        }
    }

    let series = model_types
        .iter()
        .map(|model_type| TypeSeries {
            model_type: (*model_type).to_string(),
            counts: weeks.iter().map(|w| w.count_of(model_type)).collect(),
        })
        .collect();
    let totals = weeks.iter().map(|w| w.total_units).collect();

    UnitsReport {
        weeks,
        series,
        totals,
    }
}
