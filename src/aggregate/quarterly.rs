//! Quarterly FPY overview.
//!
//! The quarter's weeks come out of a wider backward-walking fetch. Only
//! weeks wholly inside the quarter that shipped at least one unit are kept:
//! a zero-unit week would draw as a misleading 0% bar here, even though the
//! weekly view treats it as a valid empty week.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::QuarterDescriptor;
use crate::stats::WeekAggregate;
use crate::types::UnitCount;

/// Keep the quarter's active weeks, oldest first.
#[must_use]
pub fn quarter_weeks(weeks: &[WeekAggregate], quarter: &QuarterDescriptor) -> Vec<WeekAggregate> {
    let mut kept: Vec<WeekAggregate> = weeks
        .iter()
        .filter(|w| quarter.covers(w.start, w.end) && w.has_units())
        .cloned()
        .collect();
    kept.sort_by_key(|w| w.start);
    kept
}

/// Short week label from its end date, e.g. `Mar 16`.
#[must_use]
pub fn week_end_label(end: NaiveDate) -> String {
    end.format("%b %-d").to_string()
}

/// One bar of the quarterly chart: a week's total yield.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterBar {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
    pub value: f64,
    pub passed_units: UnitCount,
    pub total_units: UnitCount,
    /// Matches the week currently selected in the weekly view
    pub selected: bool,
}

/// Chart-ready data for the quarterly overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterSeries {
    pub title: String,
    pub bars: Vec<QuarterBar>,
    pub footnote: String,
}

/// Build the quarterly series from already-filtered weeks.
///
/// Returns `None` when the quarter has no active weeks.
#[must_use]
pub fn quarter_series(
    quarter: &QuarterDescriptor,
    weeks: &[WeekAggregate],
    selected_start: Option<NaiveDate>,
) -> Option<QuarterSeries> {
    if weeks.is_empty() {
        return None;
    }

    let bars = weeks
        .iter()
        .map(|w| QuarterBar {
            start: w.start,
            end: w.end,
            label: week_end_label(w.end),
            value: w.totals.first_pass_yield,
            passed_units: w.totals.first_pass_units,
            total_units: w.totals.total_units,
            selected: selected_start == Some(w.start),
        })
        .collect();

    let plural = if weeks.len() == 1 { "" } else { "s" };
    Some(QuarterSeries {
        title: format!("Quarterly FPY - {}", quarter.label()),
        bars,
        footnote: format!(
            "Showing {} week{plural} between {} and {}.",
            weeks.len(),
            quarter.start_date,
            quarter.end_date
        ),
    })
}
