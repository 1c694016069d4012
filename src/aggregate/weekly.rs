//! Weekly FPY aggregation.
//!
//! Turns shipped-unit records into per-week, per-product pass counts, and
//! turns a fetched week plus the all-time baseline into a chart-ready series.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::calendar::{sunday_start, MAX_QUARTER_WEEKS};
use crate::stats::{BaselineMap, ProductStat, Shipment, WeekAggregate, TOTAL_KEY};
use crate::types::{first_pass_yield, UnitCount};

/// Week count used when the caller gives none.
pub const DEFAULT_WEEKS: u32 = 6;

/// Week counts offered by the weekly view.
pub const WEEK_CHOICES: [u32; 6] = [4, 6, 8, 12, 16, 26];

/// One bar of the weekly chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Product key, or [`TOTAL_KEY`] for the total entry
    pub key: String,
    pub label: String,
    /// This week's yield
    pub current: f64,
    /// All-time yield; `None` means no baseline, which is not the same as 0
    pub baseline: Option<f64>,
    pub passed_units: UnitCount,
    pub total_units: UnitCount,
    /// `current > baseline`; false when there is no baseline
    pub exceeds_baseline: bool,
}

impl SeriesPoint {
    fn from_stat(stat: &ProductStat, baseline: Option<f64>) -> Self {
        Self {
            key: stat.key.clone(),
            label: stat.label.clone(),
            current: stat.first_pass_yield,
            baseline,
            passed_units: stat.first_pass_units,
            total_units: stat.total_units,
            exceeds_baseline: baseline.is_some_and(|b| stat.first_pass_yield > b),
        }
    }

    /// Whether this is the synthesized total entry.
    #[must_use]
    pub fn is_total(&self) -> bool {
        self.key == TOTAL_KEY
    }

    /// `current - baseline`, when a baseline exists.
    #[must_use]
    pub fn delta(&self) -> Option<f64> {
        self.baseline.map(|b| self.current - b)
    }
}

/// Chart-ready data for one selected week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekSeries {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub title: String,
    /// Products in backend order, then the total
    pub points: Vec<SeriesPoint>,
}

impl WeekSeries {
    /// The total entry, always last.
    #[must_use]
    pub fn total(&self) -> Option<&SeriesPoint> {
        self.points.last().filter(|p| p.is_total())
    }
}

/// Build the chart series for one week against the baseline.
///
/// A week with no units is still a series (every yield reads 0).
#[must_use]
pub fn week_series(week: &WeekAggregate, baseline: &BaselineMap) -> WeekSeries {
    let mut points: Vec<SeriesPoint> = week
        .products
        .iter()
        .map(|p| SeriesPoint::from_stat(p, baseline.part(&p.key)))
        .collect();
    points.push(SeriesPoint::from_stat(&week.totals, baseline.total()));

    WeekSeries {
        start: week.start,
        end: week.end,
        title: format!("First Pass Yield for {} → {}", week.start, week.end),
        points,
    }
}

/// Series for the week at `index` of a newest-first fetch.
///
/// `None` means the week is not in the fetched range at all ("no data").
#[must_use]
pub fn series_for(weeks: &[WeekAggregate], index: usize, baseline: &BaselineMap) -> Option<WeekSeries> {
    weeks.get(index).map(|week| week_series(week, baseline))
}

#[derive(Default)]
struct Tally {
    part_number: Option<String>,
    model_type: Option<String>,
    total: UnitCount,
    passed: UnitCount,
}

/// Bucket shipped units into `weeks` Sunday-to-Saturday weeks ending with the
/// week that contains `anchor`, newest first.
///
/// `weeks` is clamped to `1..=26`. Every week in the window appears, with
/// zero totals when nothing shipped. Products inside a week are ordered by
/// part number, then model type, with one entry per product key.
#[must_use]
pub fn bucket_units(shipments: &[Shipment], anchor: NaiveDate, weeks: u32) -> Vec<WeekAggregate> {
    let weeks = weeks.clamp(1, MAX_QUARTER_WEEKS);
    let anchor_start = sunday_start(anchor);
    let range_start = anchor_start - Duration::weeks(i64::from(weeks - 1));
    let range_end = anchor_start + Duration::days(6);

    let mut buckets: HashMap<NaiveDate, BTreeMap<(String, String), Tally>> = HashMap::new();
    for shipment in shipments
        .iter()
        .filter(|s| (range_start..=range_end).contains(&s.shipping_date))
    {
        let bucket = buckets.entry(sunday_start(shipment.shipping_date)).or_default();
        for unit in &shipment.units {
            let sort_key = (
                unit.part_number.clone().unwrap_or_default(),
                unit.model_type.clone().unwrap_or_default(),
            );
            let tally = bucket.entry(sort_key).or_insert_with(|| Tally {
                part_number: unit.part_number.clone(),
                model_type: unit.model_type.clone(),
                ..Tally::default()
            });
            tally.total += UnitCount::new(1);
            if unit.first_test_pass {
                tally.passed += UnitCount::new(1);
            }
        }
    }

    (0..weeks)
        .map(|i| {
            let start = anchor_start - Duration::weeks(i64::from(i));
            let products = ProductStat::merge_by_key(
                buckets
                    .remove(&start)
                    .unwrap_or_default()
                    .into_values()
                    .enumerate()
                    .map(|(idx, t)| {
                        let part = t.part_number.as_deref();
                        let model = t.model_type.as_deref();
                        ProductStat::new(
                            ProductStat::key_for(part, model, idx),
                            ProductStat::label_for(part, model),
                            t.total,
                            t.passed,
                        )
                    }),
            );
            WeekAggregate::new(start, start + Duration::days(6), products)
        })
        .collect()
}

/// All-time yield per part number, plus the yield over every unit.
#[must_use]
pub fn overall_baseline(shipments: &[Shipment]) -> BaselineMap {
    let mut per_part: HashMap<String, (UnitCount, UnitCount)> = HashMap::new();
    let mut total = UnitCount::default();
    let mut passed = UnitCount::default();

    for unit in shipments.iter().flat_map(|s| &s.units) {
        let pass = UnitCount::new(u64::from(unit.first_test_pass));
        total += UnitCount::new(1);
        passed += pass;
        if let Some(part) = unit.part_number.as_deref().filter(|p| !p.is_empty()) {
            let entry = per_part.entry(part.to_string()).or_default();
            entry.0 += UnitCount::new(1);
            entry.1 += pass;
        }
    }

    let parts = per_part
        .into_iter()
        .map(|(part, (t, p))| (part, first_pass_yield(p, t)))
        .collect();
    let total = (!total.is_zero()).then(|| first_pass_yield(passed, total));
    BaselineMap::new(parts, total)
}
