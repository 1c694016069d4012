//! FPY data model
//!
//! Aggregates are produced fresh by every fetch and never mutated in place;
//! a new value replaces the old one when data changes.

mod shipment;

pub use shipment::{Shipment, ShipmentSummary, ShipmentWeek, ShippedUnit, TypeCount};

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{first_pass_yield, UnitCount};

/// Key used for the synthesized all-products entry.
pub const TOTAL_KEY: &str = "__TOTAL__";

/// Label used for the synthesized all-products entry.
pub const TOTAL_LABEL: &str = "Total";

/// Pass counts for one product (or the whole week) in one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductStat {
    pub key: String,
    pub label: String,
    pub total_units: UnitCount,
    pub first_pass_units: UnitCount,
    /// `100 * first_pass_units / total_units`, or 0 with no units. Unrounded.
    pub first_pass_yield: f64,
}

impl ProductStat {
    /// Build a stat from raw counts, deriving the yield.
    ///
    /// `first_pass_units` is capped at `total_units`.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        total_units: UnitCount,
        first_pass_units: UnitCount,
    ) -> Self {
        let first_pass_units = first_pass_units.min(total_units);
        Self {
            key: key.into(),
            label: label.into(),
            total_units,
            first_pass_units,
            first_pass_yield: first_pass_yield(first_pass_units, total_units),
        }
    }

    /// Sum of `stats` under the synthesized total key.
    #[must_use]
    pub fn total_of<'a>(stats: impl IntoIterator<Item = &'a Self>) -> Self {
        let (total, passed) = stats
            .into_iter()
            .fold((UnitCount::default(), UnitCount::default()), |(t, p), s| {
                (t + s.total_units, p + s.first_pass_units)
            });
        Self::new(TOTAL_KEY, TOTAL_LABEL, total, passed)
    }

    /// Product key: part number, then model type, then a positional placeholder.
    #[must_use]
    pub fn key_for(part_number: Option<&str>, model_type: Option<&str>, index: usize) -> String {
        non_empty(part_number)
            .or_else(|| non_empty(model_type))
            .map_or_else(|| format!("product-{index}"), str::to_string)
    }

    /// Display label: part number, then model type, then `Unknown`.
    #[must_use]
    pub fn label_for(part_number: Option<&str>, model_type: Option<&str>) -> String {
        non_empty(part_number)
            .or_else(|| non_empty(model_type))
            .unwrap_or("Unknown")
            .to_string()
    }

    /// Fold entries sharing a key into one, at the first one's position.
    ///
    /// The first label wins; the yield is recomputed from the summed counts.
    #[must_use]
    pub fn merge_by_key(stats: impl IntoIterator<Item = Self>) -> Vec<Self> {
        let mut merged: Vec<Self> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for stat in stats {
            match positions.get(&stat.key) {
                Some(&pos) => {
                    let first = &merged[pos];
                    let combined = Self::new(
                        first.key.clone(),
                        first.label.clone(),
                        first.total_units + stat.total_units,
                        first.first_pass_units + stat.first_pass_units,
                    );
                    merged[pos] = combined;
                }
                None => {
                    positions.insert(stat.key.clone(), merged.len());
                    merged.push(stat);
                }
            }
        }
        merged
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// One Sunday-to-Saturday week of FPY data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekAggregate {
    /// Sunday
    pub start: NaiveDate,
    /// Saturday
    pub end: NaiveDate,
    /// At most one entry per product key, in backend order
    pub products: Vec<ProductStat>,
    pub totals: ProductStat,
}

impl WeekAggregate {
    /// Build a week, computing totals from the products.
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate, products: Vec<ProductStat>) -> Self {
        let totals = ProductStat::total_of(&products);
        Self {
            start,
            end,
            products,
            totals,
        }
    }

    /// Whether any unit shipped this week.
    #[must_use]
    pub const fn has_units(&self) -> bool {
        !self.totals.total_units.is_zero()
    }

    /// `start → end` label.
    #[must_use]
    pub fn range_label(&self) -> String {
        format!("{} → {}", self.start, self.end)
    }
}

/// All-time FPY per part number plus the all-products figure.
///
/// Read-only reference data loaded once per session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineMap {
    parts: HashMap<String, f64>,
    total: Option<f64>,
}

impl BaselineMap {
    #[must_use]
    pub fn new(parts: HashMap<String, f64>, total: Option<f64>) -> Self {
        Self { parts, total }
    }

    /// Baseline for a product key, if one exists.
    #[must_use]
    pub fn part(&self, key: &str) -> Option<f64> {
        self.parts.get(key).copied()
    }

    /// Baseline across all products.
    #[must_use]
    pub const fn total(&self) -> Option<f64> {
        self.total
    }

    /// Baseline for a series key; [`TOTAL_KEY`] resolves to the overall figure.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<f64> {
        if key == TOTAL_KEY {
            self.total
        } else {
            self.part(key)
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty() && self.total.is_none()
    }
}
