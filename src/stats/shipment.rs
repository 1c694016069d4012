//! Shipment records and weekly shipment listings

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::UnitCount;

/// A single shipped unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippedUnit {
    pub model_type: Option<String>,
    pub part_number: Option<String>,
    pub serial_number: Option<String>,
    /// Passed testing on the first attempt
    #[serde(default)]
    pub first_test_pass: bool,
}

/// A shipment with its units, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: i64,
    #[serde(default)]
    pub job_number: String,
    #[serde(default)]
    pub customer_name: String,
    pub shipping_date: NaiveDate,
    #[serde(default)]
    pub units: Vec<ShippedUnit>,
}

/// Units of one model type in a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    pub model_type: String,
    pub count: UnitCount,
}

/// A shipment reduced to its per-type unit counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentSummary {
    pub id: i64,
    pub job_number: String,
    pub customer_name: String,
    pub shipping_date: NaiveDate,
    pub total_units: UnitCount,
    /// Model types in first-seen order
    pub units_by_type: Vec<TypeCount>,
}

impl ShipmentSummary {
    /// Summarize a shipment's units by model type.
    #[must_use]
    pub fn of(shipment: &Shipment) -> Self {
        let mut units_by_type: Vec<TypeCount> = Vec::new();
        for unit in &shipment.units {
            let model_type = unit.model_type.clone().unwrap_or_default();
            match units_by_type.iter_mut().find(|t| t.model_type == model_type) {
                Some(entry) => entry.count += UnitCount::new(1),
                None => units_by_type.push(TypeCount {
                    model_type,
                    count: UnitCount::new(1),
                }),
            }
        }

        Self {
            id: shipment.id,
            job_number: shipment.job_number.clone(),
            customer_name: shipment.customer_name.clone(),
            shipping_date: shipment.shipping_date,
            total_units: UnitCount::new(shipment.units.len() as u64),
            units_by_type,
        }
    }
}

/// Every shipment in one Sunday-to-Saturday week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentWeek {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub shipments: Vec<ShipmentSummary>,
}
