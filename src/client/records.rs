//! Statistics computed from local shipment records

use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use crate::aggregate::weekly::{bucket_units, overall_baseline};
use crate::calendar::WeekRange;
use crate::error::Result;
use crate::stats::{BaselineMap, Shipment, ShipmentSummary, ShipmentWeek, WeekAggregate};

use super::StatsClient;

/// Serves the statistics endpoints from an in-memory list of shipments.
///
/// Produces the same shapes the REST backend does, so the dashboard can run
/// offline against an exported JSON file.
#[derive(Debug, Clone, Default)]
pub struct RecordStatsClient {
    shipments: Vec<Shipment>,
}

impl RecordStatsClient {
    #[must_use]
    pub const fn new(shipments: Vec<Shipment>) -> Self {
        Self { shipments }
    }

    /// Load shipments from a JSON array file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let shipments: Vec<Shipment> = serde_json::from_str(&contents)?;
        debug!("Loaded {} shipments from {}", shipments.len(), path.display());
        Ok(Self::new(shipments))
    }

    #[must_use]
    pub fn shipments(&self) -> &[Shipment] {
        &self.shipments
    }
}

#[async_trait]
impl StatsClient for RecordStatsClient {
    async fn fetch_weekly_fpy(&self, anchor: NaiveDate, weeks: u32) -> Result<Vec<WeekAggregate>> {
        Ok(bucket_units(&self.shipments, anchor, weeks))
    }

    async fn fetch_overall_fpy(&self) -> Result<BaselineMap> {
        Ok(overall_baseline(&self.shipments))
    }

    async fn fetch_weekly_shipments(&self, date: NaiveDate) -> Result<ShipmentWeek> {
        let week = WeekRange::containing(date);
        let (start, end) = (week.start_date(), week.end_date());

        let mut in_week: Vec<&Shipment> = self
            .shipments
            .iter()
            .filter(|s| (start..=end).contains(&s.shipping_date))
            .collect();
        in_week.sort_by_key(|s| (s.shipping_date, s.id));

        Ok(ShipmentWeek {
            start,
            end,
            shipments: in_week.into_iter().map(ShipmentSummary::of).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fetch_report_weeks;
    use crate::stats::ShippedUnit;
    use crate::types::UnitCount;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn shipment(id: i64, date: NaiveDate, models: &[&str]) -> Shipment {
        Shipment {
            id,
            job_number: format!("J-{id}"),
            customer_name: "Acme".to_string(),
            shipping_date: date,
            units: models
                .iter()
                .map(|m| ShippedUnit {
                    model_type: Some((*m).to_string()),
                    part_number: Some(format!("PN-{m}")),
                    serial_number: None,
                    first_test_pass: true,
                })
                .collect(),
        }
    }

    fn client() -> RecordStatsClient {
        RecordStatsClient::new(vec![
            shipment(2, ymd(2024, 3, 14), &["X"]),
            shipment(1, ymd(2024, 3, 11), &["X", "Y"]),
            shipment(3, ymd(2024, 3, 5), &["Z"]),
        ])
    }

    #[tokio::test]
    async fn test_weekly_shipments_sorted_by_date() {
        let week = client()
            .fetch_weekly_shipments(ymd(2024, 3, 15))
            .await
            .unwrap();
        assert_eq!(week.start, ymd(2024, 3, 10));
        assert_eq!(week.end, ymd(2024, 3, 16));
        let ids: Vec<i64> = week.shipments.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_report_weeks_newest_first() {
        let weeks = fetch_report_weeks(&client(), ymd(2024, 3, 15), 3)
            .await
            .unwrap();
        let starts: Vec<NaiveDate> = weeks.iter().map(|w| w.start).collect();
        assert_eq!(
            starts,
            vec![ymd(2024, 3, 10), ymd(2024, 3, 3), ymd(2024, 2, 25)]
        );
        assert_eq!(weeks[1].shipments[0].total_units, UnitCount::new(1));
        assert!(weeks[2].shipments.is_empty());
    }

    #[tokio::test]
    async fn test_weekly_fpy_and_baseline() {
        let c = client();
        let weeks = c.fetch_weekly_fpy(ymd(2024, 3, 15), 2).await.unwrap();
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].totals.total_units, UnitCount::new(3));

        let baseline = c.fetch_overall_fpy().await.unwrap();
        assert_eq!(baseline.part("PN-X"), Some(100.0));
        assert_eq!(baseline.total(), Some(100.0));
    }

    #[test]
    fn test_from_path() {
        let path = std::env::temp_dir().join(format!(
            "fpy_records_{}_{:?}.json",
            std::process::id(),
            std::thread::current().id()
        ));
        std::fs::write(
            &path,
            r#"[{"id": 1, "shipping_date": "2024-03-12",
                 "units": [{"model_type": "X", "first_test_pass": true}]}]"#,
        )
        .unwrap();
        let c = RecordStatsClient::from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(c.shipments().len(), 1);
        assert_eq!(c.shipments()[0].units[0].model_type.as_deref(), Some("X"));
    }
}
