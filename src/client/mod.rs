//! Statistics sources
//!
//! The dashboard only sees the [`StatsClient`] trait. Two implementations
//! ship with the crate: [`HttpStatsClient`] talks to the QC backend's REST
//! API, [`RecordStatsClient`] computes the same aggregates from a local file
//! of shipment records.

mod http;
mod records;

pub use http::HttpStatsClient;
pub use records::RecordStatsClient;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::aggregate::shipments::report_dates;
use crate::error::Result;
use crate::stats::{BaselineMap, ShipmentWeek, WeekAggregate};

/// Source of FPY aggregates.
#[async_trait]
pub trait StatsClient: Send + Sync {
    /// `weeks` Sunday-to-Saturday weeks ending with the week containing
    /// `anchor`, newest first.
    async fn fetch_weekly_fpy(&self, anchor: NaiveDate, weeks: u32) -> Result<Vec<WeekAggregate>>;

    /// All-time FPY per part number and overall.
    async fn fetch_overall_fpy(&self) -> Result<BaselineMap>;

    /// Shipments in the week containing `date`.
    async fn fetch_weekly_shipments(&self, date: NaiveDate) -> Result<ShipmentWeek>;
}

#[async_trait]
impl<T: StatsClient + ?Sized> StatsClient for Arc<T> {
    async fn fetch_weekly_fpy(&self, anchor: NaiveDate, weeks: u32) -> Result<Vec<WeekAggregate>> {
        (**self).fetch_weekly_fpy(anchor, weeks).await
    }

    async fn fetch_overall_fpy(&self) -> Result<BaselineMap> {
        (**self).fetch_overall_fpy().await
    }

    async fn fetch_weekly_shipments(&self, date: NaiveDate) -> Result<ShipmentWeek> {
        (**self).fetch_weekly_shipments(date).await
    }
}

/// Fetch the shipment weeks for an `n`-week report concurrently.
///
/// Results keep request order (newest first). Any failure fails the report.
pub async fn fetch_report_weeks<C: StatsClient + ?Sized>(
    client: &C,
    anchor: NaiveDate,
    weeks: u32,
) -> Result<Vec<ShipmentWeek>> {
    let requests = report_dates(anchor, weeks)
        .into_iter()
        .map(|date| client.fetch_weekly_shipments(date));
    futures::future::try_join_all(requests).await
}
