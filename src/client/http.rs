//! REST client for the QC backend's statistics endpoints

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::stats::{
    BaselineMap, ProductStat, ShipmentSummary, ShipmentWeek, TypeCount, WeekAggregate,
};
use crate::types::UnitCount;

use super::StatsClient;

const USER_AGENT: &str = concat!("fpy-dashboard/", env!("CARGO_PKG_VERSION"));

// Wire formats. Every field the backend may omit or null is optional here.

#[derive(Debug, Deserialize)]
struct WeeklyFpyResponse {
    #[serde(default)]
    weeks: Vec<WeekDto>,
}

#[derive(Debug, Deserialize)]
struct WeekDto {
    start: NaiveDate,
    end: NaiveDate,
    #[serde(default)]
    products: Vec<ProductDto>,
}

#[derive(Debug, Deserialize)]
struct ProductDto {
    part_number: Option<String>,
    model_type: Option<String>,
    #[serde(default)]
    total_units: Option<u64>,
    #[serde(default)]
    first_pass_units: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OverallFpyResponse {
    #[serde(default)]
    parts: Vec<PartYieldDto>,
    total_fpy: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PartYieldDto {
    part_number: Option<String>,
    first_pass_yield: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WeeklyShipmentsResponse {
    #[serde(default)]
    shipments: Vec<ShipmentDto>,
    date_range: DateRangeDto,
}

#[derive(Debug, Deserialize)]
struct DateRangeDto {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct ShipmentDto {
    id: i64,
    job_number: Option<String>,
    customer_name: Option<String>,
    shipping_date: NaiveDate,
    #[serde(default)]
    total_units: Option<u64>,
    #[serde(default)]
    shipped_units_summary: Vec<TypeCountDto>,
}

#[derive(Debug, Deserialize)]
struct TypeCountDto {
    model_type: Option<String>,
    #[serde(default)]
    count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl From<WeekDto> for WeekAggregate {
    fn from(dto: WeekDto) -> Self {
        // Yields are recomputed from the counts; the backend's are rounded.
        // Rows come grouped by part and model; the chart wants one per key.
        let products = ProductStat::merge_by_key(dto.products.into_iter().enumerate().map(
            |(idx, p)| {
                let part = p.part_number.as_deref();
                let model = p.model_type.as_deref();
                ProductStat::new(
                    ProductStat::key_for(part, model, idx),
                    ProductStat::label_for(part, model),
                    UnitCount::new(p.total_units.unwrap_or(0)),
                    UnitCount::new(p.first_pass_units.unwrap_or(0)),
                )
            },
        ));
        Self::new(dto.start, dto.end, products)
    }
}

impl From<OverallFpyResponse> for BaselineMap {
    fn from(dto: OverallFpyResponse) -> Self {
        let parts: HashMap<String, f64> = dto
            .parts
            .into_iter()
            .filter_map(|p| {
                let part = p.part_number.filter(|s| !s.is_empty())?;
                Some((part, p.first_pass_yield?))
            })
            .collect();
        Self::new(parts, dto.total_fpy)
    }
}

impl From<WeeklyShipmentsResponse> for ShipmentWeek {
    fn from(dto: WeeklyShipmentsResponse) -> Self {
        let shipments = dto
            .shipments
            .into_iter()
            .map(|s| {
                let units_by_type: Vec<TypeCount> = s
                    .shipped_units_summary
                    .into_iter()
                    .map(|t| TypeCount {
                        model_type: t.model_type.unwrap_or_default(),
                        count: UnitCount::new(t.count.unwrap_or(0)),
                    })
                    .collect();
                let total_units = s.total_units.map_or_else(
                    || units_by_type.iter().map(|t| t.count).sum(),
                    UnitCount::new,
                );
                ShipmentSummary {
                    id: s.id,
                    job_number: s.job_number.unwrap_or_default(),
                    customer_name: s.customer_name.unwrap_or_default(),
                    shipping_date: s.shipping_date,
                    total_units,
                    units_by_type,
                }
            })
            .collect();
        Self {
            start: dto.date_range.start,
            end: dto.date_range.end,
            shipments,
        }
    }
}

/// Statistics client backed by the QC REST API.
#[derive(Debug, Clone)]
pub struct HttpStatsClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpStatsClient {
    /// Build a client from API settings.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| Error::config("api token contains invalid header characters"))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout()?)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: parse_base_url(&config.base_url)?,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::config(format!("bad endpoint {path}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!(%url, ?query, "GET");
        let response = self.client.get(url).query(query).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Parse the base URL, making sure it ends in `/` so relative joins append.
fn parse_base_url(raw: &str) -> Result<Url> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash).map_err(|e| Error::config(format!("invalid api base_url {raw:?}: {e}")))
}

/// Turn a non-success response into [`Error::Api`], keeping the backend's
/// `error` message when the body has one.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl StatsClient for HttpStatsClient {
    async fn fetch_weekly_fpy(&self, anchor: NaiveDate, weeks: u32) -> Result<Vec<WeekAggregate>> {
        let query = [
            ("anchor_date", anchor.to_string()),
            ("weeks", weeks.to_string()),
        ];
        let body: WeeklyFpyResponse = self.get_json("shipments/fpy/weekly", &query).await?;
        Ok(body.weeks.into_iter().map(WeekAggregate::from).collect())
    }

    async fn fetch_overall_fpy(&self) -> Result<BaselineMap> {
        let body: OverallFpyResponse = self.get_json("shipments/fpy/overall", &[]).await?;
        Ok(body.into())
    }

    async fn fetch_weekly_shipments(&self, date: NaiveDate) -> Result<ShipmentWeek> {
        let query = [("date", date.to_string())];
        let body: WeeklyShipmentsResponse = self.get_json("shipments/weekly", &query).await?;
        Ok(body.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_dto_recomputes_yield() {
        let json = r#"{
            "start": "2024-03-10", "end": "2024-03-16", "label": "x",
            "products": [
                {"part_number": "PN-1", "model_type": "M", "total_units": 3,
                 "first_pass_units": 1, "first_pass_yield": 33.33},
                {"part_number": null, "model_type": "M2", "total_units": 2,
                 "first_pass_units": 2, "first_pass_yield": 100.0},
                {"part_number": null, "model_type": null, "total_units": 0,
                 "first_pass_units": 0, "first_pass_yield": 0}
            ],
            "totals": {"total_units": 5, "first_pass_units": 3, "first_pass_yield": 60.0}
        }"#;
        let dto: WeekDto = serde_json::from_str(json).unwrap();
        let week = WeekAggregate::from(dto);

        assert_eq!(week.products[0].key, "PN-1");
        assert!((week.products[0].first_pass_yield - 100.0 / 3.0).abs() < 1e-12);
        assert_eq!(week.products[1].key, "M2");
        assert_eq!(week.products[2].key, "product-2");
        assert_eq!(week.products[2].label, "Unknown");
        assert_eq!(week.totals.total_units, UnitCount::new(5));
        assert!((week.totals.first_pass_yield - 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_week_dto_merges_rows_sharing_a_key() {
        let json = r#"{
            "start": "2024-03-10", "end": "2024-03-16", "label": "x",
            "products": [
                {"part_number": "PN-1", "model_type": "A", "total_units": 3,
                 "first_pass_units": 3, "first_pass_yield": 100.0},
                {"part_number": null, "model_type": "X", "total_units": 1,
                 "first_pass_units": 0, "first_pass_yield": 0.0},
                {"part_number": "PN-1", "model_type": "B", "total_units": 1,
                 "first_pass_units": 0, "first_pass_yield": 0.0},
                {"part_number": "X", "model_type": null, "total_units": 1,
                 "first_pass_units": 1, "first_pass_yield": 100.0}
            ],
            "totals": {"total_units": 6, "first_pass_units": 4, "first_pass_yield": 66.67}
        }"#;
        let dto: WeekDto = serde_json::from_str(json).unwrap();
        let week = WeekAggregate::from(dto);

        let keys: Vec<&str> = week.products.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["PN-1", "X"]);
        assert_eq!(week.products[0].total_units, UnitCount::new(4));
        assert!((week.products[0].first_pass_yield - 75.0).abs() < 1e-12);
        assert_eq!(week.products[1].total_units, UnitCount::new(2));
        assert!((week.products[1].first_pass_yield - 50.0).abs() < 1e-12);
        assert_eq!(week.totals.total_units, UnitCount::new(6));
    }

    #[test]
    fn test_overall_dto_skips_unnamed_parts() {
        let json = r#"{
            "parts": [
                {"part_number": "PN-1", "first_pass_yield": 92.5},
                {"part_number": "", "first_pass_yield": 50.0},
                {"part_number": null, "first_pass_yield": 40.0}
            ],
            "total_fpy": null
        }"#;
        let dto: OverallFpyResponse = serde_json::from_str(json).unwrap();
        let baseline = BaselineMap::from(dto);
        assert_eq!(baseline.part("PN-1"), Some(92.5));
        assert_eq!(baseline.part(""), None);
        assert_eq!(baseline.total(), None);
    }

    #[test]
    fn test_shipments_dto() {
        let json = r#"{
            "shipments": [{
                "id": 4, "job_number": "J-4", "customer_name": "Acme",
                "shipping_date": "2024-03-12", "status": "shipped", "units": [],
                "total_units": 3,
                "shipped_units_summary": [{"model_type": "X", "count": 2},
                                          {"model_type": "Y", "count": 1}]
            }],
            "date_range": {"start": "2024-03-10", "end": "2024-03-16"}
        }"#;
        let dto: WeeklyShipmentsResponse = serde_json::from_str(json).unwrap();
        let week = ShipmentWeek::from(dto);
        assert_eq!(week.start, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(week.shipments[0].total_units, UnitCount::new(3));
        assert_eq!(week.shipments[0].units_by_type[1].model_type, "Y");
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let url = parse_base_url("http://127.0.0.1:5000/api").unwrap();
        assert_eq!(
            url.join("shipments/fpy/weekly").unwrap().as_str(),
            "http://127.0.0.1:5000/api/shipments/fpy/weekly"
        );
        assert!(matches!(parse_base_url("not a url"), Err(Error::Config(_))));
    }
}
