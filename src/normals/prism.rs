//! HTTP client for the PRISM normals web service.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::debug;

use crate::normals::{
    ClimateNormals, DailyNormal, DailyNormals, MONTHS, MonthlyNormal, NormalsError,
    NormalsProvider, conus_contains,
};

/// Production PRISM web service endpoint for monthly and annual normals.
const BASE_URL: &str = "https://services.nacse.org/prism/data/public/normals";

/// Production PRISM data-explorer endpoint for daily normals.
const DAILY_URL: &str = "https://www.prism.oregonstate.edu/explorer/dataexplorer/rpc.php";

/// Grid resolution of the monthly normals dataset.
const DEFAULT_RESOLUTION: &str = "4km";

/// HTTP request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Climate elements requested per lookup.
const ELEMENTS: [&str; 4] = ["ppt", "tmin", "tmean", "tmax"];

/// Configuration for creating a PrismProvider.
pub struct PrismConfig {
    pub base_url: String,
    pub daily_url: String,
    pub resolution: String,
}

impl Default for PrismConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            daily_url: DAILY_URL.to_string(),
            resolution: DEFAULT_RESOLUTION.to_string(),
        }
    }
}

/// HTTP client for the PRISM normals web services.
///
/// Monthly normals take one GET per climate element; the service answers
/// with a small CSV of monthly values plus an annual row. Daily normals
/// come from the data-explorer endpoint as a single JSON timeseries.
/// No caching or retry.
pub struct PrismProvider {
    config: PrismConfig,
    http_client: HttpClient,
}

impl PrismProvider {
    /// Creates a new PRISM provider.
    pub fn new(config: PrismConfig) -> Result<Self, NormalsError> {
        let http_client = HttpClient::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Fetches one element's monthly values as (period, value) pairs.
    async fn fetch_element(
        &self,
        element: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<(String, f64)>, NormalsError> {
        let url = format!(
            "{}/{}/{}/{:.4},{:.4}",
            self.config.base_url, self.config.resolution, element, latitude, longitude
        );
        debug!(url = %url, element = %element, "Fetching PRISM normals");

        let body = self
            .http_client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_element_csv(&body)
    }
}

/// Daily-normals timeseries payload from the data-explorer endpoint.
#[derive(Debug, Deserialize)]
struct DailyPayload {
    /// Per-metric day values keyed by lowercase month name.
    daily_normals: HashMap<String, MonthDays>,
}

#[derive(Debug, Deserialize)]
struct MonthDays {
    precip_total: HashMap<String, Option<f64>>,
    temp_min: HashMap<String, Option<f64>>,
    temp_avg: HashMap<String, Option<f64>>,
    temp_max: HashMap<String, Option<f64>>,
}

/// Flattens the per-month day maps into calendar order.
fn flatten_daily(payload: DailyPayload) -> Result<Vec<DailyNormal>, NormalsError> {
    let mut days = Vec::new();
    for month in MONTHS {
        let Some(entry) = payload.daily_normals.get(&month.to_ascii_lowercase()) else {
            continue;
        };

        let mut day_numbers: Vec<u32> = entry
            .precip_total
            .keys()
            .filter_map(|day| day.parse().ok())
            .collect();
        day_numbers.sort_unstable();

        for day in day_numbers {
            let key = day.to_string();
            days.push(DailyNormal {
                month: month.to_string(),
                day,
                precip_total: entry.precip_total.get(&key).copied().flatten(),
                temp_min: entry.temp_min.get(&key).copied().flatten(),
                temp_avg: entry.temp_avg.get(&key).copied().flatten(),
                temp_max: entry.temp_max.get(&key).copied().flatten(),
            });
        }
    }

    if days.is_empty() {
        return Err(NormalsError::Payload(
            "no daily normals rows in response".into(),
        ));
    }

    Ok(days)
}

/// Extracts (period, value) rows from a PRISM CSV payload.
///
/// The payload carries free-form metadata lines before the data, so rows
/// are matched by their first field being a month name or "Annual".
fn parse_element_csv(body: &str) -> Result<Vec<(String, f64)>, NormalsError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record?;
        let Some(period) = record.get(0) else {
            continue;
        };
        if period != "Annual" && !MONTHS.contains(&period) {
            continue;
        }
        let raw = record.get(1).ok_or_else(|| {
            NormalsError::Payload(format!("missing value for period {period}"))
        })?;
        let value: f64 = raw.trim().parse().map_err(|_| {
            NormalsError::Payload(format!("non-numeric value \"{raw}\" for period {period}"))
        })?;
        values.push((period.to_string(), value));
    }

    if values.is_empty() {
        return Err(NormalsError::Payload("no normals rows in response".into()));
    }

    Ok(values)
}

#[async_trait]
impl NormalsProvider for PrismProvider {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<ClimateNormals, NormalsError> {
        if !conus_contains(latitude, longitude) {
            return Err(NormalsError::OutsideConus {
                latitude,
                longitude,
            });
        }

        let mut by_element: HashMap<&str, HashMap<String, f64>> = HashMap::new();
        for element in ELEMENTS {
            let values = self.fetch_element(element, latitude, longitude).await?;
            by_element.insert(element, values.into_iter().collect());
        }

        let normal_for = |period: &str| MonthlyNormal {
            period: period.to_string(),
            precip_mm: by_element.get("ppt").and_then(|m| m.get(period)).copied(),
            tmin_c: by_element.get("tmin").and_then(|m| m.get(period)).copied(),
            tmean_c: by_element.get("tmean").and_then(|m| m.get(period)).copied(),
            tmax_c: by_element.get("tmax").and_then(|m| m.get(period)).copied(),
        };

        Ok(ClimateNormals {
            latitude,
            longitude,
            monthly: MONTHS.iter().map(|month| normal_for(month)).collect(),
            annual: normal_for("Annual"),
        })
    }

    async fn fetch_daily(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<DailyNormals, NormalsError> {
        if !conus_contains(latitude, longitude) {
            return Err(NormalsError::OutsideConus {
                latitude,
                longitude,
            });
        }

        debug!(url = %self.config.daily_url, "Fetching PRISM daily normals");

        let params = [
            ("spares", "800m".to_string()),
            ("interp", "idw".to_string()),
            ("stats", "ppt tmin tmean tmax".to_string()),
            ("units", "eng".to_string()),
            ("range", "daily_normals".to_string()),
            ("stability", "stable".to_string()),
            ("lon", format!("{longitude:.4}")),
            ("lat", format!("{latitude:.4}")),
            ("call", "pp/daily_normals_timeseries".to_string()),
            ("proc", "gridserv".to_string()),
        ];

        let payload: DailyPayload = self
            .http_client
            .post(&self.config.daily_url)
            .form(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(DailyNormals {
            latitude,
            longitude,
            days: flatten_daily(payload)?,
        })
    }
}
