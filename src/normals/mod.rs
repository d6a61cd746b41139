//! Optional 30-year climate-normals lookups.
//!
//! Normals are served by the PRISM climate group for the continental
//! United States only; coordinates outside that footprint are rejected
//! before any network request is made.

mod prism;

pub use prism::{PrismConfig, PrismProvider};

use async_trait::async_trait;
use serde::Serialize;

/// Continental US bounding box (degrees).
const CONUS_LAT_MIN: f64 = 24.396308;
const CONUS_LAT_MAX: f64 = 49.384358;
const CONUS_LON_MIN: f64 = -124.848974;
const CONUS_LON_MAX: f64 = -66.885444;

/// Returns true when the coordinate lies within the continental US.
pub fn conus_contains(latitude: f64, longitude: f64) -> bool {
    (CONUS_LAT_MIN..=CONUS_LAT_MAX).contains(&latitude)
        && (CONUS_LON_MIN..=CONUS_LON_MAX).contains(&longitude)
}

/// Month names in calendar order, as they appear in PRISM payloads.
pub const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Returns the canonical month name for a case-insensitive input.
pub fn canonical_month(name: &str) -> Option<&'static str> {
    MONTHS.iter().find(|m| m.eq_ignore_ascii_case(name)).copied()
}

/// Normals for a single month (or the annual row).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyNormal {
    /// Month name, or "Annual".
    pub period: String,
    /// 30-year mean precipitation (mm).
    pub precip_mm: Option<f64>,
    /// 30-year mean daily minimum temperature (deg C).
    pub tmin_c: Option<f64>,
    /// 30-year mean temperature (deg C).
    pub tmean_c: Option<f64>,
    /// 30-year mean daily maximum temperature (deg C).
    pub tmax_c: Option<f64>,
}

/// 30-year climate normals for a location.
#[derive(Debug, Clone, Serialize)]
pub struct ClimateNormals {
    pub latitude: f64,
    pub longitude: f64,
    /// One entry per month, January through December.
    pub monthly: Vec<MonthlyNormal>,
    /// Annual summary row.
    pub annual: MonthlyNormal,
}

/// Normals for a single calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyNormal {
    /// Month name, e.g. "January".
    pub month: String,
    /// Day of the month, 1-based.
    pub day: u32,
    /// 30-year mean precipitation total for the day.
    pub precip_total: Option<f64>,
    /// 30-year mean daily minimum temperature.
    pub temp_min: Option<f64>,
    /// 30-year mean temperature.
    pub temp_avg: Option<f64>,
    /// 30-year mean daily maximum temperature.
    pub temp_max: Option<f64>,
}

/// Daily-resolution climate normals for a location.
#[derive(Debug, Clone, Serialize)]
pub struct DailyNormals {
    pub latitude: f64,
    pub longitude: f64,
    /// One entry per calendar day, January 1 through December 31.
    pub days: Vec<DailyNormal>,
}

/// NormalsProvider fetches climate normals for a coordinate.
///
/// Behind a trait so tests can substitute a stub and avoid real network
/// calls.
#[async_trait]
pub trait NormalsProvider: Send + Sync {
    /// Monthly and annual normals.
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<ClimateNormals, NormalsError>;

    /// Daily-resolution normals for the same location.
    async fn fetch_daily(&self, latitude: f64, longitude: f64)
    -> Result<DailyNormals, NormalsError>;
}

/// NormalsError represents errors raised during a normals lookup.
#[derive(Debug, thiserror::Error)]
pub enum NormalsError {
    #[error("location {latitude}, {longitude} is outside the continental United States")]
    OutsideConus { latitude: f64, longitude: f64 },

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed normals payload: {0}")]
    Payload(String),
}
