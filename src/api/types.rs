//! Request and response types for the API endpoints.

use serde::{Deserialize, Serialize};

/// JSON error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Service liveness response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub name: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Station coordinates response.
#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Period-of-record response.
#[derive(Debug, Serialize)]
pub struct PeriodOfRecordResponse {
    /// First record time, RFC 3339.
    pub start: String,
    /// Last record time, RFC 3339.
    pub end: String,
    pub num_days: i64,
    pub num_years: f64,
}

/// Unit label response.
#[derive(Debug, Serialize)]
pub struct UnitResponse {
    pub unit: Option<String>,
}

/// Declared column type response.
#[derive(Debug, Serialize)]
pub struct DatatypeResponse {
    pub data_type: Option<String>,
}

/// Required time bounds, as YYYYMMDDHHMM integers.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: i64,
    pub end: i64,
}

/// Optional time bounds, as YYYYMMDDHHMM integers.
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

fn default_function() -> String {
    "avg".to_string()
}

fn default_hours() -> i64 {
    1
}

/// Aggregation parameters.
#[derive(Debug, Deserialize)]
pub struct AggregateQuery {
    pub start: i64,
    pub end: i64,
    /// Aggregate function: avg, min, or max.
    #[serde(default = "default_function")]
    pub function: String,
    /// Bin width in hours.
    #[serde(default = "default_hours")]
    pub hours: i64,
}

/// Coordinates for a normals lookup; defaults to the station location.
#[derive(Debug, Deserialize)]
pub struct NormalsQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Month selector for a monthly-normals lookup.
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    /// Month name, case-insensitive.
    pub month: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Month and day selector for a daily-normals lookup.
#[derive(Debug, Deserialize)]
pub struct DayQuery {
    /// Month name, case-insensitive.
    pub month: String,
    /// Day of the month, 1-based.
    pub day: u32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
