//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};

use crate::api::types::{
    AggregateQuery, DatatypeResponse, DayQuery, HealthResponse, LocationResponse, MonthQuery,
    NormalsQuery, PeriodOfRecordResponse, RangeQuery, StatsQuery, UnitResponse,
};
use crate::api::{ApiError, AppState};
use crate::archive::{AggregateFn, ObsStats, Observation};
use crate::config::StationConfig;
use crate::normals::{
    ClimateNormals, DailyNormal, MonthlyNormal, NormalsError, NormalsProvider, canonical_month,
    conus_contains,
};
use crate::units::standard_unit;

/// Parses a YYYYMMDDHHMM integer into epoch seconds (UTC).
fn parse_compact_timestamp(value: i64, field: &str) -> Result<i64, ApiError> {
    NaiveDateTime::parse_from_str(&value.to_string(), "%Y%m%d%H%M")
        .map(|dt| dt.and_utc().timestamp())
        .map_err(|_| {
            ApiError::BadRequest(format!(
                "{field} must be a YYYYMMDDHHMM timestamp, got {value}"
            ))
        })
}

fn rfc3339(timestamp: i64) -> Result<String, ApiError> {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.to_rfc3339())
        .ok_or_else(|| ApiError::Storage(format!("timestamp {timestamp} out of range")))
}

/// `GET /health` → service liveness.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        name: state.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// `GET /station` → all station metadata.
pub async fn station_metadata(State(state): State<Arc<AppState>>) -> Json<StationConfig> {
    Json(state.station.clone())
}

/// `GET /station/name` → station display name.
pub async fn station_name(State(state): State<Arc<AppState>>) -> Json<Option<String>> {
    Json(state.station.location.clone())
}

/// `GET /station/location` → latitude and longitude.
pub async fn station_location(State(state): State<Arc<AppState>>) -> Json<LocationResponse> {
    Json(LocationResponse {
        latitude: state.station.latitude,
        longitude: state.station.longitude,
    })
}

/// `GET /station/elevation` → elevation in meters.
pub async fn station_elevation(State(state): State<Arc<AppState>>) -> Json<Option<f64>> {
    Json(state.station.altitude_m)
}

/// `GET /station/type` → station hardware type.
pub async fn station_type(State(state): State<Arc<AppState>>) -> Json<Option<String>> {
    Json(state.station.station_type.clone())
}

/// `GET /archive/por` → period of record.
pub async fn period_of_record(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PeriodOfRecordResponse>, ApiError> {
    let por = state
        .archive
        .period_of_record()
        .await?
        .ok_or(ApiError::EmptyArchive)?;

    let num_days = (por.end - por.start) / 86_400;
    let num_years = ((num_days as f64 / 365.25) * 10.0).round() / 10.0;

    Ok(Json(PeriodOfRecordResponse {
        start: rfc3339(por.start)?,
        end: rfc3339(por.end)?,
        num_days,
        num_years,
    }))
}

/// `GET /archive/obs_types` → list of observation types.
pub async fn obs_types(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiError> {
    let columns = state.archive.columns().await?;
    Ok(Json(columns.into_iter().map(|c| c.name).collect()))
}

/// `GET /archive/{obs_type}/data?start&end` → records in range.
pub async fn obs_data(
    State(state): State<Arc<AppState>>,
    Path(obs_type): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<Observation>>, ApiError> {
    let start = parse_compact_timestamp(query.start, "start")?;
    let end = parse_compact_timestamp(query.end, "end")?;
    if start > end {
        return Err(ApiError::BadRequest(format!(
            "start ({}) must be <= end ({})",
            query.start, query.end
        )));
    }

    Ok(Json(state.archive.range(&obs_type, start, end).await?))
}

/// `GET /archive/{obs_type}/data/latest` → most recent record.
pub async fn obs_latest(
    State(state): State<Arc<AppState>>,
    Path(obs_type): Path<String>,
) -> Result<Json<Option<Observation>>, ApiError> {
    Ok(Json(state.archive.latest(&obs_type).await?))
}

/// `GET /archive/{obs_type}/data/aggregate?start&end&function&hours` →
/// time-binned aggregates.
pub async fn obs_aggregate(
    State(state): State<Arc<AppState>>,
    Path(obs_type): Path<String>,
    Query(query): Query<AggregateQuery>,
) -> Result<Json<Vec<Observation>>, ApiError> {
    let start = parse_compact_timestamp(query.start, "start")?;
    let end = parse_compact_timestamp(query.end, "end")?;
    let func = AggregateFn::parse(&query.function)?;
    if query.hours < 1 {
        return Err(ApiError::BadRequest(format!(
            "hours must be >= 1, got {}",
            query.hours
        )));
    }
    let bin_secs = query
        .hours
        .checked_mul(3600)
        .ok_or_else(|| ApiError::BadRequest(format!("hours is too large, got {}", query.hours)))?;

    let rows = state
        .archive
        .aggregate(&obs_type, start, end, func, bin_secs)
        .await?;
    Ok(Json(rows))
}

/// `GET /archive/{obs_type}/data/stats?start&end` → summary statistics.
pub async fn obs_stats(
    State(state): State<Arc<AppState>>,
    Path(obs_type): Path<String>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ObsStats>, ApiError> {
    let start = query
        .start
        .map(|v| parse_compact_timestamp(v, "start"))
        .transpose()?;
    let end = query
        .end
        .map(|v| parse_compact_timestamp(v, "end"))
        .transpose()?;

    Ok(Json(state.archive.stats(&obs_type, start, end).await?))
}

/// `GET /archive/{obs_type}/units` → unit label under the configured
/// unit system, null for unknown observation types.
pub async fn obs_units(
    State(state): State<Arc<AppState>>,
    Path(obs_type): Path<String>,
) -> Json<UnitResponse> {
    Json(UnitResponse {
        unit: standard_unit(state.unit_system, &obs_type).map(String::from),
    })
}

/// `GET /archive/{obs_type}/datatype` → declared column type.
pub async fn obs_datatype(
    State(state): State<Arc<AppState>>,
    Path(obs_type): Path<String>,
) -> Result<Json<DatatypeResponse>, ApiError> {
    let columns = state.archive.columns().await?;
    Ok(Json(DatatypeResponse {
        data_type: columns
            .into_iter()
            .find(|c| c.name == obs_type)
            .map(|c| c.data_type),
    }))
}

fn normals_provider(state: &AppState) -> Result<&Arc<dyn NormalsProvider>, ApiError> {
    state
        .normals
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("normals lookups are disabled".into()))
}

/// Resolves lookup coordinates, falling back to the station location.
///
/// Out-of-CONUS coordinates are rejected here, before any provider call.
fn resolve_coordinates(
    state: &AppState,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<(f64, f64), ApiError> {
    let (latitude, longitude) = match (latitude, longitude) {
        (Some(lat), Some(lon)) => (lat, lon),
        (None, None) => state.station.coordinates().ok_or_else(|| {
            ApiError::BadRequest("station coordinates are not configured".into())
        })?,
        _ => {
            return Err(ApiError::BadRequest(
                "latitude and longitude must be provided together".into(),
            ));
        }
    };

    if !conus_contains(latitude, longitude) {
        return Err(NormalsError::OutsideConus {
            latitude,
            longitude,
        }
        .into());
    }

    Ok((latitude, longitude))
}

async fn monthly_normal_for(
    state: &AppState,
    month: &str,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Json<MonthlyNormal>, ApiError> {
    let provider = normals_provider(state)?;
    let (latitude, longitude) = resolve_coordinates(state, latitude, longitude)?;

    let normals = provider.fetch(latitude, longitude).await?;
    normals
        .monthly
        .into_iter()
        .find(|m| m.period.eq_ignore_ascii_case(month))
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no normals found for {month}")))
}

async fn daily_normal_for(
    state: &AppState,
    month: &str,
    day: u32,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Json<DailyNormal>, ApiError> {
    let provider = normals_provider(state)?;
    let (latitude, longitude) = resolve_coordinates(state, latitude, longitude)?;

    let normals = provider.fetch_daily(latitude, longitude).await?;
    normals
        .days
        .into_iter()
        .find(|d| d.day == day && d.month.eq_ignore_ascii_case(month))
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no normals found for {month} {day}")))
}

/// `GET /normals?latitude&longitude` → 30-year climate normals.
///
/// Coordinates default to the station location; out-of-CONUS lookups are
/// rejected before the provider is consulted.
pub async fn normals(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NormalsQuery>,
) -> Result<Json<ClimateNormals>, ApiError> {
    let provider = normals_provider(&state)?;
    let (latitude, longitude) = resolve_coordinates(&state, query.latitude, query.longitude)?;
    Ok(Json(provider.fetch(latitude, longitude).await?))
}

/// `GET /normals/annual` → annual normals row.
pub async fn normals_annual(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NormalsQuery>,
) -> Result<Json<MonthlyNormal>, ApiError> {
    let provider = normals_provider(&state)?;
    let (latitude, longitude) = resolve_coordinates(&state, query.latitude, query.longitude)?;
    Ok(Json(provider.fetch(latitude, longitude).await?.annual))
}

/// `GET /normals/monthly?month` → normals for one month.
pub async fn normals_monthly(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthlyNormal>, ApiError> {
    let month = canonical_month(&query.month)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown month \"{}\"", query.month)))?;
    monthly_normal_for(&state, month, query.latitude, query.longitude).await
}

/// `GET /normals/monthly/current` → normals for the current month.
pub async fn normals_monthly_current(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NormalsQuery>,
) -> Result<Json<MonthlyNormal>, ApiError> {
    let month = Utc::now().format("%B").to_string();
    monthly_normal_for(&state, &month, query.latitude, query.longitude).await
}

/// `GET /normals/daily?month&day` → normals for one calendar day.
pub async fn normals_daily(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DayQuery>,
) -> Result<Json<DailyNormal>, ApiError> {
    let month = canonical_month(&query.month)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown month \"{}\"", query.month)))?;
    if !(1..=31).contains(&query.day) {
        return Err(ApiError::BadRequest(format!(
            "day must be between 1 and 31, got {}",
            query.day
        )));
    }
    daily_normal_for(&state, month, query.day, query.latitude, query.longitude).await
}

/// `GET /normals/daily/today` → normals for the current calendar day.
pub async fn normals_daily_today(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NormalsQuery>,
) -> Result<Json<DailyNormal>, ApiError> {
    let now = Utc::now();
    let month = now.format("%B").to_string();
    daily_normal_for(&state, &month, now.day(), query.latitude, query.longitude).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use crate::archive::SqliteArchive;
    use crate::normals::{DailyNormals, MONTHS};
    use crate::units::UnitSystem;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    /// 2024-01-01T00:00:00Z.
    const TS0: i64 = 1_704_067_200;

    /// Normals provider stub that counts invocations.
    struct StubNormals {
        calls: AtomicUsize,
    }

    impl StubNormals {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl NormalsProvider for StubNormals {
        async fn fetch(
            &self,
            latitude: f64,
            longitude: f64,
        ) -> Result<ClimateNormals, NormalsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let monthly = MONTHS
                .iter()
                .enumerate()
                .map(|(i, month)| MonthlyNormal {
                    period: month.to_string(),
                    precip_mm: Some(50.0 + i as f64),
                    tmin_c: Some(-3.0),
                    tmean_c: Some(4.0),
                    tmax_c: Some(11.0),
                })
                .collect();
            let annual = MonthlyNormal {
                period: "Annual".to_string(),
                precip_mm: Some(987.0),
                tmin_c: Some(3.0),
                tmean_c: Some(9.0),
                tmax_c: Some(15.0),
            };
            Ok(ClimateNormals {
                latitude,
                longitude,
                monthly,
                annual,
            })
        }

        async fn fetch_daily(
            &self,
            latitude: f64,
            longitude: f64,
        ) -> Result<DailyNormals, NormalsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let days = MONTHS
                .iter()
                .flat_map(|month| {
                    (1..=31).map(move |day| DailyNormal {
                        month: month.to_string(),
                        day,
                        precip_total: Some(0.1 * day as f64),
                        temp_min: Some(20.0),
                        temp_avg: Some(30.0),
                        temp_max: Some(40.0),
                    })
                })
                .collect();
            Ok(DailyNormals {
                latitude,
                longitude,
                days,
            })
        }
    }

    /// Seeds an archive with three hourly records starting at TS0.
    async fn seed_archive(dir: &TempDir) -> String {
        let path = dir
            .path()
            .join("archive.sdb")
            .to_str()
            .expect("utf-8 temp path")
            .to_string();

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))
            .unwrap()
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();

        sqlx::query(
            "CREATE TABLE archive (dateTime INTEGER NOT NULL PRIMARY KEY, outTemp REAL, rain REAL)",
        )
        .execute(&pool)
        .await
        .unwrap();

        for (i, temp) in [10.0_f64, 20.0, 30.0].into_iter().enumerate() {
            sqlx::query("INSERT INTO archive (dateTime, outTemp, rain) VALUES (?, ?, 0.1)")
                .bind(TS0 + i as i64 * 3600)
                .bind(temp)
                .execute(&pool)
                .await
                .unwrap();
        }

        pool.close().await;
        path
    }

    fn test_station() -> StationConfig {
        StationConfig {
            location: Some("Backyard, Syracuse NY".to_string()),
            latitude: Some(43.0481),
            longitude: Some(-76.1474),
            altitude_m: Some(121.0),
            station_type: Some("Vantage".to_string()),
        }
    }

    async fn make_state(dir: &TempDir, normals: Option<Arc<StubNormals>>) -> Arc<AppState> {
        let path = seed_archive(dir).await;
        let archive = SqliteArchive::open(&path, 2).await.unwrap();

        Arc::new(AppState {
            service_name: "wx-data-api".to_string(),
            station: test_station(),
            archive: Arc::new(archive),
            normals: normals.map(|n| n as Arc<dyn NormalsProvider>),
            unit_system: UnitSystem::Us,
            started_at: Instant::now(),
        })
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn health_returns_service_info() {
        let dir = TempDir::new().unwrap();
        let app = router(make_state(&dir, None).await);

        let (status, json) = get(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "wx-data-api");
        assert!(json.get("version").is_some());
    }

    #[tokio::test]
    async fn station_endpoints_serve_metadata() {
        let dir = TempDir::new().unwrap();
        let state = make_state(&dir, None).await;

        let (status, json) = get(router(state.clone()), "/station").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["location"], "Backyard, Syracuse NY");
        assert_eq!(json["station_type"], "Vantage");

        let (_, json) = get(router(state.clone()), "/station/name").await;
        assert_eq!(json, "Backyard, Syracuse NY");

        let (_, json) = get(router(state.clone()), "/station/location").await;
        assert_eq!(json["latitude"], 43.0481);
        assert_eq!(json["longitude"], -76.1474);

        let (_, json) = get(router(state.clone()), "/station/elevation").await;
        assert_eq!(json, 121.0);

        let (_, json) = get(router(state), "/station/type").await;
        assert_eq!(json, "Vantage");
    }

    #[tokio::test]
    async fn obs_types_lists_columns() {
        let dir = TempDir::new().unwrap();
        let app = router(make_state(&dir, None).await);

        let (status, json) = get(app, "/archive/obs_types").await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["dateTime", "outTemp", "rain"]);
    }

    #[tokio::test]
    async fn data_range_filters_records() {
        let dir = TempDir::new().unwrap();
        let app = router(make_state(&dir, None).await);

        let (status, json) = get(
            app,
            "/archive/outTemp/data?start=202401010000&end=202401010100",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["timestamp"], TS0);
        assert_eq!(rows[0]["value"], 10.0);
        assert_eq!(rows[1]["value"], 20.0);
    }

    #[tokio::test]
    async fn data_rejects_malformed_timestamp() {
        let dir = TempDir::new().unwrap();
        let app = router(make_state(&dir, None).await);

        let (status, json) = get(app, "/archive/outTemp/data?start=9999&end=202401010100").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("YYYYMMDDHHMM"));
    }

    #[tokio::test]
    async fn data_rejects_inverted_range() {
        let dir = TempDir::new().unwrap();
        let app = router(make_state(&dir, None).await);

        let (status, _) = get(
            app,
            "/archive/outTemp/data?start=202401010100&end=202401010000",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn latest_returns_newest_record() {
        let dir = TempDir::new().unwrap();
        let app = router(make_state(&dir, None).await);

        let (status, json) = get(app, "/archive/outTemp/data/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["timestamp"], TS0 + 7200);
        assert_eq!(json["value"], 30.0);
    }

    #[tokio::test]
    async fn unknown_observation_returns_404() {
        let dir = TempDir::new().unwrap();
        let app = router(make_state(&dir, None).await);

        let (status, json) = get(app, "/archive/bogus/data/latest").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .contains("unknown observation type"));
    }

    #[tokio::test]
    async fn aggregate_rejects_bad_function() {
        let dir = TempDir::new().unwrap();
        let app = router(make_state(&dir, None).await);

        let (status, _) = get(
            app,
            "/archive/outTemp/data/aggregate?start=202401010000&end=202401010200&function=median",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn aggregate_rejects_zero_hours() {
        let dir = TempDir::new().unwrap();
        let app = router(make_state(&dir, None).await);

        let (status, _) = get(
            app,
            "/archive/outTemp/data/aggregate?start=202401010000&end=202401010200&hours=0",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn aggregate_rejects_oversized_hours() {
        let dir = TempDir::new().unwrap();
        let app = router(make_state(&dir, None).await);

        // A bin width this large would overflow the seconds conversion.
        let (status, json) = get(
            app,
            "/archive/outTemp/data/aggregate?start=202401010000&end=202401010200&hours=3074457345618258603",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("too large"));
    }

    #[tokio::test]
    async fn aggregate_bins_records() {
        let dir = TempDir::new().unwrap();
        let app = router(make_state(&dir, None).await);

        let (status, json) = get(
            app,
            "/archive/outTemp/data/aggregate?start=202401010000&end=202401010200&function=max&hours=3",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["value"], 30.0);
    }

    #[tokio::test]
    async fn stats_without_bounds_covers_archive() {
        let dir = TempDir::new().unwrap();
        let app = router(make_state(&dir, None).await);

        let (status, json) = get(app, "/archive/outTemp/data/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["min"], 10.0);
        assert_eq!(json["max"], 30.0);
        assert_eq!(json["avg"], 20.0);
        assert_eq!(json["count"], 3);
    }

    #[tokio::test]
    async fn units_reflect_configured_system() {
        let dir = TempDir::new().unwrap();
        let state = make_state(&dir, None).await;

        let (status, json) = get(router(state.clone()), "/archive/outTemp/units").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["unit"], "degree_F");

        let (_, json) = get(router(state), "/archive/flux_capacitor/units").await;
        assert_eq!(json["unit"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn datatype_reports_declared_type() {
        let dir = TempDir::new().unwrap();
        let state = make_state(&dir, None).await;

        let (status, json) = get(router(state.clone()), "/archive/outTemp/datatype").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data_type"], "REAL");

        let (_, json) = get(router(state), "/archive/bogus/datatype").await;
        assert_eq!(json["data_type"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn period_of_record_summarizes_archive() {
        let dir = TempDir::new().unwrap();
        let app = router(make_state(&dir, None).await);

        let (status, json) = get(app, "/archive/por").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["start"].as_str().unwrap().starts_with("2024-01-01"));
        assert_eq!(json["num_days"], 0);
    }

    #[tokio::test]
    async fn normals_routes_absent_when_disabled() {
        let dir = TempDir::new().unwrap();
        let state = make_state(&dir, None).await;

        let (status, _) = get(router(state.clone()), "/normals").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get(router(state), "/normals/daily/today").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn normals_default_to_station_coordinates() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubNormals::new());
        let app = router(make_state(&dir, Some(stub.clone())).await);

        let (status, json) = get(app, "/normals").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["latitude"], 43.0481);
        assert_eq!(json["annual"]["precip_mm"], 987.0);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn normals_outside_conus_skips_provider() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubNormals::new());
        let app = router(make_state(&dir, Some(stub.clone())).await);

        let (status, json) = get(app, "/normals?latitude=61.2181&longitude=-149.9003").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .contains("continental United States"));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn normals_annual_serves_annual_row() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubNormals::new());
        let app = router(make_state(&dir, Some(stub)).await);

        let (status, json) = get(app, "/normals/annual").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["period"], "Annual");
        assert_eq!(json["precip_mm"], 987.0);
    }

    #[tokio::test]
    async fn normals_monthly_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubNormals::new());
        let app = router(make_state(&dir, Some(stub)).await);

        let (status, json) = get(app, "/normals/monthly?month=march").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["period"], "March");
        assert_eq!(json["precip_mm"], 52.0);
    }

    #[tokio::test]
    async fn normals_monthly_rejects_unknown_month() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubNormals::new());
        let app = router(make_state(&dir, Some(stub.clone())).await);

        let (status, json) = get(app, "/normals/monthly?month=Smarch").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("unknown month"));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn normals_monthly_current_serves_current_month() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubNormals::new());
        let app = router(make_state(&dir, Some(stub)).await);

        let (status, json) = get(app, "/normals/monthly/current").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["period"], Utc::now().format("%B").to_string());
    }

    #[tokio::test]
    async fn normals_daily_serves_requested_day() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubNormals::new());
        let app = router(make_state(&dir, Some(stub)).await);

        let (status, json) = get(app, "/normals/daily?month=July&day=4").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["month"], "July");
        assert_eq!(json["day"], 4);
        assert_eq!(json["precip_total"], 0.1 * 4.0);
    }

    #[tokio::test]
    async fn normals_daily_rejects_out_of_range_day() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubNormals::new());
        let app = router(make_state(&dir, Some(stub.clone())).await);

        let (status, _) = get(app, "/normals/daily?month=July&day=32").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn normals_daily_today_serves_current_day() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubNormals::new());
        let app = router(make_state(&dir, Some(stub)).await);

        let (status, json) = get(app, "/normals/daily/today").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["month"], Utc::now().format("%B").to_string());
        assert_eq!(json["day"], Utc::now().day());
    }

    #[tokio::test]
    async fn normals_require_both_coordinates() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubNormals::new());
        let app = router(make_state(&dir, Some(stub.clone())).await);

        let (status, _) = get(app, "/normals?latitude=43.0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }
}
