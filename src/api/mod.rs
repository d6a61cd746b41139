//! HTTP API over the station archive and metadata.
//!
//! Read-only endpoints: `/station/*` for metadata, `/archive/*` for
//! observation queries, `/normals` for PRISM climate normals (only when
//! enabled), and `/health` for liveness.

mod error;
mod handlers;
mod types;

pub use error::ApiError;

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};

use crate::archive::ArchiveStore;
use crate::config::StationConfig;
use crate::normals::NormalsProvider;
use crate::units::UnitSystem;

/// Shared state for all request handlers.
pub struct AppState {
    /// Service name reported by `/health`.
    pub service_name: String,
    /// Station metadata from the host config.
    pub station: StationConfig,
    /// Archive query backend.
    pub archive: Arc<dyn ArchiveStore>,
    /// Normals backend; None when prism_normals is disabled.
    pub normals: Option<Arc<dyn NormalsProvider>>,
    /// Unit system the archive stores records in.
    pub unit_system: UnitSystem,
    /// Server start time, for uptime reporting.
    pub started_at: Instant,
}

/// Builds the axum router with all API routes.
///
/// The `/normals` route is registered only when a normals provider is
/// present, so disabled lookups cannot trigger outbound traffic.
pub fn router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route("/station", get(handlers::station_metadata))
        .route("/station/name", get(handlers::station_name))
        .route("/station/location", get(handlers::station_location))
        .route("/station/elevation", get(handlers::station_elevation))
        .route("/station/type", get(handlers::station_type))
        .route("/archive/por", get(handlers::period_of_record))
        .route("/archive/obs_types", get(handlers::obs_types))
        .route("/archive/{obs_type}/data", get(handlers::obs_data))
        .route("/archive/{obs_type}/data/latest", get(handlers::obs_latest))
        .route(
            "/archive/{obs_type}/data/aggregate",
            get(handlers::obs_aggregate),
        )
        .route("/archive/{obs_type}/data/stats", get(handlers::obs_stats))
        .route("/archive/{obs_type}/units", get(handlers::obs_units))
        .route("/archive/{obs_type}/datatype", get(handlers::obs_datatype));

    if state.normals.is_some() {
        router = router
            .route("/normals", get(handlers::normals))
            .route("/normals/annual", get(handlers::normals_annual))
            .route("/normals/monthly", get(handlers::normals_monthly))
            .route(
                "/normals/monthly/current",
                get(handlers::normals_monthly_current),
            )
            .route("/normals/daily", get(handlers::normals_daily))
            .route("/normals/daily/today", get(handlers::normals_daily_today));
    }

    // Read-only API consumed by dashboards on other origins.
    router
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .with_state(state)
}
