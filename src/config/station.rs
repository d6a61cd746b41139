//! Weather station metadata.

use serde::{Deserialize, Serialize};

/// Station metadata maintained by the host daemon.
///
/// All fields are optional; endpoints serve `null` for anything the
/// operator has not filled in.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StationConfig {
    /// Human-readable station location, e.g. "Backyard, Syracuse NY".
    pub location: Option<String>,
    /// Station latitude in decimal degrees (north positive).
    pub latitude: Option<f64>,
    /// Station longitude in decimal degrees (east positive).
    pub longitude: Option<f64>,
    /// Station elevation in meters above sea level.
    pub altitude_m: Option<f64>,
    /// Hardware type, e.g. "Vantage".
    pub station_type: Option<String>,
}

impl StationConfig {
    /// Returns (latitude, longitude) when both are configured.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}
