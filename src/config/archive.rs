//! Archive database configuration.

use crate::units::UnitSystem;
use serde::Deserialize;

fn default_max_connections() -> u32 {
    5
}

/// Settings for the daemon's SQLite observation archive.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// Path to the SQLite archive database file.
    pub path: String,
    /// Maximum number of connections in the read pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Unit system the archive stores records in: US, METRIC, or METRICWX.
    #[serde(default)]
    pub unit_system: UnitSystem,
}
