//! Application-level configuration.

use serde::Deserialize;

/// Application-level settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Application name used in logs and the `/health` endpoint.
    pub name: String,
    /// Logging verbosity: "debug", "info", "warn", "error".
    pub log_level: Option<String>,
}
