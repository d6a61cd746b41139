//! Data API server configuration.

use serde::Deserialize;

/// HTTP server settings for the data API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataApiConfig {
    /// Whether the API server starts with the host daemon.
    pub enabled: bool,
    /// Bind address; "0.0.0.0" binds all interfaces.
    pub server_host: String,
    /// Listen port.
    pub server_port: u16,
    /// Enables PRISM climate-normals lookups (continental US only).
    pub prism_normals: bool,
}

impl Default for DataApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            server_host: "localhost".to_string(),
            server_port: 8000,
            prism_normals: false,
        }
    }
}
