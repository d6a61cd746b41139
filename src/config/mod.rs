//! Configuration loading and validation for the data API service.
//!
//! Uses serde_yaml to load the host daemon's YAML configuration file and
//! validates the sections this service depends on before anything starts.

mod app;
mod archive;
mod data_api;
mod error;
mod station;

pub use app::AppConfig;
pub use archive::ArchiveConfig;
pub use data_api::DataApiConfig;
pub use error::ConfigError;
pub use station::StationConfig;

use serde::Deserialize;
use std::fs;

/// Root configuration structure shared with the host daemon.
///
/// Required sections: app. Optional sections: station, archive, data_api
/// (the latter two become required once the data API is enabled).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Application-level settings like name and log level.
    pub app: AppConfig,
    /// Weather station metadata served by the `/station/*` endpoints.
    #[serde(default)]
    pub station: StationConfig,
    /// Archive database settings (required when the API is enabled).
    pub archive: Option<ArchiveConfig>,
    /// Data API server settings.
    #[serde(default)]
    pub data_api: DataApiConfig,
}

impl Config {
    /// Load and validate configuration from a YAML file at the given path.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.app.name.is_empty() {
            return Err(ConfigError::Validation("app.name is required".into()));
        }

        let api = &self.data_api;
        if !api.enabled {
            return Ok(());
        }

        if api.server_host.is_empty() {
            return Err(ConfigError::Validation(
                "data_api.server_host must not be empty".into(),
            ));
        }

        if api.server_port == 0 {
            return Err(ConfigError::Validation(
                "data_api.server_port must be positive".into(),
            ));
        }

        match &self.archive {
            None => {
                return Err(ConfigError::Validation(
                    "archive section is required when data_api is enabled".into(),
                ));
            }
            Some(archive) => {
                if archive.path.is_empty() {
                    return Err(ConfigError::Validation(
                        "archive.path must not be empty".into(),
                    ));
                }
                if archive.max_connections == 0 {
                    return Err(ConfigError::Validation(
                        "archive.max_connections must be positive".into(),
                    ));
                }
            }
        }

        // The /normals endpoint falls back to the station coordinates, so
        // they must exist when PRISM lookups are on.
        if api.prism_normals && self.station.coordinates().is_none() {
            return Err(ConfigError::Validation(
                "station.latitude and station.longitude are required when data_api.prism_normals is enabled"
                    .into(),
            ));
        }

        Ok(())
    }
}
