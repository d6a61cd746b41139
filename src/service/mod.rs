//! Lifecycle shim bridging the host daemon to the API server.
//!
//! The host calls [`DataApiService::start`] once at startup and
//! [`DataApiService::stop`] at shutdown. The server runs on a background
//! task so the host's collection loop is never blocked, and a bind or
//! archive-open failure only costs the API: data collection continues.

mod error;

pub use error::ServiceError;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::TcpListener;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::api::{self, AppState};
use crate::archive::{ArchiveStore, SqliteArchive};
use crate::config::Config;
use crate::normals::{NormalsProvider, PrismConfig, PrismProvider};

/// How long stop() waits for the server task to drain.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

struct ServerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    archive: Arc<dyn ArchiveStore>,
    addr: SocketAddr,
}

/// Data API service attached to the host daemon's lifecycle.
pub struct DataApiService {
    config: Config,
    runtime: Mutex<Option<ServerHandle>>,
}

impl DataApiService {
    /// Creates a new service from the host configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            runtime: Mutex::new(None),
        }
    }

    /// Starts the API server on a background task.
    ///
    /// Returns immediately without starting anything when the API is
    /// disabled. Archive-open and bind failures are logged and swallowed:
    /// the host must keep collecting data without the API.
    pub async fn start(&self) -> Result<(), ServiceError> {
        let api_cfg = &self.config.data_api;
        if !api_cfg.enabled {
            info!("Data API disabled, skipping server startup");
            return Ok(());
        }

        let mut runtime = self.runtime.lock().await;
        if runtime.is_some() {
            return Err(ServiceError::AlreadyRunning);
        }

        let archive_cfg = self.config.archive.as_ref().ok_or_else(|| {
            ServiceError::Config("archive section is required when data_api is enabled".into())
        })?;

        // Bind before opening the archive so a failed bind leaves no pool
        // behind; a failed archive open drops the listener and its socket.
        let listener =
            match TcpListener::bind((api_cfg.server_host.as_str(), api_cfg.server_port)).await {
                Ok(listener) => listener,
                Err(e) => {
                    error!(
                        host = %api_cfg.server_host,
                        port = api_cfg.server_port,
                        error = %e,
                        "Failed to bind API server, continuing without data API"
                    );
                    return Ok(());
                }
            };
        let addr = listener.local_addr()?;

        let archive: Arc<dyn ArchiveStore> =
            match SqliteArchive::open(&archive_cfg.path, archive_cfg.max_connections).await {
                Ok(archive) => Arc::new(archive),
                Err(e) => {
                    error!(
                        path = %archive_cfg.path,
                        error = %e,
                        "Failed to open archive database, continuing without data API"
                    );
                    return Ok(());
                }
            };

        let normals: Option<Arc<dyn NormalsProvider>> = if api_cfg.prism_normals {
            match PrismProvider::new(PrismConfig::default()) {
                Ok(provider) => Some(Arc::new(provider)),
                Err(e) => {
                    warn!(error = %e, "Failed to create PRISM provider, normals disabled");
                    None
                }
            }
        } else {
            None
        };

        let state = Arc::new(AppState {
            service_name: self.config.app.name.clone(),
            station: self.config.station.clone(),
            archive: Arc::clone(&archive),
            normals,
            unit_system: archive_cfg.unit_system,
            started_at: Instant::now(),
        });
        let app = api::router(state);

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let shutdown = async move {
                // Sender dropped also means shutdown.
                let _ = shutdown_rx.changed().await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(error = %e, "API server error");
            }
        });

        *runtime = Some(ServerHandle {
            shutdown: shutdown_tx,
            task,
            archive,
            addr,
        });

        info!(addr = %addr, "Data API server started");
        Ok(())
    }

    /// Gracefully stops the API server and releases the socket. Idempotent.
    pub async fn stop(&self) -> Result<(), ServiceError> {
        let handle = self.runtime.lock().await.take();
        let Some(handle) = handle else {
            return Ok(());
        };

        info!("Stopping data API server...");
        let _ = handle.shutdown.send(true);

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle.task).await {
            Ok(Ok(())) => info!("Data API server stopped"),
            Ok(Err(e)) => warn!(error = %e, "API server task failed during shutdown"),
            Err(_) => warn!(
                timeout = ?SHUTDOWN_TIMEOUT,
                "Timed out waiting for API server shutdown"
            ),
        }

        if let Err(e) = handle.archive.close().await {
            warn!(error = %e, "Failed to close archive pool");
        }

        Ok(())
    }

    /// Returns the bound server address, or None when no server is running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.runtime.lock().await.as_ref().map(|h| h.addr)
    }

    /// Returns true while the server task is running.
    pub async fn is_running(&self) -> bool {
        self.runtime.lock().await.is_some()
    }
}
