//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Load the whitelist and report inert entries
//! - Start the metrics endpoint when enabled
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::net::{AddrParseError, SocketAddr};
use std::path::Path;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_whitelist, ConfigError, ProxyConfig};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::net::tls::TlsError;
use crate::observability::metrics;
use crate::security::AddressSet;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("invalid metrics address: {0}")]
    MetricsAddress(#[from] AddrParseError),

    #[error("failed to start metrics endpoint: {0}")]
    Metrics(#[from] BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Load the whitelist named by the config, warning about inert range entries.
pub fn prepare_whitelist(config: &ProxyConfig) -> Result<AddressSet, ConfigError> {
    let whitelist = load_whitelist(Path::new(&config.whitelist.path))?;
    for entry in whitelist.malformed_entries() {
        tracing::warn!(entry = %entry, "Ignoring malformed whitelist range");
    }
    tracing::info!(
        path = %config.whitelist.path,
        entries = whitelist.len(),
        "Whitelist loaded"
    );
    Ok(whitelist)
}

/// Bring the proxy up and serve until a termination signal arrives.
pub async fn run(config: ProxyConfig) -> Result<(), StartupError> {
    let whitelist = prepare_whitelist(&config)?;

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let address = config.listener.bind_address();
    let server = HttpServer::new(config, whitelist)?;

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    tracing::info!(address = %address, "Starting ip-whitelist proxy");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(&shutdown);
    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}
