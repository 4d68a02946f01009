//! IP Whitelisting Route Service
//!
//! Sits between the platform router and an application. Every request
//! carries its real destination in `X-CF-Forwarded-Url`; it is forwarded
//! there only if the client at the head of `X-Forwarded-For` is whitelisted.
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │              IP WHITELIST PROXY              │
//!   Router                │  ┌─────────┐   ┌──────────┐   ┌───────────┐ │
//!   ──────────────────────┼─▶│ gateway │──▶│authorizer│──▶│ whitelist │ │
//!   X-CF-Forwarded-Url    │  └────┬────┘   └──────────┘   └───────────┘ │
//!   X-Forwarded-For       │       │ allowed                              │
//!                         │       ▼                                      │
//!   ◀─────────────────────┼── relay ◀── upstream client (rustls) ◀───────┼── Backend
//!                         └──────────────────────────────────────────────┘
//! ```

use clap::Parser;

use ip_whitelist_proxy::config::Cli;
use ip_whitelist_proxy::lifecycle::startup;
use ip_whitelist_proxy::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init_logging(&config.observability);

    tracing::info!("ip-whitelist-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        whitelist = %config.whitelist.path,
        skip_ssl_validation = config.security.skip_ssl_validation,
        connect_timeout_secs = config.timeouts.connect_secs,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if let Err(e) = startup::run(config).await {
        tracing::error!(error = %e, "Fatal error");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
