//! Command line and platform environment overrides.
//!
//! The platform injects `VCAP_APP_HOST` and `PORT`; operators set
//! `SKIP_SSL_VALIDATION` and optionally `IP_WHITELIST_FILE`. Values given
//! here win over the TOML file, which wins over built-in defaults.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{parse_bool, read_config, ConfigError};
use crate::config::schema::ProxyConfig;
use crate::config::validation::validate_config;

#[derive(Debug, Parser)]
#[command(name = "ip-whitelist-proxy")]
#[command(about = "Route service forwarding requests from whitelisted addresses only", long_about = None)]
pub struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "IP_WHITELIST_PROXY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Interface to listen on.
    #[arg(long, env = "VCAP_APP_HOST")]
    pub host: Option<String>,

    /// Port to listen on. An empty value keeps the configured port.
    #[arg(short, long, env = "PORT")]
    pub port: Option<String>,

    /// Whitelist file, one address or CIDR range per line.
    #[arg(short, long, env = "IP_WHITELIST_FILE")]
    pub whitelist: Option<PathBuf>,

    /// Skip backend certificate validation (1/t/true; anything unrecognized is false).
    #[arg(long, env = "SKIP_SSL_VALIDATION")]
    pub skip_ssl_validation: Option<String>,
}

impl Cli {
    /// Resolve the effective configuration: defaults, then file, then overrides.
    pub fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(host) = self.host.filter(|h| !h.is_empty()) {
            config.listener.host = host;
        }
        if let Some(port) = self.port.filter(|p| !p.is_empty()) {
            config.listener.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        }
        if let Some(path) = self.whitelist {
            config.whitelist.path = path.to_string_lossy().into_owned();
        }
        if let Some(flag) = self.skip_ssl_validation.filter(|f| !f.is_empty()) {
            config.security.skip_ssl_validation = parse_bool(&flag).unwrap_or(false);
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}
