//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::security::whitelist::AddressSet;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("invalid port {0:?}")]
    InvalidPort(String),

    #[error("failed to open whitelist {path:?}: {source}")]
    Whitelist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Split whitelist file contents into entries.
///
/// One entry per line, trimmed. Blank lines and `#` comments are skipped.
pub fn parse_whitelist(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read the whitelist file. A missing or unreadable file is fatal.
pub fn load_whitelist(path: &Path) -> Result<AddressSet, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Whitelist {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(AddressSet::new(parse_whitelist(&content)))
}

/// Boolean parsing for platform environment flags.
///
/// Accepts 1, t, T, TRUE, true, True and 0, f, F, FALSE, false, False.
/// Anything else is `None`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
