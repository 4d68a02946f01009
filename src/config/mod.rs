//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (optional TOML file)
//!     → cli.rs (command line / platform environment overrides)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!
//! whitelist file
//!     → loader.rs (one entry per line)
//!     → AddressSet (immutable, shared via Arc)
//! ```
//!
//! # Design Decisions
//! - Config and whitelist are immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::{load_config, load_whitelist, ConfigError};
pub use schema::{
    ListenerConfig, ObservabilityConfig, ProxyConfig, SecurityConfig, TimeoutConfig,
    WhitelistConfig,
};
