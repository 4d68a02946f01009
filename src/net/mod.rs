//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarded request
//!     → client.rs (shared pooled client, connect timeout)
//!     → tls.rs (validating or accept-any rustls config, for https targets)
//!     → Backend
//! ```
//!
//! # Design Decisions
//! - Plain http and https targets share one client
//! - The transport security policy is fixed at startup

pub mod client;
pub mod tls;

pub use client::{build_client, UpstreamClient};
