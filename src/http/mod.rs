//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → gateway.rs (marker, target, authorization)
//!     → request.rs (resolve X-CF-Forwarded-Url, rewrite scheme/host)
//!     → [net::client dispatches to backend]
//!     → response.rs (relay, or map failure to status)
//!     → Send to client
//! ```

pub mod gateway;
pub mod request;
pub mod response;
pub mod server;

pub use gateway::ForwardingGateway;
pub use request::{ForwardTarget, X_CF_FORWARDED_URL, X_REQUEST_ID};
pub use response::GatewayError;
pub use server::HttpServer;
