//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (stamp marker)
//!     → access_control.rs (claimed origin from X-Forwarded-For)
//!     → whitelist.rs (literal / CIDR membership)
//!     → headers.rs (strip hop-by-hop, append peer to X-Forwarded-For)
//!     → Pass to forwarding
//! ```
//!
//! # Design Decisions
//! - Fail closed: an absent or unreadable origin is denied
//! - The whitelist is immutable once loaded

pub mod access_control;
pub mod headers;
pub mod whitelist;

pub use access_control::{claimed_origin, Authorize, Authorizer};
pub use whitelist::{AddressSet, WhitelistEntry};
