//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → timeouts.rs (enforce upstream deadline)
//!     → On failure: 502 Bad Gateway / 504 Gateway Timeout, no retry
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Exactly one dispatch per forwarded request

pub mod timeouts;
