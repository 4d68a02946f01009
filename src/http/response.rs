//! Response handling and error mapping.
//!
//! # Responsibilities
//! - Map rejection and upstream failures to status codes and plain-text bodies
//! - Relay backend responses without buffering
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Hop-by-hop headers stripped from relayed responses
//! - Backend error statuses are relayed, never rewritten
//! - Backend timeouts result in 504 Gateway Timeout

use std::error::Error as StdError;
use std::time::Duration;

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hyper::body::Incoming;
use thiserror::Error;

use crate::security::headers::strip_hop_by_hop;

/// Every way a request can end without a relayed backend response.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Bad Request")]
    MissingTarget,

    #[error("Bad Request: {0}")]
    InvalidTarget(#[from] url::ParseError),

    #[error("Bad Request: {0}")]
    UndispatchableTarget(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Bad Gateway: {0}")]
    Upstream(String),

    #[error("Gateway Timeout")]
    Timeout(Duration),
}

impl GatewayError {
    /// Wrap a transport error, keeping the full cause chain in the message.
    pub fn upstream(err: &(dyn StdError + 'static)) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        GatewayError::Upstream(message)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingTarget
            | GatewayError::InvalidTarget(_)
            | GatewayError::UndispatchableTarget(_) => StatusCode::BAD_REQUEST,
            GatewayError::Forbidden => StatusCode::FORBIDDEN,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Convert a backend response into one for the caller, streaming the body.
pub fn relay(response: hyper::Response<Incoming>) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}
