//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Resolve the forwarding target from `X-CF-Forwarded-Url`
//! - Rewrite scheme, authority and Host to point at the target
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Path, query, method, headers and body are carried over untouched

use axum::http::{
    header,
    request::Parts,
    uri::{Authority, PathAndQuery, Scheme},
    HeaderMap, HeaderValue, Request, Uri, Version,
};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::{Position, Url};
use uuid::Uuid;

use crate::http::response::GatewayError;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Header in which the router passes the original destination.
pub const X_CF_FORWARDED_URL: &str = "x-cf-forwarded-url";

/// Issues a fresh UUID v4 for requests that arrive without an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID for log correlation.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Where a request should be forwarded.
#[derive(Debug, Clone)]
pub struct ForwardTarget {
    url: Url,
    scheme: Scheme,
    authority: Authority,
}

impl ForwardTarget {
    /// Resolve the target from the router-supplied header.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, GatewayError> {
        let raw = match headers.get(X_CF_FORWARDED_URL) {
            None => return Err(GatewayError::MissingTarget),
            Some(value) if value.is_empty() => return Err(GatewayError::MissingTarget),
            Some(value) => value.to_str().map_err(|_| {
                GatewayError::UndispatchableTarget("forwarded URL is not valid ASCII".to_string())
            })?,
        };
        Self::parse(raw)
    }

    /// Parse an absolute http(s) URL.
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        let url = Url::parse(raw)?;

        let scheme = match url.scheme() {
            "http" => Scheme::HTTP,
            "https" => Scheme::HTTPS,
            other => {
                return Err(GatewayError::UndispatchableTarget(format!(
                    "unsupported scheme {:?}",
                    other
                )))
            }
        };

        if url.host_str().map_or(true, str::is_empty) {
            return Err(GatewayError::UndispatchableTarget(
                "forwarded URL has no host".to_string(),
            ));
        }
        let authority = url[Position::BeforeHost..Position::AfterPort]
            .parse::<Authority>()
            .map_err(|e| GatewayError::UndispatchableTarget(e.to_string()))?;

        Ok(Self {
            url,
            scheme,
            authority,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Point the request at this target, keeping its path and query.
    pub fn rewrite(&self, parts: &mut Parts) -> Result<(), GatewayError> {
        let mut uri_parts = std::mem::take(&mut parts.uri).into_parts();
        uri_parts.scheme = Some(self.scheme.clone());
        uri_parts.authority = Some(self.authority.clone());
        if uri_parts.path_and_query.is_none() {
            uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        parts.uri = Uri::from_parts(uri_parts)
            .map_err(|e| GatewayError::UndispatchableTarget(e.to_string()))?;

        let host = HeaderValue::from_str(self.authority.as_str())
            .map_err(|e| GatewayError::UndispatchableTarget(e.to_string()))?;
        parts.headers.insert(header::HOST, host);

        // The upstream connection is negotiated independently of the inbound one.
        parts.version = Version::HTTP_11;
        Ok(())
    }
}
