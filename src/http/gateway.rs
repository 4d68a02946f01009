//! Forwarding gateway.
//!
//! Per request:
//! ```text
//! stamp marker → resolve target (400) → authorize (403)
//!     → rewrite scheme/host → dispatch once → relay (502/504 on failure)
//! ```
//! Rejections never contact the backend.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request},
    response::{IntoResponse, Response},
};

use crate::http::request::{request_id, ForwardTarget};
use crate::http::response::{relay, GatewayError};
use crate::net::UpstreamClient;
use crate::observability::metrics::{self, Outcome};
use crate::resilience::timeouts::with_deadline;
use crate::security::access_control::{Authorize, X_FORWARDED_FOR};
use crate::security::headers::{append_forwarded_for, stamp_marker, strip_hop_by_hop};

/// Authorizes and forwards requests to the router-supplied target.
pub struct ForwardingGateway {
    authorizer: Arc<dyn Authorize>,
    client: UpstreamClient,
    upstream_timeout: Duration,
}

impl ForwardingGateway {
    pub fn new(
        authorizer: Arc<dyn Authorize>,
        client: UpstreamClient,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            authorizer,
            client,
            upstream_timeout,
        }
    }

    /// Handle one inbound request.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().to_string();
        let request_id = request_id(request.headers()).to_string();

        tracing::info!(
            request_id = %request_id,
            method = %method,
            uri = %request.uri(),
            user_agent = request
                .headers()
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or(""),
            "Proxying request"
        );

        match self.forward(request).await {
            Ok(response) => {
                metrics::record_request(&method, response.status().as_u16(), Outcome::Forwarded, start);
                response
            }
            Err(e) => {
                let outcome = match &e {
                    GatewayError::Forbidden => Outcome::Denied,
                    GatewayError::Upstream(_) | GatewayError::Timeout(_) => {
                        tracing::error!(request_id = %request_id, error = %e, "Upstream request failed");
                        Outcome::UpstreamError
                    }
                    _ => {
                        tracing::warn!(request_id = %request_id, error = %e, "Rejecting request");
                        Outcome::BadRequest
                    }
                };
                metrics::record_request(&method, e.status().as_u16(), outcome, start);
                e.into_response()
            }
        }
    }

    async fn forward(&self, mut request: Request<Body>) -> Result<Response, GatewayError> {
        stamp_marker(request.headers_mut());

        let target = ForwardTarget::from_headers(request.headers())?;

        if !self.authorizer.authorize(request.headers()) {
            tracing::warn!(
                forwarded_for = request
                    .headers()
                    .get(X_FORWARDED_FOR)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or(""),
                "Blocking request"
            );
            return Err(GatewayError::Forbidden);
        }

        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let (mut parts, body) = request.into_parts();
        target.rewrite(&mut parts)?;
        strip_hop_by_hop(&mut parts.headers);
        if let Some(ip) = peer {
            append_forwarded_for(&mut parts.headers, ip);
        }

        tracing::debug!(forwarded_url = %target.url(), "Forwarding request");

        let response = with_deadline(
            self.upstream_timeout,
            self.client.request(Request::from_parts(parts, body)),
        )
        .await?;

        Ok(relay(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::http::StatusCode;

    use crate::config::{SecurityConfig, TimeoutConfig};
    use crate::http::request::X_CF_FORWARDED_URL;
    use crate::net::build_client;

    /// Counts calls and returns a fixed decision.
    struct StubAuthorizer {
        allow: bool,
        calls: AtomicUsize,
    }

    impl Authorize for StubAuthorizer {
        fn authorize(&self, _headers: &axum::http::HeaderMap) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.allow
        }
    }

    fn gateway(allow: bool) -> (ForwardingGateway, Arc<StubAuthorizer>) {
        let stub = Arc::new(StubAuthorizer {
            allow,
            calls: AtomicUsize::new(0),
        });
        let client = build_client(&SecurityConfig::default(), &TimeoutConfig::default()).unwrap();
        let gateway = ForwardingGateway::new(stub.clone(), client, Duration::from_secs(2));
        (gateway, stub)
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_target_is_400_before_authorization() {
        let (gateway, stub) = gateway(true);
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = gateway.handle(request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Bad Request");
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unparsable_target_is_400() {
        let (gateway, stub) = gateway(true);
        let request = Request::builder()
            .uri("/")
            .header(X_CF_FORWARDED_URL, "not a url###")
            .body(Body::empty())
            .unwrap();

        let response = gateway.handle(request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.starts_with("Bad Request: "));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_denied_is_403() {
        let (gateway, stub) = gateway(false);
        let request = Request::builder()
            .uri("/")
            .header(X_CF_FORWARDED_URL, "http://127.0.0.1:1/")
            .header(X_FORWARDED_FOR, "192.168.1.2")
            .body(Body::empty())
            .unwrap();

        let response = gateway.handle(request).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_text(response).await, "Forbidden");
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_502() {
        // Bind then drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (gateway, _stub) = gateway(true);
        let request = Request::builder()
            .uri("/")
            .header(X_CF_FORWARDED_URL, format!("http://{}/", addr))
            .body(Body::empty())
            .unwrap();

        let response = gateway.handle(request).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body_text(response).await.starts_with("Bad Gateway: "));
    }
}
