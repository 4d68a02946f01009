//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, outcome
//! - `proxy_request_duration_seconds` (histogram): time to response headers
//! - `proxy_denied_total` (counter): requests rejected by the whitelist
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// How a request left the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Rejected with 400 before dispatch.
    BadRequest,
    /// Rejected with 403 before dispatch.
    Denied,
    /// Backend contacted and its response relayed.
    Forwarded,
    /// Backend could not be reached or timed out.
    UpstreamError,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::BadRequest => "bad_request",
            Outcome::Denied => "denied",
            Outcome::Forwarded => "forwarded",
            Outcome::UpstreamError => "upstream_error",
        }
    }
}

/// Start the Prometheus scrape endpoint and install it as the global recorder.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, outcome: Outcome, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds", "outcome" => outcome.as_str())
        .record(start.elapsed().as_secs_f64());
    if outcome == Outcome::Denied {
        counter!("proxy_denied_total").increment(1);
    }
}
