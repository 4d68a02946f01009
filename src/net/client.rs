//! Outbound HTTP(S) client.
//!
//! One client is built at startup and shared by every request. The security
//! policy is fixed into its TLS config, so it cannot change per request.

use std::time::Duration;

use axum::body::Body;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::{SecurityConfig, TimeoutConfig};
use crate::net::tls::{client_config, TlsError};

pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build the shared client for the given policy and timeouts.
pub fn build_client(
    security: &SecurityConfig,
    timeouts: &TimeoutConfig,
) -> Result<UpstreamClient, TlsError> {
    if security.skip_ssl_validation {
        tracing::warn!("Backend certificate validation is disabled");
    }

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

    let https = HttpsConnectorBuilder::new()
        .with_tls_config(client_config(security.skip_ssl_validation)?)
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    Ok(Client::builder(TokioExecutor::new()).build(https))
}
