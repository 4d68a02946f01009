//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use ip_whitelist_proxy::{AddressSet, HttpServer, ProxyConfig, Shutdown};
use rcgen::{generate_simple_self_signed, CertifiedKey};
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::net::TcpListener;

/// A request as the backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone)]
struct BackendState {
    status: StatusCode,
    body: &'static str,
    delay: Duration,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// A backend that records every request and answers with a fixed response.
pub struct MockBackend {
    pub addr: SocketAddr,
    scheme: &'static str,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    pub async fn start(status: u16, body: &'static str) -> Self {
        Self::start_with_delay(status, body, Duration::ZERO).await
    }

    pub async fn start_with_delay(status: u16, body: &'static str, delay: Duration) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let app = recording_app(status, body, delay, requests.clone());
        let addr = serve(app).await;
        Self {
            addr,
            scheme: "http",
            requests,
        }
    }

    /// Same as [`MockBackend::start`], served over TLS with a self-signed certificate.
    pub async fn start_tls(status: u16, body: &'static str) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let app = recording_app(status, body, Duration::ZERO, requests.clone());

        let CertifiedKey { cert, key_pair } =
            generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let key = PrivateKeyDer::from(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let server_config = rustls::ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_no_client_auth()
            .with_single_cert(vec![cert.der().clone()], key)
            .unwrap();
        let tls = RustlsConfig::from_config(Arc::new(server_config));

        let handle = Handle::new();
        let server = axum_server::bind_rustls("127.0.0.1:0".parse().unwrap(), tls)
            .handle(handle.clone());
        tokio::spawn(async move {
            let _ = server.serve(app.into_make_service()).await;
        });
        let addr = handle.listening().await.unwrap();

        Self {
            addr,
            scheme: "https",
            requests,
        }
    }

    /// Base URL of this backend, e.g. `http://127.0.0.1:40123`.
    pub fn url(&self) -> String {
        format!("{}://{}", self.scheme, self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

fn recording_app(
    status: u16,
    body: &'static str,
    delay: Duration,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
) -> Router {
    let state = BackendState {
        status: StatusCode::from_u16(status).unwrap(),
        body,
        delay,
        requests,
    };
    Router::new().fallback(record).with_state(state)
}

/// Serve an app over plain HTTP on an ephemeral port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn record(State(state): State<BackendState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    state.requests.lock().unwrap().push(RecordedRequest {
        method: parts.method,
        uri: parts.uri.to_string(),
        headers: parts.headers,
        body,
    });

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    (state.status, [("x-backend", "mock")], state.body).into_response()
}

/// A running proxy bound to an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestProxy {
    pub async fn start(whitelist: &[&str]) -> Self {
        Self::start_with_config(whitelist, ProxyConfig::default()).await
    }

    pub async fn start_with_config(whitelist: &[&str], config: ProxyConfig) -> Self {
        let server = HttpServer::new(config, AddressSet::new(whitelist)).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        Self { addr, shutdown }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
