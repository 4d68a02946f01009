//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the forwarding handler
//! - Wire up middleware (tracing, request ID)
//! - Build the shared authorizer and upstream client
//! - Bind server to listener with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request},
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::gateway::ForwardingGateway;
use crate::http::request::{MakeRequestUuid, X_REQUEST_ID};
use crate::net::{build_client, tls::TlsError};
use crate::security::{AddressSet, Authorizer};

/// HTTP server for the whitelisting proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and whitelist.
    pub fn new(config: ProxyConfig, whitelist: AddressSet) -> Result<Self, TlsError> {
        let authorizer = Arc::new(Authorizer::new(Arc::new(whitelist)));
        let client = build_client(&config.security, &config.timeouts)?;
        let gateway = ForwardingGateway::new(
            authorizer,
            client,
            Duration::from_secs(config.timeouts.upstream_secs),
        );

        let router = Self::build_router(Arc::new(gateway));
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(gateway: Arc<ForwardingGateway>) -> Router {
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(gateway)
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
    }

    /// The configured router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            skip_ssl_validation = self.config.security.skip_ssl_validation,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

async fn proxy_handler(
    State(gateway): State<Arc<ForwardingGateway>>,
    request: Request<Body>,
) -> Response {
    gateway.handle(request).await
}
