//! Scrape endpoint for detector metrics.
//!
//! `/metrics` returns the Prometheus text encoding of the registry and
//! `/health` reports liveness with the number of completed frames. The
//! server stops when the shutdown future passed to [`MetricsServer::run`]
//! resolves.

use crate::metrics::{MetricsRegistry, MetricsSnapshot};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Scrape endpoint failures.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// The accept loop failed after binding.
    #[error("metrics endpoint stopped: {0}")]
    Serve(#[source] std::io::Error),
}

/// Listen address for the scrape endpoint.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Socket address; all interfaces on 9090 unless overridden.
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self::with_port(9090)
    }
}

impl MetricsServerConfig {
    /// Listens on all interfaces at `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
        }
    }
}

/// Registry and frame count read by the handlers.
///
/// The detector loop writes through [`MetricsServer::state`].
pub struct MetricsState {
    registry: MetricsRegistry,
    frames: u64,
}

impl MetricsState {
    /// Publishes the totals from `snapshot`.
    pub fn update(&mut self, snapshot: &MetricsSnapshot) {
        self.registry.update(snapshot);
        self.frames = snapshot.frames;
    }

    /// Frames completed as of the last update.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

type SharedState = Arc<RwLock<MetricsState>>;

/// Serves the detector registry over HTTP.
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: SharedState,
}

impl MetricsServer {
    /// Wraps `registry`; nothing is bound until [`run`](Self::run).
    pub fn new(config: MetricsServerConfig, registry: MetricsRegistry) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(MetricsState {
                registry,
                frames: 0,
            })),
        }
    }

    /// Handle the detector loop publishes snapshots through.
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .layer(CorsLayer::permissive())
            .with_state(Arc::clone(&self.state))
    }

    /// Binds, then serves until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.bind_addr;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        tracing::info!(%addr, "Metrics endpoint up");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ServerError::Serve)?;

        tracing::info!(%addr, "Metrics endpoint down");
        Ok(())
    }
}

async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    match state.read().await.registry.encode() {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, PROMETHEUS_TEXT)], body),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("encoding failed: {e}"),
        ),
    }
}

async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let frames = state.read().await.frames;
    (StatusCode::OK, format!("OK frames={frames}"))
}
