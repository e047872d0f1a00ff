use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use http::Method;
use img_store::ImgStore;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse};
use tower_http::LatencyUnit;

pub mod api;
mod config;
mod handlers;
mod health;

pub use config::Config;

const API_PREFIX: &str = "/api";
const STATUS_PREFIX: &str = "/_status";

/// Largest accepted upload body
pub const MAX_UPLOAD_SIZE_BYTES: usize = 500 * 1024 * 1024;

/// Shared state for every route: one open store handle.
#[derive(Debug, Clone)]
pub struct ServerState {
    store: Arc<ImgStore>,
}

impl ServerState {
    pub fn new(store: Arc<ImgStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ImgStore {
        &self.store
    }
}

/// Build the router (/_status + /api routes).
pub fn router(config: &Config, state: ServerState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(config.log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    let cors = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST])
        .allow_headers(vec![ACCEPT, ORIGIN, CONTENT_TYPE])
        .allow_origin(Any)
        .allow_credentials(false);

    Router::new()
        .nest(STATUS_PREFIX, health::router(state.clone()))
        .nest(API_PREFIX, api::router(state.clone()))
        .fallback(handlers::not_found_handler)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE_BYTES))
        .layer(cors)
        .layer(trace_layer)
}

/// Run the HTTP server until `shutdown_rx` fires.
pub async fn run(
    config: Config,
    state: ServerState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listen_addr = config.listen_addr;
    let router = router(&config, state);

    tracing::info!(addr = ?listen_addr, "HTTP server listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}
