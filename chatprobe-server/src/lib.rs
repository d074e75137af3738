//! HTTP surface: `POST /ask` and `GET /health`.
//!
//! Every request launches its own page through the shared [`PageLauncher`]
//! and closes it before responding; nothing is pooled between requests.

pub mod ask;

use axum::{
    routing::{get, post},
    Json, Router,
};
use chatprobe_core::AskPipeline;
use chatprobe_drivers::PageLauncher;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use ask::{AskResponse, SelectorSummary};

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<AskPipeline>,
    launcher: Arc<dyn PageLauncher>,
    artifact_dir: Option<PathBuf>,
    requests: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(pipeline: AskPipeline, launcher: Arc<dyn PageLauncher>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            launcher,
            artifact_dir: None,
            requests: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Save each request's artifacts under `dir`.
    pub fn with_artifacts(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    /// Sequence number for the next request, starting at 1.
    pub(crate) fn next_request(&self) -> u64 {
        self.requests.fetch_add(1, Ordering::Relaxed) + 1
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ask", post(ask::ask))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!(target: "chatprobe.server", %addr, "listening on http://{addr}");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!(target: "chatprobe.server", "shutdown requested"),
        Err(e) => warn!(target: "chatprobe.server", error = %e, "failed to listen for ctrl-c"),
    }
}
