//! HTTP server: JSON API over the store
//!
//! Handlers call the store synchronously. Every operation is a handful of
//! SQLite statements on a pooled connection, well below the point where
//! moving them to a blocking pool would matter.

pub mod api;
pub mod state;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub use state::AppState;

/// GET /health - Liveness probe
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "success": true, "status": "ok", "version": crate::config::VERSION }))
}

/// All routes, without binding
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/get_day_info", post(api::get_day_info))
        .route("/api/update_day_context", post(api::update_day_context))
        .route("/api/toggle_status", post(api::toggle_status))
        .route("/api/add_thread", post(api::add_thread))
        .route("/api/delete_thread", post(api::delete_thread))
        .route("/api/move_thread", post(api::move_thread))
        .route("/api/dashboard", get(api::get_dashboard))
        .route("/api/threads/:id/chains", get(api::get_thread_chains))
        .with_state(state)
}

/// Serve until `shutdown_rx` fires
pub async fn serve(
    bind_addr: SocketAddr,
    state: AppState,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> Result<()> {
    let app = router(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    tracing::info!("HTTP API listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_rx.await.ok();
        })
        .await
        .context("Server error")?;

    tracing::info!("HTTP server shut down gracefully");
    Ok(())
}
