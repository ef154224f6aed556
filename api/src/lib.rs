//! HTTP surface of the profile assistant.

use std::sync::Arc;

pub mod core;
pub mod error_handler;
pub mod middleware_layer;
pub mod routes;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{info, warn};

pub use crate::core::app_state::{ApiConfig, AppState};
pub use crate::error_handler::{AppError, AppResult};

use crate::{
    middleware_layer::request_id::request_id,
    routes::{
        chat::chat_route::chat_route,
        initialize::initialize_route::initialize_route,
        logs::logs_route::{log_stats_route, logs_route},
        meta::{health_route::health_route, suggestions_route::suggestions_route},
        rag_base::{
            reset_vector_base_route::reset_vector_base_route,
            search_vector_base_route::search_vector_base_route,
        },
    },
};

/// All `/api` routes over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/chat", post(chat_route))
        .route("/api/initialize", post(initialize_route))
        .route("/api/search", post(search_vector_base_route))
        .route("/api/reset", post(reset_vector_base_route))
        .route("/api/logs", get(logs_route))
        .route("/api/logs/stats", get(log_stats_route))
        .route("/api/suggestions", get(suggestions_route))
        .route("/api/health", get(health_route))
        .layer(middleware::from_fn(request_id))
        .with_state(state)
}

/// Binds `cfg.address` and serves until Ctrl+C.
pub async fn start(cfg: &ApiConfig, state: Arc<AppState>) -> AppResult<()> {
    let listener = tokio::net::TcpListener::bind(&cfg.address)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %cfg.address, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
