use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use serde::Serialize;
use tracing::info;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
    middleware_layer::request_id::request_id_of,
};

#[derive(Serialize)]
struct ResetResponse {
    message: String,
    removed: usize,
}

/// `POST /api/reset`: drops every vector so the next initialize starts clean.
pub async fn reset_vector_base_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let index = state.retriever().index();

    let _guard = state.index_lock.lock().await;
    let removed = index.info().await?.count;
    index.reset().await?;

    info!(request_id = %request_id_of(&headers), removed, backend = index.backend(), "vector index cleared");

    Ok(ApiResponse::success(ResetResponse {
        message: "Vector index cleared".into(),
        removed,
    })
    .into_response_with_status(StatusCode::OK))
}
