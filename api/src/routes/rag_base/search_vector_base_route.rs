use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use rag_store::SearchOptions;
use responder::validate_user_input;
use tracing::debug;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    middleware_layer::request_id::request_id_of,
    routes::rag_base::{
        search_vector_base_request::SearchVectorBaseRequest,
        search_vector_base_response::SearchVectorBaseResponse,
    },
};

/// `POST /api/search`: raw retriever hits, without the model.
pub async fn search_vector_base_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<SearchVectorBaseRequest>, JsonRejection>,
) -> AppResult<Response> {
    let request_id = request_id_of(&headers);
    let Json(p) = payload?;
    let query = validate_user_input(&p.query)?;

    let cfg = state.retriever().config();
    let min_score = p.min_score.unwrap_or(cfg.min_score);
    if !(-1.0..=1.0).contains(&min_score) {
        return Err(AppError::bad_request("minScore must be within [-1, 1]"));
    }
    let mut opts = SearchOptions::new(p.top_k.unwrap_or(cfg.top_k), min_score);
    if let Some(filter) = p.rag_filter() {
        opts = opts.with_filter(filter);
    }

    debug!(request_id = %request_id, top_k = opts.top_k, min_score, "search_vector_base_route: start");

    let results = state.retriever().search(&query, &opts).await?;

    debug!(request_id = %request_id, hits = results.len(), "search_vector_base_route: success");

    let body = SearchVectorBaseResponse {
        query,
        count: results.len(),
        results,
    };
    Ok(ApiResponse::success(body).into_response_with_status(StatusCode::OK))
}
