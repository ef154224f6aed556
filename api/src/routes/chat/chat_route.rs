use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use responder::validate_user_input;
use tracing::{debug, info};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    middleware_layer::request_id::request_id_of,
    routes::chat::chat_request::ChatRequest,
};

/// `POST /api/chat`: one assistant turn.
///
/// Only input problems are errors here; model and retrieval failures come
/// back as a degraded answer with `metadata.status` set accordingly.
pub async fn chat_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Response> {
    let request_id = request_id_of(&headers);
    let Json(req) = payload?;

    let (question, history) = req.split().ok_or_else(|| AppError::BadRequest {
        message: "Query or messages are required".into(),
        details: Some("Send { \"query\": \"...\" } or { \"messages\": [{ \"role\": \"user\", \"content\": \"...\" }] }".into()),
    })?;
    let question = validate_user_input(question)?;

    debug!(
        request_id = %request_id,
        history = history.len(),
        chars = question.chars().count(),
        "chat_route: start"
    );

    let answer = state
        .responder
        .generate_response(&question, history, req.session_id.clone(), &req.options)
        .await;

    info!(
        request_id = %request_id,
        status = ?answer.metadata.status,
        model = %answer.metadata.model,
        ms = answer.metadata.response_time_ms,
        "chat_route: answered"
    );

    Ok(ApiResponse::success(answer).into_response_with_status(StatusCode::OK))
}
