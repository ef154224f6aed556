use std::sync::Arc;

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::Response,
};
use conversation_log::{ConversationTurn, LogStats};
use serde::{Deserialize, Serialize};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
};

const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
struct LogsResponse {
    count: usize,
    logs: Vec<ConversationTurn>,
}

#[derive(Serialize)]
struct StatsResponse {
    stats: LogStats,
}

/// `GET /api/logs?limit=N`: most recent turns first.
pub async fn logs_route(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> AppResult<Response> {
    let Query(q) = query?;
    let logs = state.log().list(q.limit.unwrap_or(DEFAULT_LIMIT)).await;
    Ok(ApiResponse::success(LogsResponse {
        count: logs.len(),
        logs,
    })
    .into_response_with_status(StatusCode::OK))
}

/// `GET /api/logs/stats`.
pub async fn log_stats_route(State(state): State<Arc<AppState>>) -> Response {
    let stats = state.log().stats().await;
    ApiResponse::success(StatsResponse { stats }).into_response_with_status(StatusCode::OK)
}
