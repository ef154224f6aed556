use std::sync::Arc;

use ai_llm_service::health_service::HealthStatus;
use axum::{extract::State, http::StatusCode, response::Response};
use rag_store::IndexInfo;
use serde::Serialize;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    backend: &'static str,
    index: IndexInfo,
    embedder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    chat_model: Option<String>,
    providers: Vec<HealthStatus>,
}

/// `GET /api/health`: index size plus one probe per configured provider.
pub async fn health_route(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let retriever = state.retriever();
    let index = retriever.index().info().await?;
    let providers = match &state.profiles {
        Some(p) => p.health_all().await,
        None => Vec::new(),
    };
    let chat_model = state
        .profiles
        .as_ref()
        .and_then(|p| p.chat_model().map(str::to_string));

    Ok(ApiResponse::success(HealthResponse {
        backend: retriever.index().backend(),
        index,
        embedder: retriever.embedder().name(),
        chat_model,
        providers,
    })
    .into_response_with_status(StatusCode::OK))
}
