use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use profile_corpus::chunks_from_documents;
use rag_store::{NoopProgress, index_corpus};
use tracing::{debug, info};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    middleware_layer::request_id::request_id_of,
    routes::initialize::initialize_request::InitializeRequest,
};

/// `POST /api/initialize`: embeds and uploads the corpus.
///
/// Idempotent: a populated index is left alone unless `force` is set.
pub async fn initialize_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let request_id = request_id_of(&headers);
    let req = InitializeRequest::parse(&body)?;

    let chunks = match req.documents {
        Some(docs) if docs.is_empty() => {
            return Err(AppError::bad_request("documents must not be empty"));
        }
        Some(docs) => chunks_from_documents(docs)?,
        None => state.default_corpus.clone(),
    };
    debug!(request_id = %request_id, total = chunks.len(), force = req.force, "initialize_route: start");

    let opts = state.indexing.clone().forced(req.force);
    let retriever = state.retriever();

    let _guard = state.index_lock.lock().await;
    let report = index_corpus(
        retriever.index().as_ref(),
        retriever.embedder().as_ref(),
        chunks,
        &opts,
        &NoopProgress,
    )
    .await?;

    info!(
        request_id = %request_id,
        indexed = report.indexed,
        total = report.total,
        skipped = report.skipped,
        "initialize_route: done"
    );

    Ok(ApiResponse::success(report).into_response_with_status(StatusCode::OK))
}
