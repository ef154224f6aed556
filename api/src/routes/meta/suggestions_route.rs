use axum::{http::StatusCode, response::Response};
use serde::Serialize;

use crate::core::http::response_envelope::ApiResponse;

#[derive(Serialize)]
struct SuggestionsResponse {
    questions: Vec<&'static str>,
}

/// `GET /api/suggestions`: starter questions for an empty chat.
pub async fn suggestions_route() -> Response {
    ApiResponse::success(SuggestionsResponse {
        questions: responder::suggested_questions(),
    })
    .into_response_with_status(StatusCode::OK)
}
