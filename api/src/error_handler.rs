use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use profile_corpus::CorpusError;
use rag_store::RagError;
use responder::ValidationError;
use thiserror::Error;
use tracing::error;

use crate::core::http::response_envelope::ApiError;

/// Remediation shown when the embedding provider is not usable.
const PROVIDER_HINT: &str = "Set EMBEDDING_PROVIDER and EMBEDDING_MODEL (plus OPENAI_API_KEY or HUGGINGFACE_API_KEY for hosted providers) and restart the server.";

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("{message}")]
    BadRequest {
        message: String,
        details: Option<String>,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    // --- Lower layers ---
    #[error(transparent)]
    Rag(#[from] RagError),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
            details: None,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            // 4xx
            AppError::BadRequest { .. } | AppError::Validation(_) | AppError::Corpus(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Rag(e) if e.is_configuration() => StatusCode::BAD_REQUEST,
            AppError::Rag(RagError::DimensionMismatch { .. }) => StatusCode::BAD_REQUEST,

            // 5xx
            AppError::Rag(e) if e.is_retryable() => StatusCode::BAD_GATEWAY,
            AppError::Rag(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Bind(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest { .. } => "BAD_REQUEST",
            AppError::Validation(_) => "INVALID_INPUT",
            AppError::Corpus(_) => "INVALID_DOCUMENTS",
            AppError::Rag(e) if e.is_configuration() => "CONFIG_ERROR",
            AppError::Rag(RagError::DimensionMismatch { .. }) => "DIMENSION_MISMATCH",
            AppError::Rag(RagError::Provider { .. }) => "PROVIDER_ERROR",
            AppError::Rag(RagError::Qdrant(_)) => "VECTOR_STORE_ERROR",
            AppError::Rag(_) => "RAG_ERROR",
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            AppError::BadRequest { details, .. } => details.clone(),
            AppError::Validation(v) => Some(v.suggestion().to_string()),
            AppError::Rag(e) if e.is_configuration() => Some(PROVIDER_HINT.to_string()),
            AppError::Rag(RagError::DimensionMismatch { .. }) => {
                Some("EMBEDDING_DIM does not match the configured embedding model; reset the index after changing models.".into())
            }
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, code = self.error_code(), "request failed");
        }
        let message = match &self {
            AppError::Rag(e) if e.is_configuration() => {
                format!("Embedding provider is not configured: {e}")
            }
            other => other.to_string(),
        };
        ApiError::new(self.error_code(), message, self.details()).into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest {
            message: "Request body is not valid JSON for this endpoint".into(),
            details: Some(err.body_text()),
        }
    }
}

impl From<axum::extract::rejection::QueryRejection> for AppError {
    fn from(err: axum::extract::rejection::QueryRejection) -> Self {
        AppError::BadRequest {
            message: "Invalid query string".into(),
            details: Some(err.body_text()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest {
            message: "Request body is not valid JSON for this endpoint".into(),
            details: Some(err.to_string()),
        }
    }
}
