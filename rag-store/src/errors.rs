//! Unified error types for the crate.

use ai_llm_service::AiLlmError;
use serde::Serialize;
use thiserror::Error;

/// Provider failure class, used by callers to decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFailure {
    /// Missing or rejected credentials. Fatal until configuration changes.
    Auth,
    /// Provider asked to slow down. Retryable by the caller.
    RateLimited,
    /// Transport failure, timeout or 5xx.
    Unavailable,
    /// Malformed response or request the provider refused.
    Invalid,
}

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Vector length differs from the dimension the index was built with.
    #[error("vector size mismatch: got {got}, want {want}")]
    DimensionMismatch { got: usize, want: usize },

    /// Provider returned an empty vector.
    #[error("embedding provider returned an empty vector")]
    EmptyEmbedding,

    /// A query ran against an index with no vectors.
    #[error("vector index is empty; initialize it first")]
    EmptyIndex,

    /// Embedding provider failed.
    #[error("embedding provider error ({failure:?}): {message}")]
    Provider {
        failure: ProviderFailure,
        message: String,
    },

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),

    /// JSON parsing / serialization errors.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RagError {
    /// Whether repeating the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RagError::Provider {
                failure: ProviderFailure::RateLimited | ProviderFailure::Unavailable,
                ..
            } | RagError::Qdrant(_)
        )
    }

    /// Whether the failure is a credentials/configuration problem.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RagError::Config(_)
                | RagError::Provider {
                    failure: ProviderFailure::Auth,
                    ..
                }
        )
    }
}

impl From<AiLlmError> for RagError {
    fn from(err: AiLlmError) -> Self {
        let failure = if err.is_auth() {
            ProviderFailure::Auth
        } else if err.is_rate_limited() {
            ProviderFailure::RateLimited
        } else if err.is_retryable() {
            ProviderFailure::Unavailable
        } else if matches!(err, AiLlmError::Config(_)) {
            return RagError::Config(err.to_string());
        } else {
            ProviderFailure::Invalid
        };
        RagError::Provider {
            failure,
            message: err.to_string(),
        }
    }
}
