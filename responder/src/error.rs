//! Typed errors for the responder crate.

use ai_llm_service::AiLlmError;
use thiserror::Error;

/// Maximum question length after trimming, in characters.
pub const MAX_INPUT_CHARS: usize = 1000;

/// Rejected user input. Raised before any external call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("question is empty")]
    Empty,

    #[error("question is {len} characters long; the limit is {max}")]
    TooLong { len: usize, max: usize },
}

impl ValidationError {
    /// Hint shown next to the error.
    pub fn suggestion(&self) -> &'static str {
        "Please enter a question between 1 and 1000 characters"
    }
}

#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("config error: {0}")]
    Config(String),

    /// Chat model call failed.
    #[error("language model error: {0}")]
    Model(#[from] AiLlmError),

    /// The model answered with no text.
    #[error("language model returned an empty answer")]
    EmptyAnswer,
}
