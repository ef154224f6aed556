//! Answers questions about one person's professional background.
//!
//! A [`Responder`] owns the retriever, an optional chat model and the
//! conversation log. With a model it runs either a bounded tool-calling loop
//! ([`ResponderMode::Tools`]) or a single call over pre-fetched context
//! ([`ResponderMode::Direct`]). Without one, or when the model fails, it
//! composes a rule-based answer from retrieved chunks.

pub mod config;
pub mod error;
pub mod fallback;
pub mod history;
pub mod model;
pub mod orchestrator;
pub mod prompt;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod tools;

pub use config::{MAX_CONVERSATION_LIMIT, MIN_CONVERSATION_LIMIT, ResponderConfig, ResponderMode};
pub use error::{MAX_INPUT_CHARS, ResponderError, ValidationError};
pub use history::{HistoryMessage, HistoryRole};
pub use model::{LanguageModel, chat_model};
pub use orchestrator::{AnswerMode, GeneratedResponse, Responder, ResponseMetadata, SourceRef};
pub use prompt::ChatOptions;
pub use tools::ToolKind;

/// Starter questions offered to new visitors.
const SUGGESTED_QUESTIONS: [&str; 6] = [
    "What's your experience with React and Next.js development?",
    "Can you tell me about your full-stack development work?",
    "What technologies and tools do you specialize in?",
    "What's your approach to building scalable web applications?",
    "Can you describe your experience with TypeScript?",
    "What projects have you worked on recently?",
];

pub fn suggested_questions() -> Vec<&'static str> {
    SUGGESTED_QUESTIONS.to_vec()
}

/// Trims `input` and checks it is 1..=[`MAX_INPUT_CHARS`] characters long.
pub fn validate_user_input(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    let len = trimmed.chars().count();
    if len > MAX_INPUT_CHARS {
        return Err(ValidationError::TooLong {
            len,
            max: MAX_INPUT_CHARS,
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_is_trimmed_and_bounded() {
        assert_eq!(validate_user_input("  hi  ").unwrap(), "hi");
        assert_eq!(validate_user_input(" \n\t "), Err(ValidationError::Empty));
        assert!(validate_user_input(&"é".repeat(1000)).is_ok());
        assert_eq!(
            validate_user_input(&"a".repeat(1001)),
            Err(ValidationError::TooLong { len: 1001, max: 1000 })
        );
    }

    #[test]
    fn six_suggestions() {
        let q = suggested_questions();
        assert_eq!(q.len(), 6);
        assert!(q.iter().all(|s| s.ends_with('?')));
    }
}
