//! Conversation history and its compression into a summary segment.

use ai_llm_service::ChatMessage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::LanguageModel;

/// Characters of older history fed to the summarizing model.
const SUMMARY_INPUT_CHARS: usize = 2000;
/// Characters kept from a model-written summary.
const SUMMARY_OUTPUT_CHARS: usize = 300;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
    System,
}

/// One prior message as sent by the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: HistoryRole,
    pub content: String,
}

impl HistoryMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Assistant,
            content: content.into(),
        }
    }

    pub fn to_chat(&self) -> ChatMessage {
        match self.role {
            HistoryRole::User => ChatMessage::user(&self.content),
            HistoryRole::Assistant => ChatMessage::assistant(&self.content),
            HistoryRole::System => ChatMessage::system(&self.content),
        }
    }
}

/// History after compression: an optional summary of the dropped prefix
/// plus the messages kept verbatim.
#[derive(Debug, PartialEq)]
pub struct CompressedHistory<'a> {
    pub summary: Option<String>,
    pub recent: &'a [HistoryMessage],
}

/// First `n` characters of `s` (char-boundary safe).
pub fn truncate_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Splits `history` at `limit`: when longer, all but the last `limit - 1`
/// messages are "older" and get summarized.
pub fn split_history(history: &[HistoryMessage], limit: usize) -> (&[HistoryMessage], &[HistoryMessage]) {
    if history.len() <= limit {
        return (&[], history);
    }
    let keep = limit.saturating_sub(1);
    history.split_at(history.len() - keep)
}

/// Summary built without a model: the first five questions and the opening
/// of the first three answers.
pub fn concatenated_summary(older: &[HistoryMessage]) -> String {
    let topics: Vec<&str> = older
        .iter()
        .filter(|m| m.role == HistoryRole::User)
        .map(|m| m.content.as_str())
        .take(5)
        .collect();
    let points: Vec<&str> = older
        .iter()
        .filter(|m| m.role == HistoryRole::Assistant)
        .map(|m| truncate_chars(&m.content, 200))
        .take(3)
        .collect();
    let points = points.join(" ... ");
    format!(
        "Topics discussed: {}. Key points covered: {}...",
        topics.join(", "),
        truncate_chars(&points, 500)
    )
}

async fn model_summary(model: &dyn LanguageModel, persona: &str, older: &[HistoryMessage]) -> Option<String> {
    let transcript = older
        .iter()
        .map(|m| {
            let role = match m.role {
                HistoryRole::User => "user",
                HistoryRole::Assistant => "assistant",
                HistoryRole::System => "system",
            };
            format!("{role}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = format!(
        "Summarize this conversation between a user and {persona} in 2-3 sentences, focusing on key topics discussed and main points covered. Keep it concise and relevant for maintaining conversation context.\n\nConversation:\n{}",
        truncate_chars(&transcript, SUMMARY_INPUT_CHARS)
    );
    match model
        .summarize("You write short, factual conversation summaries.", &prompt)
        .await
    {
        Ok(text) if !text.trim().is_empty() => {
            Some(truncate_chars(text.trim(), SUMMARY_OUTPUT_CHARS).to_string())
        }
        Ok(_) => {
            warn!("summary model returned nothing; using concatenated summary");
            None
        }
        Err(e) => {
            warn!(error = %e, "summary model failed; using concatenated summary");
            None
        }
    }
}

/// Compresses `history` to at most `limit - 1` verbatim messages plus one summary.
///
/// The model is used only when `use_model` is set and one is available; any
/// model failure falls back to [`concatenated_summary`].
pub async fn compress_history<'a>(
    history: &'a [HistoryMessage],
    limit: usize,
    model: Option<&dyn LanguageModel>,
    use_model: bool,
    persona: &str,
) -> CompressedHistory<'a> {
    let (older, recent) = split_history(history, limit);
    if older.is_empty() {
        return CompressedHistory { summary: None, recent };
    }
    debug!(older = older.len(), recent = recent.len(), "history truncated");

    let summary = match model.filter(|_| use_model) {
        Some(m) => model_summary(m, persona, older).await,
        None => None,
    }
    .unwrap_or_else(|| concatenated_summary(older));

    CompressedHistory {
        summary: Some(summary),
        recent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(n: usize) -> Vec<HistoryMessage> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    HistoryMessage::user(format!("question {i}"))
                } else {
                    HistoryMessage::assistant(format!("answer {i}"))
                }
            })
            .collect()
    }

    #[test]
    fn short_history_is_kept_whole() {
        let h = conversation(6);
        let (older, recent) = split_history(&h, 6);
        assert!(older.is_empty());
        assert_eq!(recent.len(), 6);
    }

    #[test]
    fn long_history_keeps_limit_minus_one() {
        let h = conversation(10);
        let (older, recent) = split_history(&h, 6);
        assert_eq!(older.len(), 5);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[4].content, "answer 9");
    }

    #[test]
    fn concatenated_summary_shape() {
        let h = conversation(4);
        assert_eq!(
            concatenated_summary(&h),
            "Topics discussed: question 0, question 2. Key points covered: answer 1 ... answer 3..."
        );
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    #[tokio::test]
    async fn compress_without_model_uses_concatenation() {
        let h = conversation(9);
        let c = compress_history(&h, 4, None, true, "Jordan").await;
        assert_eq!(c.recent.len(), 3);
        assert!(c.summary.unwrap().starts_with("Topics discussed: question 0"));
    }
}
