//! Conversation log: one record per assistant turn, kept for the process lifetime.

use chrono::{DateTime, Utc};
use rag_store::SearchResult;
use serde::{Deserialize, Serialize};
use services::uuid::random_id;
use tokio::sync::RwLock;
use tracing::debug;

/// Outcome of a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    /// Model answer, or the rule-based answer when no model is configured.
    Answered,
    /// The model failed and the answer was degraded.
    Error,
    /// Tool loop cut short or a tool call failed.
    Partial,
}

/// A turn as handed to [`ConversationLog::log`]; id and timestamp are assigned there.
#[derive(Clone, Debug, PartialEq)]
pub struct NewTurn {
    pub user_message: String,
    pub assistant_response: String,
    pub status: TurnStatus,
    pub response_time_ms: u64,
    pub session_id: Option<String>,
    pub model_used: Option<String>,
    pub sources: Vec<SearchResult>,
    pub context_used: bool,
    /// Failure text for degraded turns.
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub id: String,
    pub user_message: String,
    pub assistant_response: String,
    pub status: TurnStatus,
    pub response_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    pub sources: Vec<SearchResult>,
    pub context_used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogReceipt {
    pub success: bool,
    pub log_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStats {
    pub total: usize,
    pub answered: usize,
    pub errors: usize,
    pub partial: usize,
    /// Mean response time, rounded to whole milliseconds.
    pub avg_response_time_ms: u64,
}

#[derive(Debug, Default)]
pub struct ConversationLog {
    turns: RwLock<Vec<ConversationTurn>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn.
    pub async fn log(&self, turn: NewTurn) -> LogReceipt {
        let record = ConversationTurn {
            id: random_id("log"),
            user_message: turn.user_message,
            assistant_response: turn.assistant_response,
            status: turn.status,
            response_time_ms: turn.response_time_ms,
            timestamp: Utc::now(),
            session_id: turn.session_id,
            model_used: turn.model_used,
            sources: turn.sources,
            context_used: turn.context_used,
            error: turn.error,
        };
        let log_id = record.id.clone();
        let mut turns = self.turns.write().await;
        turns.push(record);
        debug!(log_id = %log_id, total = turns.len(), "turn logged");
        LogReceipt {
            success: true,
            log_id,
        }
    }

    /// Up to `limit` turns, most recent first.
    pub async fn list(&self, limit: usize) -> Vec<ConversationTurn> {
        self.turns.read().await.iter().rev().take(limit).cloned().collect()
    }

    pub async fn stats(&self) -> LogStats {
        let turns = self.turns.read().await;
        if turns.is_empty() {
            return LogStats::default();
        }
        let count = |s: TurnStatus| turns.iter().filter(|t| t.status == s).count();
        let sum: u64 = turns.iter().map(|t| t.response_time_ms).sum();
        LogStats {
            total: turns.len(),
            answered: count(TurnStatus::Answered),
            errors: count(TurnStatus::Error),
            partial: count(TurnStatus::Partial),
            avg_response_time_ms: (sum as f64 / turns.len() as f64).round() as u64,
        }
    }
}
