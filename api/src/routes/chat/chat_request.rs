use responder::{ChatOptions, HistoryMessage, HistoryRole};
use serde::Deserialize;

/// Body of `POST /api/chat`: either `{ query }` or `{ messages }`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub options: ChatOptions,
}

impl ChatRequest {
    /// The question and the history preceding it.
    ///
    /// With `query`, every message is history. Otherwise the last user
    /// message is the question and everything before it is history.
    pub fn split(&self) -> Option<(&str, &[HistoryMessage])> {
        if let Some(q) = self.query.as_deref().filter(|q| !q.trim().is_empty()) {
            return Some((q, &self.messages));
        }
        let last_user = self.messages.iter().rposition(|m| m.role == HistoryRole::User)?;
        Some((&self.messages[last_user].content, &self.messages[..last_user]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_wins_and_messages_become_history() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"query":"AWS?","messages":[{"role":"user","content":"hi"},{"role":"assistant","content":"hello"}]}"#,
        )
        .unwrap();
        let (q, history) = req.split().unwrap();
        assert_eq!(q, "AWS?");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn last_user_message_is_the_question() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"messages":[{"role":"user","content":"first"},{"role":"assistant","content":"reply"},{"role":"user","content":"second"}],"sessionId":"s-1"}"#,
        )
        .unwrap();
        let (q, history) = req.split().unwrap();
        assert_eq!(q, "second");
        assert_eq!(history.len(), 2);
        assert_eq!(req.session_id.as_deref(), Some("s-1"));
    }

    #[test]
    fn nothing_to_answer() {
        assert!(ChatRequest::default().split().is_none());
        let req: ChatRequest =
            serde_json::from_str(r#"{"query":"  ","messages":[{"role":"assistant","content":"x"}]}"#).unwrap();
        assert!(req.split().is_none());
    }
}
