//! System prompt and message list construction.

use ai_llm_service::ChatMessage;
use serde::Deserialize;

use crate::config::ResponderConfig;
use crate::history::CompressedHistory;

/// Per-request presentation options.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatOptions {
    /// Extra instructions appended to the system prompt.
    pub persona_enhancement: Option<String>,
    /// Name to greet the user by.
    pub user_name: Option<String>,
    /// Return sources with the answer (default true).
    pub include_sources: Option<bool>,
}

impl ChatOptions {
    pub fn include_sources(&self) -> bool {
        self.include_sources.unwrap_or(true)
    }
}

/// Instruction appended to the conversation when the tool loop is cut short.
pub const FINALIZE_INSTRUCTION: &str = "You have reached the tool-call limit. Answer the question now using only the tool results above. If they do not contain the answer, say you don't have that information in your records.";

/// System prompt for one turn.
///
/// `context` is set in direct mode (pre-fetched retrieval) and `None` when the
/// model is expected to call tools.
pub fn system_prompt(
    cfg: &ResponderConfig,
    opts: &ChatOptions,
    context: Option<&str>,
    summary: Option<&str>,
) -> String {
    let name = &cfg.persona_name;
    let greeting = match opts.user_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(user) => format!("When greeting, address the user as {user} (e.g., \"Hi {user}!\")."),
        None => "Be friendly and professional.".to_string(),
    };

    let mut prompt = format!(
        "You are {name}, a {title}, answering questions about your own professional background in the first person.\n\n{greeting}\n\n",
        title = cfg.persona_title
    );

    match context {
        None => prompt.push_str(
            "CRITICAL RULES:\n\
             1. ALWAYS use the search_professional_content tool for ANY question about background, experience, projects, or skills\n\
             2. NEVER invent or assume details - only use information from tool results\n\
             3. If tools return no results, say \"I don't have specific information about that in my records\"\n\
             4. ONLY respond without tools for greetings like \"hi\" or \"hello\"\n\n\
             AVAILABLE TOOLS:\n\
             - search_professional_content: Primary tool - use for all background questions\n\
             - get_detailed_experience: Specific company details\n\
             - get_technical_skills: Skills by category\n\
             - get_conversation_context: Follow-up questions",
        ),
        Some(ctx) => {
            prompt.push_str(
                "RULES:\n\
                 1. Answer only from the CONTEXT below\n\
                 2. NEVER invent or assume details\n\
                 3. If the context does not cover the question, say \"I don't have specific information about that in my records\"\n\n\
                 CONTEXT:\n",
            );
            prompt.push_str(ctx);
        }
    }

    if let Some(extra) = opts.persona_enhancement.as_deref().filter(|e| !e.trim().is_empty()) {
        prompt.push_str("\n\nADDITIONAL: ");
        prompt.push_str(extra.trim());
    }

    if let Some(summary) = summary {
        prompt.push_str("\n\nPREVIOUS CONVERSATION SUMMARY: ");
        prompt.push_str(summary);
        prompt.push_str(
            "\n\nNote: Continue naturally from the conversation context while responding to the current question.",
        );
    }

    prompt
}

/// `[system, ...recent history, user question]`.
pub fn build_messages(
    cfg: &ResponderConfig,
    opts: &ChatOptions,
    history: &CompressedHistory<'_>,
    context: Option<&str>,
    question: &str,
) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(history.recent.len() + 2);
    out.push(ChatMessage::system(system_prompt(
        cfg,
        opts,
        context,
        history.summary.as_deref(),
    )));
    out.extend(history.recent.iter().map(|m| m.to_chat()));
    out.push(ChatMessage::user(question));
    out
}

#[cfg(test)]
mod tests {
    use ai_llm_service::ChatRole;

    use super::*;
    use crate::history::HistoryMessage;

    fn cfg() -> ResponderConfig {
        ResponderConfig::default().with_persona("Jordan Avery", "Full-Stack Engineer")
    }

    #[test]
    fn tool_prompt_lists_tools_and_greets_by_name() {
        let opts = ChatOptions {
            user_name: Some("Sam".into()),
            ..Default::default()
        };
        let p = system_prompt(&cfg(), &opts, None, None);
        assert!(p.starts_with("You are Jordan Avery, a Full-Stack Engineer"));
        assert!(p.contains("address the user as Sam"));
        assert!(p.contains("search_professional_content"));
        assert!(!p.contains("CONTEXT:"));
        assert!(!p.contains("PREVIOUS CONVERSATION SUMMARY"));
    }

    #[test]
    fn direct_prompt_embeds_context_persona_and_summary() {
        let opts = ChatOptions {
            persona_enhancement: Some("Keep answers under 80 words.".into()),
            ..Default::default()
        };
        let p = system_prompt(&cfg(), &opts, Some("[1] Skills:\nRust"), Some("Talked about AWS."));
        assert!(p.contains("CONTEXT:\n[1] Skills:\nRust"));
        assert!(p.contains("ADDITIONAL: Keep answers under 80 words."));
        assert_eq!(p.matches("PREVIOUS CONVERSATION SUMMARY: Talked about AWS.").count(), 1);
    }

    #[test]
    fn messages_are_system_history_question() {
        let recent = vec![HistoryMessage::user("hi"), HistoryMessage::assistant("hello")];
        let history = CompressedHistory {
            summary: Some("s".into()),
            recent: &recent,
        };
        let msgs = build_messages(&cfg(), &ChatOptions::default(), &history, None, "What about AWS?");
        let roles: Vec<ChatRole> = msgs.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![ChatRole::System, ChatRole::User, ChatRole::Assistant, ChatRole::User]
        );
        assert_eq!(msgs[3].content, "What about AWS?");
        assert!(msgs[0].content.contains("PREVIOUS CONVERSATION SUMMARY: s"));
    }

    #[test]
    fn include_sources_defaults_to_true() {
        assert!(ChatOptions::default().include_sources());
        let opts: ChatOptions = serde_json::from_str(r#"{"includeSources": false, "userName": "Ada"}"#).unwrap();
        assert!(!opts.include_sources());
        assert_eq!(opts.user_name.as_deref(), Some("Ada"));
    }
}
