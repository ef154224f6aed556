//! Chat-model capability used by the orchestrator.

use std::sync::Arc;

use ai_llm_service::{AiLlmError, ChatMessage, ChatReply, LlmServiceProfiles, ToolSpec};
use futures::future::BoxFuture;

/// A chat model that may call tools.
pub trait LanguageModel: Send + Sync {
    /// One chat completion. `tools` may be empty.
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        tools: &'a [ToolSpec],
    ) -> BoxFuture<'a, Result<ChatReply, AiLlmError>>;

    /// Short plain-text completion for history summaries.
    fn summarize<'a>(
        &'a self,
        system: &'a str,
        prompt: &'a str,
    ) -> BoxFuture<'a, Result<String, AiLlmError>>;

    /// Model identity recorded with every turn.
    fn name(&self) -> String;
}

impl LanguageModel for LlmServiceProfiles {
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        tools: &'a [ToolSpec],
    ) -> BoxFuture<'a, Result<ChatReply, AiLlmError>> {
        Box::pin(self.chat(messages, tools))
    }

    fn summarize<'a>(
        &'a self,
        system: &'a str,
        prompt: &'a str,
    ) -> BoxFuture<'a, Result<String, AiLlmError>> {
        Box::pin(LlmServiceProfiles::summarize(self, system, prompt))
    }

    fn name(&self) -> String {
        self.chat_model().unwrap_or("none").to_string()
    }
}

/// The chat profile as a [`LanguageModel`], or `None` when no chat model is configured.
pub fn chat_model(profiles: &Arc<LlmServiceProfiles>) -> Option<Arc<dyn LanguageModel>> {
    profiles
        .has_chat()
        .then(|| Arc::clone(profiles) as Arc<dyn LanguageModel>)
}
