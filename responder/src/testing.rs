//! Scripted language model (enabled by `cfg(test)` or the `test-util` feature).

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use ai_llm_service::{AiLlmError, ChatMessage, ChatReply, ToolSpec};
use futures::future::BoxFuture;

use crate::model::LanguageModel;

/// One scripted completion.
#[derive(Clone, Debug)]
pub enum Step {
    Reply(ChatReply),
    /// Fails like a provider timeout.
    Fail,
}

/// Replays `steps` in order and records what it was sent. Once the script
/// runs out every call fails.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
    tool_counts: Mutex<Vec<usize>>,
    summary: Option<String>,
}

impl ScriptedModel {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            ..Self::default()
        }
    }

    /// Answers every `summarize` call with `text`.
    pub fn with_summary(mut self, text: impl Into<String>) -> Self {
        self.summary = Some(text.into());
        self
    }

    /// Message lists received by `complete`, in call order.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of tools offered on each `complete` call.
    pub fn tool_counts(&self) -> Vec<usize> {
        self.tool_counts.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl LanguageModel for ScriptedModel {
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        tools: &'a [ToolSpec],
    ) -> BoxFuture<'a, Result<ChatReply, AiLlmError>> {
        Box::pin(async move {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(messages.to_vec());
            }
            if let Ok(mut counts) = self.tool_counts.lock() {
                counts.push(tools.len());
            }
            let next = self.steps.lock().ok().and_then(|mut s| s.pop_front());
            match next {
                Some(Step::Reply(reply)) => Ok(reply),
                Some(Step::Fail) | None => Err(AiLlmError::Timeout(Duration::from_secs(30))),
            }
        })
    }

    fn summarize<'a>(&'a self, _system: &'a str, _prompt: &'a str) -> BoxFuture<'a, Result<String, AiLlmError>> {
        Box::pin(async move {
            self.summary
                .clone()
                .ok_or(AiLlmError::Timeout(Duration::from_secs(30)))
        })
    }

    fn name(&self) -> String {
        "scripted".into()
    }
}
