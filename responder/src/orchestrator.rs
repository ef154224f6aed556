//! Per-turn orchestration.
//!
//! One call to [`Responder::generate_response`] runs one of three paths:
//! - tool calling: the model gets retrieval tools and a bounded number of
//!   reasoning steps
//! - direct: context is retrieved first and embedded in the system prompt
//! - fallback: rule-based answer over retrieved chunks, used when no chat
//!   model is configured or the model failed
//!
//! Every turn ends in the conversation log with its status and timing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use ai_llm_service::{ChatMessage, ChatReply, ToolSpec};
use conversation_log::{ConversationLog, NewTurn, TurnStatus};
use rag_store::{Retriever, SearchResult, retrieve::mean_score};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::{ResponderConfig, ResponderMode};
use crate::error::ResponderError;
use crate::fallback::{self, APOLOGY};
use crate::history::{HistoryMessage, compress_history};
use crate::model::LanguageModel;
use crate::prompt::{ChatOptions, FINALIZE_INSTRUCTION, build_messages};
use crate::tools::{self, tool_specs};

/// Source reference returned to clients.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub relevance_score: f32,
}

impl From<&SearchResult> for SourceRef {
    fn from(hit: &SearchResult) -> Self {
        Self {
            id: hit.id.clone(),
            title: hit.metadata.display_title().to_string(),
            kind: if hit.metadata.kind.is_empty() {
                "content".into()
            } else {
                hit.metadata.kind.clone()
            },
            relevance_score: hit.score,
        }
    }
}

/// Which path produced the answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    Tools,
    Direct,
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// Model identity, or `rule-based` / `fallback` / `error`.
    pub model: String,
    pub mode: AnswerMode,
    pub status: TurnStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub tool_calls_count: usize,
    pub tools_used: Vec<String>,
    pub response_time_ms: u64,
    pub log_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedResponse {
    pub response: String,
    pub sources: Vec<SourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    pub metadata: ResponseMetadata,
}

/// Result of one answering path before logging.
struct Draft {
    response: String,
    sources: Vec<SearchResult>,
    confidence: Option<f32>,
    model: String,
    mode: AnswerMode,
    status: TurnStatus,
    tools_used: Vec<String>,
    context_used: bool,
    error: Option<String>,
}

/// Tool loop states.
enum Phase {
    /// Ask the model; it may answer or request tools.
    Reasoning { step: usize },
    /// Run the tools the model requested in `reply`.
    ToolExecuting { step: usize, reply: ChatReply },
    /// Ask once more without tools.
    Finalizing,
    Done(String),
}

/// Merges hits by id, keeping the best score, best first.
fn merge_sources(acc: &mut HashMap<String, SearchResult>, hits: Vec<SearchResult>) {
    for hit in hits {
        match acc.get(&hit.id) {
            Some(prev) if prev.score >= hit.score => {}
            _ => {
                acc.insert(hit.id.clone(), hit);
            }
        }
    }
}

fn ranked(acc: HashMap<String, SearchResult>) -> Vec<SearchResult> {
    let mut out: Vec<SearchResult> = acc.into_values().collect();
    out.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    out
}

fn answer_text(reply: ChatReply) -> Result<String, ResponderError> {
    reply
        .content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or(ResponderError::EmptyAnswer)
}

/// Turns a question (plus history) into an answer; see the module docs.
pub struct Responder {
    retriever: Retriever,
    model: Option<Arc<dyn LanguageModel>>,
    log: Arc<ConversationLog>,
    cfg: ResponderConfig,
    tools: Vec<ToolSpec>,
}

impl Responder {
    pub fn new(
        retriever: Retriever,
        model: Option<Arc<dyn LanguageModel>>,
        log: Arc<ConversationLog>,
        cfg: ResponderConfig,
    ) -> Self {
        let tools = tool_specs(&cfg.persona_name);
        Self {
            retriever,
            model,
            log,
            cfg,
            tools,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn log(&self) -> &Arc<ConversationLog> {
        &self.log
    }

    pub fn config(&self) -> &ResponderConfig {
        &self.cfg
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Answers `user_message`. Never fails: provider and retrieval errors
    /// degrade to the rule-based answer or the apology string, and the turn
    /// is logged either way.
    #[instrument(skip_all, fields(session = session_id.as_deref().unwrap_or("-"), history = history.len()))]
    pub async fn generate_response(
        &self,
        user_message: &str,
        history: &[HistoryMessage],
        session_id: Option<String>,
        opts: &ChatOptions,
    ) -> GeneratedResponse {
        let started = Instant::now();

        let draft = match &self.model {
            None => self.fallback_answer(user_message, TurnStatus::Answered, "rule-based", None).await,
            Some(model) => {
                let attempt = match self.cfg.mode {
                    ResponderMode::Tools => self.tool_answer(model.as_ref(), user_message, history, opts).await,
                    ResponderMode::Direct => self.direct_answer(model.as_ref(), user_message, history, opts).await,
                };
                match attempt {
                    Ok(draft) => draft,
                    Err(e) => {
                        warn!(error = %e, model = %model.name(), "model path failed; answering from rules");
                        self.fallback_answer(user_message, TurnStatus::Error, "fallback", Some(e.to_string()))
                            .await
                    }
                }
            }
        };

        let response_time_ms = started.elapsed().as_millis() as u64;
        let receipt = self
            .log
            .log(NewTurn {
                user_message: user_message.to_string(),
                assistant_response: draft.response.clone(),
                status: draft.status,
                response_time_ms,
                session_id: session_id.clone(),
                model_used: Some(draft.model.clone()),
                sources: draft.sources.clone(),
                context_used: draft.context_used,
                error: draft.error.clone(),
            })
            .await;

        info!(
            status = ?draft.status,
            mode = ?draft.mode,
            model = %draft.model,
            sources = draft.sources.len(),
            tools = draft.tools_used.len(),
            response_time_ms,
            "turn answered"
        );

        GeneratedResponse {
            response: draft.response,
            sources: if opts.include_sources() {
                draft.sources.iter().map(SourceRef::from).collect()
            } else {
                Vec::new()
            },
            confidence: draft.confidence,
            metadata: ResponseMetadata {
                model: draft.model,
                mode: draft.mode,
                status: draft.status,
                session_id,
                tool_calls_count: draft.tools_used.len(),
                tools_used: draft.tools_used,
                response_time_ms,
                log_id: receipt.log_id,
                error: draft.error,
            },
        }
    }

    async fn tool_answer(
        &self,
        model: &dyn LanguageModel,
        question: &str,
        history: &[HistoryMessage],
        opts: &ChatOptions,
    ) -> Result<Draft, ResponderError> {
        let compressed = compress_history(
            history,
            self.cfg.conversation_limit,
            Some(model),
            self.cfg.enable_summary,
            &self.cfg.persona_name,
        )
        .await;
        let mut messages = build_messages(&self.cfg, opts, &compressed, None, question);

        let mut sources = HashMap::new();
        let mut tools_used = Vec::new();
        let mut partial = false;
        let mut phase = Phase::Reasoning { step: 0 };

        let text = loop {
            phase = match phase {
                Phase::Reasoning { step } if step >= self.cfg.max_tool_steps => {
                    warn!(steps = step, "tool step limit reached; forcing an answer");
                    partial = true;
                    Phase::Finalizing
                }
                Phase::Reasoning { step } => {
                    let reply = model.complete(&messages, &self.tools).await?;
                    if reply.wants_tools() {
                        Phase::ToolExecuting { step: step + 1, reply }
                    } else {
                        Phase::Done(answer_text(reply)?)
                    }
                }
                Phase::ToolExecuting { step, reply } => {
                    let calls = reply.tool_calls;
                    messages.push(ChatMessage::assistant_tool_calls(reply.content, calls.clone()));
                    for call in &calls {
                        debug!(tool = %call.name, step, "executing tool");
                        let outcome = tools::execute(call, question, &self.retriever).await;
                        partial |= outcome.failed;
                        tools_used.push(call.name.clone());
                        messages.push(ChatMessage::tool_result(call, outcome.to_message()));
                        merge_sources(&mut sources, outcome.sources);
                    }
                    Phase::Reasoning { step }
                }
                Phase::Finalizing => {
                    messages.push(ChatMessage::system(FINALIZE_INSTRUCTION));
                    let reply = model.complete(&messages, &[]).await?;
                    Phase::Done(answer_text(reply)?)
                }
                Phase::Done(text) => break text,
            };
        };

        let sources = ranked(sources);
        Ok(Draft {
            response: text,
            confidence: (!sources.is_empty()).then(|| mean_score(&sources)),
            context_used: !tools_used.is_empty(),
            sources,
            model: model.name(),
            mode: AnswerMode::Tools,
            status: if partial { TurnStatus::Partial } else { TurnStatus::Answered },
            tools_used,
            error: None,
        })
    }

    async fn direct_answer(
        &self,
        model: &dyn LanguageModel,
        question: &str,
        history: &[HistoryMessage],
        opts: &ChatOptions,
    ) -> Result<Draft, ResponderError> {
        let (ctx, status) = match self.retriever.get_context(question).await {
            Ok(ctx) => (ctx, TurnStatus::Answered),
            Err(e) => {
                warn!(error = %e, "retrieval failed; answering without context");
                (self.retriever.build_context(Vec::new()), TurnStatus::Partial)
            }
        };
        let compressed = compress_history(
            history,
            self.cfg.conversation_limit,
            Some(model),
            self.cfg.enable_summary,
            &self.cfg.persona_name,
        )
        .await;
        let messages = build_messages(&self.cfg, opts, &compressed, Some(&ctx.context), question);
        let reply = model.complete(&messages, &[]).await?;

        Ok(Draft {
            response: answer_text(reply)?,
            confidence: Some(ctx.confidence),
            context_used: !ctx.sources.is_empty(),
            sources: ctx.sources,
            model: model.name(),
            mode: AnswerMode::Direct,
            status,
            tools_used: Vec::new(),
            error: None,
        })
    }

    async fn fallback_answer(
        &self,
        question: &str,
        status: TurnStatus,
        model: &str,
        error: Option<String>,
    ) -> Draft {
        match self.retriever.get_context(question).await {
            Ok(ctx) => Draft {
                response: fallback::compose(question, &ctx.sources),
                confidence: Some(ctx.confidence),
                context_used: !ctx.sources.is_empty(),
                sources: ctx.sources,
                model: model.to_string(),
                mode: AnswerMode::Fallback,
                status,
                tools_used: Vec::new(),
                error,
            },
            Err(e) => {
                warn!(error = %e, "retrieval failed; returning apology");
                let error = match error {
                    Some(model_err) => format!("{model_err}; {e}"),
                    None => e.to_string(),
                };
                Draft {
                    response: APOLOGY.to_string(),
                    sources: Vec::new(),
                    confidence: None,
                    model: "error".into(),
                    mode: AnswerMode::Fallback,
                    status: TurnStatus::Error,
                    tools_used: Vec::new(),
                    context_used: false,
                    error: Some(error),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ai_llm_service::{ChatRole, ToolCall};
    use rag_store::testing::{FailingEmbedder, KeywordEmbedder};
    use rag_store::{Chunk, ChunkMetadata, EmbeddedChunk, Embedder, InMemoryIndex, RagConfig, VectorIndex};
    use serde_json::json;

    use super::*;
    use crate::testing::{ScriptedModel, Step};

    const VOCAB: &[&str] = &["react", "skills", "component", "aws", "deployment", "experience", "project", "dashboard"];

    async fn retriever() -> Retriever {
        let embedder = Arc::new(KeywordEmbedder::new(VOCAB));
        let index = Arc::new(InMemoryIndex::new());
        let chunks = [
            ("skills:react", "skills", "React skills: component design"),
            ("exp:aws", "experience", "AWS deployment experience"),
            ("proj:x", "projects", "Project X dashboard"),
        ];
        let mut items = Vec::new();
        for (id, category, content) in chunks {
            let chunk = Chunk {
                id: id.into(),
                content: content.into(),
                metadata: ChunkMetadata::new(category, "doc"),
            };
            let embedding = embedder.embed(content).await.unwrap();
            items.push(EmbeddedChunk { chunk, embedding });
        }
        index.upsert(items).await.unwrap();
        Retriever::new(index, embedder, RagConfig::default())
    }

    fn responder(retriever: Retriever, model: Option<Arc<dyn LanguageModel>>, cfg: ResponderConfig) -> Responder {
        Responder::new(retriever, model, Arc::new(ConversationLog::new()), cfg)
    }

    fn search_call(query: &str) -> ChatReply {
        ChatReply {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_0".into(),
                name: "search_professional_content".into(),
                arguments: json!({ "query": query }),
            }],
        }
    }

    #[tokio::test]
    async fn no_model_answers_from_rules() {
        let r = responder(retriever().await, None, ResponderConfig::default());
        let out = r
            .generate_response("What AWS experience exists?", &[], Some("s1".into()), &ChatOptions::default())
            .await;
        assert!(out.response.starts_with("Here's my professional experience:"));
        assert_eq!(out.metadata.status, TurnStatus::Answered);
        assert_eq!(out.metadata.model, "rule-based");
        assert_eq!(out.sources[0].id, "exp:aws");
        assert_eq!(r.log().stats().await.answered, 1);
    }

    #[tokio::test]
    async fn tool_loop_collects_sources_then_answers() {
        let model = Arc::new(ScriptedModel::new(vec![
            Step::Reply(search_call("aws deployment experience")),
            Step::Reply(ChatReply::text("I deployed services on AWS.")),
        ]));
        let r = responder(retriever().await, Some(model.clone()), ResponderConfig::default());
        let out = r
            .generate_response("Tell me about AWS", &[], None, &ChatOptions::default())
            .await;

        assert_eq!(out.response, "I deployed services on AWS.");
        assert_eq!(out.metadata.mode, AnswerMode::Tools);
        assert_eq!(out.metadata.status, TurnStatus::Answered);
        assert_eq!(out.metadata.tools_used, vec!["search_professional_content"]);
        assert_eq!(out.sources[0].id, "exp:aws");

        let second_call = &model.calls()[1];
        let roles: Vec<ChatRole> = second_call.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::System, ChatRole::User, ChatRole::Assistant, ChatRole::Tool]);
    }

    #[tokio::test]
    async fn step_cap_forces_a_partial_answer() {
        let cfg = ResponderConfig {
            max_tool_steps: 2,
            ..ResponderConfig::default()
        };
        let model = Arc::new(ScriptedModel::new(vec![
            Step::Reply(search_call("aws deployment experience")),
            Step::Reply(search_call("aws deployment")),
            Step::Reply(ChatReply::text("Forced answer.")),
        ]));
        let r = responder(retriever().await, Some(model.clone()), cfg);
        let out = r.generate_response("AWS?", &[], None, &ChatOptions::default()).await;

        assert_eq!(out.response, "Forced answer.");
        assert_eq!(out.metadata.status, TurnStatus::Partial);
        assert_eq!(out.metadata.tool_calls_count, 2);
        // Deduplicated by id.
        assert_eq!(out.sources.iter().filter(|s| s.id == "exp:aws").count(), 1);
        assert_eq!(model.tool_counts(), vec![4, 4, 0]);
    }

    #[tokio::test]
    async fn model_failure_degrades_to_rules_with_error_status() {
        let model = Arc::new(ScriptedModel::new(vec![Step::Fail]));
        let r = responder(retriever().await, Some(model), ResponderConfig::default());
        let out = r
            .generate_response("Which React skills?", &[], None, &ChatOptions::default())
            .await;
        assert!(!out.response.is_empty());
        assert_eq!(out.metadata.status, TurnStatus::Error);
        assert_eq!(out.metadata.model, "fallback");
        assert!(out.metadata.error.is_some());
        assert_eq!(r.log().stats().await.errors, 1);
    }

    #[tokio::test]
    async fn model_and_retrieval_failure_yield_apology() {
        let index = Arc::new(InMemoryIndex::new());
        index
            .upsert(vec![EmbeddedChunk {
                chunk: Chunk {
                    id: "a".into(),
                    content: "a".into(),
                    metadata: ChunkMetadata::default(),
                },
                embedding: vec![1.0],
            }])
            .await
            .unwrap();
        let broken = Retriever::new(index, Arc::new(FailingEmbedder::rate_limited()), RagConfig::default());
        let r = responder(
            broken,
            Some(Arc::new(ScriptedModel::new(vec![Step::Fail]))),
            ResponderConfig::default(),
        );
        let out = r.generate_response("Anything?", &[], None, &ChatOptions::default()).await;
        assert_eq!(out.response, APOLOGY);
        assert_eq!(out.metadata.status, TurnStatus::Error);
        assert!(out.sources.is_empty());
    }

    #[tokio::test]
    async fn direct_mode_embeds_context_and_truncates_history() {
        let cfg = ResponderConfig {
            mode: ResponderMode::Direct,
            conversation_limit: 3,
            ..ResponderConfig::default()
        };
        let model = Arc::new(ScriptedModel::new(vec![Step::Reply(ChatReply::text("React, mostly."))]));
        let r = responder(retriever().await, Some(model.clone()), cfg);
        let history: Vec<HistoryMessage> = (0..6)
            .map(|i| {
                if i % 2 == 0 {
                    HistoryMessage::user(format!("q{i}"))
                } else {
                    HistoryMessage::assistant(format!("a{i}"))
                }
            })
            .collect();

        let out = r
            .generate_response("React skills component?", &history, None, &ChatOptions::default())
            .await;
        assert_eq!(out.response, "React, mostly.");
        assert_eq!(out.metadata.mode, AnswerMode::Direct);
        assert!(out.confidence.unwrap() > 0.7);

        let sent = &model.calls()[0];
        // system + (limit - 1) recent + question
        assert_eq!(sent.len(), 4);
        assert!(sent[0].content.contains("CONTEXT:\n[1] skills:\nReact skills"));
        assert_eq!(sent[0].content.matches("PREVIOUS CONVERSATION SUMMARY").count(), 1);
        assert_eq!(sent[1].content, "q4");
        assert_eq!(sent[3].content, "React skills component?");
    }

    #[tokio::test]
    async fn sources_can_be_suppressed() {
        let r = responder(retriever().await, None, ResponderConfig::default());
        let opts = ChatOptions {
            include_sources: Some(false),
            ..Default::default()
        };
        let out = r.generate_response("AWS deployment", &[], None, &opts).await;
        assert!(out.sources.is_empty());
        assert_eq!(r.log().list(1).await[0].sources.len(), 1);
    }
}
