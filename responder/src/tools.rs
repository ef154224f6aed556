//! Retrieval tools offered to the chat model.

use std::str::FromStr;

use ai_llm_service::{ToolCall, ToolSpec};
use rag_store::{Retriever, SearchOptions, SearchResult};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

/// Results requested by the broad search tool.
const BROAD_TOP_K: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolKind {
    SearchProfessionalContent,
    GetDetailedExperience,
    GetTechnicalSkills,
    GetConversationContext,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::SearchProfessionalContent,
        ToolKind::GetDetailedExperience,
        ToolKind::GetTechnicalSkills,
        ToolKind::GetConversationContext,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::SearchProfessionalContent => "search_professional_content",
            ToolKind::GetDetailedExperience => "get_detailed_experience",
            ToolKind::GetTechnicalSkills => "get_technical_skills",
            ToolKind::GetConversationContext => "get_conversation_context",
        }
    }

    /// Title used for hits without one.
    fn fallback_title(self) -> &'static str {
        match self {
            ToolKind::SearchProfessionalContent => "Professional Content",
            ToolKind::GetDetailedExperience => "Experience",
            ToolKind::GetTechnicalSkills => "Skills",
            ToolKind::GetConversationContext => "Context",
        }
    }

    fn spec(self, persona: &str) -> ToolSpec {
        let (description, parameters) = match self {
            ToolKind::SearchProfessionalContent => (
                format!(
                    "Search through {persona}'s professional background: work experience, technical skills, projects, achievements and education."
                ),
                json!({
                    "type": "object",
                    "properties": {
                        "query": {"type": "string", "description": "The search query - use the user's exact question or key terms"}
                    },
                    "required": ["query"]
                }),
            ),
            ToolKind::GetDetailedExperience => (
                format!("Get detailed information about {persona}'s work experience at specific companies"),
                json!({
                    "type": "object",
                    "properties": {
                        "company": {"type": "string", "description": "Optional company name to filter by"}
                    }
                }),
            ),
            ToolKind::GetTechnicalSkills => (
                format!("Get {persona}'s technical skills, optionally for one category"),
                json!({
                    "type": "object",
                    "properties": {
                        "category": {"type": "string", "description": "Optional skill category to filter by"}
                    }
                }),
            ),
            ToolKind::GetConversationContext => (
                "Get contextual information for the current conversation topic".to_string(),
                json!({
                    "type": "object",
                    "properties": {
                        "topic": {"type": "string", "description": "The topic or question to get relevant context for"}
                    },
                    "required": ["topic"]
                }),
            ),
        };
        ToolSpec {
            name: self.name().to_string(),
            description,
            parameters,
        }
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| format!("unknown tool `{s}`"))
    }
}

/// Specs for every tool, described in terms of `persona`.
pub fn tool_specs(persona: &str) -> Vec<ToolSpec> {
    ToolKind::ALL.into_iter().map(|k| k.spec(persona)).collect()
}

/// What a tool returned, both for the model and for source accounting.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolOutcome {
    pub content: String,
    pub sources: Vec<SearchResult>,
    /// The tool could not run (bad name or retrieval failure).
    pub failed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolPayload<'a> {
    content: &'a str,
    results_found: usize,
    sources: Vec<SourceLine<'a>>,
}

#[derive(Serialize)]
struct SourceLine<'a> {
    id: &'a str,
    title: &'a str,
    score: f32,
}

impl ToolOutcome {
    /// JSON message body returned to the model.
    pub fn to_message(&self) -> String {
        let payload = ToolPayload {
            content: &self.content,
            results_found: self.sources.len(),
            sources: self
                .sources
                .iter()
                .map(|s| SourceLine {
                    id: &s.id,
                    title: s.metadata.display_title(),
                    score: s.score,
                })
                .collect(),
        };
        serde_json::to_string(&payload).unwrap_or_else(|_| self.content.clone())
    }

    fn failed(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sources: Vec::new(),
            failed: true,
        }
    }
}

fn str_arg(args: &Value, key: &str) -> Option<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Retrieval query and score settings for one call.
fn plan(kind: ToolKind, args: &Value, question: &str, retriever: &Retriever) -> (String, SearchOptions, String) {
    let cfg = retriever.config();
    match kind {
        ToolKind::SearchProfessionalContent => (
            str_arg(args, "query").unwrap_or_else(|| question.to_string()),
            SearchOptions::new(BROAD_TOP_K, cfg.min_score),
            "No specific information found in professional records.".into(),
        ),
        ToolKind::GetDetailedExperience => {
            let company = str_arg(args, "company");
            let query = match &company {
                Some(c) => format!("work experience at {c} job responsibilities achievements projects"),
                None => "work experience career history job positions responsibilities achievements".into(),
            };
            let empty = match &company {
                Some(c) => format!("No specific information found about experience at {c}."),
                None => "No detailed work experience information found.".into(),
            };
            (query, SearchOptions::new(cfg.top_k, cfg.narrow_min_score), empty)
        }
        ToolKind::GetTechnicalSkills => {
            let category = str_arg(args, "category");
            let query = match &category {
                Some(c) => format!("{c} technical skills programming languages frameworks tools expertise"),
                None => "technical skills programming languages frameworks tools expertise proficiency".into(),
            };
            let empty = match &category {
                Some(c) => format!("No specific information found about {c} skills."),
                None => "No technical skills information found.".into(),
            };
            (query, SearchOptions::new(cfg.top_k, cfg.narrow_min_score), empty)
        }
        ToolKind::GetConversationContext => (
            str_arg(args, "topic").unwrap_or_else(|| question.to_string()),
            SearchOptions::new(cfg.top_k, cfg.min_score),
            "No specific contextual information found.".into(),
        ),
    }
}

/// Runs one tool call against the retriever. Never fails; failures are
/// reported in the outcome so the model can carry on.
pub async fn execute(call: &ToolCall, question: &str, retriever: &Retriever) -> ToolOutcome {
    let kind = match call.name.parse::<ToolKind>() {
        Ok(kind) => kind,
        Err(e) => {
            warn!(tool = %call.name, "model requested an unknown tool");
            return ToolOutcome::failed(e);
        }
    };
    let (query, opts, empty) = plan(kind, &call.arguments, question, retriever);

    match retriever.search(&query, &opts).await {
        Ok(hits) if hits.is_empty() => {
            info!(tool = kind.name(), "tool found nothing");
            ToolOutcome {
                content: empty,
                sources: hits,
                failed: false,
            }
        }
        Ok(hits) => {
            info!(tool = kind.name(), results = hits.len(), "tool executed");
            let content = hits
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    let title = match h.metadata.display_title() {
                        "Professional Content" => kind.fallback_title(),
                        t => t,
                    };
                    format!("[{}] {title}: {}", i + 1, h.content)
                })
                .collect::<Vec<_>>()
                .join("\n\n");
            ToolOutcome {
                content,
                sources: hits,
                failed: false,
            }
        }
        Err(e) => {
            warn!(tool = kind.name(), error = %e, "tool retrieval failed");
            ToolOutcome::failed(format!("Error running {}.", kind.name()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rag_store::testing::{FailingEmbedder, KeywordEmbedder};
    use rag_store::{Chunk, ChunkMetadata, EmbeddedChunk, Embedder, InMemoryIndex, RagConfig, VectorIndex};

    use super::*;

    async fn retriever() -> Retriever {
        let embedder = Arc::new(KeywordEmbedder::new(&["react", "aws", "skills", "technical"]));
        let index = Arc::new(InMemoryIndex::new());
        let mut meta = ChunkMetadata::new("experience", "result");
        meta.title = Some("Cloud Migration".into());
        let chunk = Chunk {
            id: "exp:aws".into(),
            content: "AWS experience migrating dispatch".into(),
            metadata: meta,
        };
        let embedding = embedder.embed(&chunk.content).await.unwrap();
        index.upsert(vec![EmbeddedChunk { chunk, embedding }]).await.unwrap();
        Retriever::new(index, embedder, RagConfig::default())
    }

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall {
            id: "call_0".into(),
            name: name.into(),
            arguments: args,
        }
    }

    #[test]
    fn specs_cover_all_four_tools() {
        let specs = tool_specs("Jordan");
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "search_professional_content",
                "get_detailed_experience",
                "get_technical_skills",
                "get_conversation_context"
            ]
        );
        assert!(specs[0].description.contains("Jordan's"));
        assert_eq!(specs[0].parameters["required"][0], "query");
    }

    #[tokio::test]
    async fn search_formats_numbered_hits() {
        let r = retriever().await;
        let out = execute(
            &call("search_professional_content", json!({"query": "aws experience"})),
            "ignored",
            &r,
        )
        .await;
        assert!(!out.failed);
        assert_eq!(out.sources.len(), 1);
        assert_eq!(out.content, "[1] Cloud Migration: AWS experience migrating dispatch");
        let msg: Value = serde_json::from_str(&out.to_message()).unwrap();
        assert_eq!(msg["resultsFound"], 1);
    }

    #[tokio::test]
    async fn missing_query_falls_back_to_question_and_empty_results_are_explained() {
        let r = retriever().await;
        let out = execute(&call("get_conversation_context", json!({})), "react", &r).await;
        assert!(!out.failed);
        assert!(out.sources.is_empty());
        assert_eq!(out.content, "No specific contextual information found.");

        let out = execute(&call("get_detailed_experience", json!({"company": "Globex"})), "q", &r).await;
        assert_eq!(out.content, "No specific information found about experience at Globex.");
    }

    #[tokio::test]
    async fn unknown_tool_and_retrieval_errors_are_failures() {
        let r = retriever().await;
        assert!(execute(&call("delete_everything", json!({})), "q", &r).await.failed);

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
        let out = execute(&call("get_technical_skills", json!({})), "q", &broken).await;
        assert!(out.failed);
        assert!(out.sources.is_empty());
    }
}
