use crate::config::llm_provider::LlmProvider;

/// Configuration for one LLM model invocation profile.
///
/// # Fields
///
/// - `provider`: which backend serves the model.
/// - `model`: model identifier (e.g. `"gpt-4o-mini"`, `"llama3.1"`, `"nomic-embed-text"`).
/// - `endpoint`: base URL of the backend; route suffixes are appended by the client.
/// - `api_key`: bearer token for hosted providers.
/// - `max_tokens`, `temperature`, `top_p`: sampling options, forwarded when set.
/// - `timeout_secs`: per-request timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout_secs: Option<u64>,
}
