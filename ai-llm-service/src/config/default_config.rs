//! Default LLM configs loaded from environment variables.
//!
//! Three roles are resolved here:
//!
//! - **Chat**      → answers questions, may call tools. Optional: without a
//!   chat model the assistant answers from templates.
//! - **Summary**   → compresses long conversation history. Falls back to chat.
//! - **Embedding** → vectors for indexing and retrieval.
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND` = chat provider (`ollama`, `openai`, `groq`), default `ollama`
//! - `LLM_MAX_TOKENS`, `LLM_TEMPERATURE`, `LLM_TIMEOUT_SECS`
//!
//! Chat:
//! - `CHAT_MODEL`, or the provider-specific `OLLAMA_MODEL` / `OPENAI_MODEL`
//! - `SUMMARY_MODEL` (optional)
//!
//! Embedding:
//! - `EMBEDDING_PROVIDER` (defaults to `LLM_KIND`), `EMBEDDING_MODEL`
//!
//! Endpoints and keys:
//! - `OLLAMA_URL` or `OLLAMA_PORT`
//! - `OPENAI_BASE_URL` (default `https://api.openai.com`), `OPENAI_API_KEY`
//! - `HF_API_URL` (default `https://api-inference.huggingface.co/models`), `HUGGINGFACE_API_KEY`

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, EnvLookup, must_var, opt_var, validate_http_endpoint,
        validate_range_f32, var_opt_f32, var_opt_u32, var_opt_u64,
    },
};

const OPENAI_DEFAULT_BASE: &str = "https://api.openai.com";
const HF_DEFAULT_BASE: &str = "https://api-inference.huggingface.co/models";
const OPENAI_DEFAULT_EMBEDDING: &str = "text-embedding-3-small";
const HF_DEFAULT_EMBEDDING: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint(lookup: EnvLookup<'_>) -> Result<String, AiLlmError> {
    if let Some(url) = opt_var(lookup, "OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = opt_var(lookup, "OLLAMA_PORT") {
        port.parse::<u16>().map_err(|_| ConfigError::InvalidNumber {
            var: "OLLAMA_PORT",
            reason: "expected u16 (1..=65535)",
        })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Err(ConfigError::MissingVar("OLLAMA_URL or OLLAMA_PORT").into())
}

/// Resolves `(endpoint, api_key)` for a provider.
fn endpoint_and_key(
    lookup: EnvLookup<'_>,
    provider: LlmProvider,
) -> Result<(String, Option<String>), AiLlmError> {
    match provider {
        LlmProvider::Ollama => Ok((ollama_endpoint(lookup)?, None)),
        LlmProvider::OpenAI => {
            let base = opt_var(lookup, "OPENAI_BASE_URL")
                .unwrap_or_else(|| OPENAI_DEFAULT_BASE.to_string());
            validate_http_endpoint("OPENAI_BASE_URL", &base)?;
            let key = must_var(lookup, "OPENAI_API_KEY")?;
            Ok((base, Some(key)))
        }
        LlmProvider::HuggingFace => {
            let base =
                opt_var(lookup, "HF_API_URL").unwrap_or_else(|| HF_DEFAULT_BASE.to_string());
            validate_http_endpoint("HF_API_URL", &base)?;
            let key = must_var(lookup, "HUGGINGFACE_API_KEY")?;
            Ok((base, Some(key)))
        }
    }
}

fn provider_var(lookup: EnvLookup<'_>, name: &str) -> Result<Option<LlmProvider>, AiLlmError> {
    opt_var(lookup, name)
        .map(|v| v.parse::<LlmProvider>().map_err(AiLlmError::from))
        .transpose()
}

/// Constructs the **chat** profile, or `None` when no chat model is configured.
///
/// # Defaults
/// - `temperature = 0.7` (`LLM_TEMPERATURE`)
/// - `timeout_secs = 60` (`LLM_TIMEOUT_SECS`)
///
/// # Errors
/// A chat model is set but its provider is unusable (unknown kind, missing
/// key, malformed endpoint).
pub fn config_chat(lookup: EnvLookup<'_>) -> Result<Option<LlmModelConfig>, AiLlmError> {
    let provider = provider_var(lookup, "LLM_KIND")?.unwrap_or(LlmProvider::Ollama);

    let provider_model_var = match provider {
        LlmProvider::Ollama => "OLLAMA_MODEL",
        LlmProvider::OpenAI => "OPENAI_MODEL",
        LlmProvider::HuggingFace => "HF_CHAT_MODEL",
    };
    let Some(model) =
        opt_var(lookup, "CHAT_MODEL").or_else(|| opt_var(lookup, provider_model_var))
    else {
        return Ok(None);
    };

    if !provider.supports_chat() {
        return Err(ConfigError::UnsupportedRole {
            provider: provider.to_string(),
            role: "chat",
        }
        .into());
    }

    let (endpoint, api_key) = endpoint_and_key(lookup, provider)?;
    let temperature = var_opt_f32(lookup, "LLM_TEMPERATURE")?.unwrap_or(0.7);
    validate_range_f32("LLM_TEMPERATURE", temperature, 0.0, 2.0)?;

    Ok(Some(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: var_opt_u32(lookup, "LLM_MAX_TOKENS")?,
        temperature: Some(temperature),
        top_p: None,
        timeout_secs: Some(var_opt_u64(lookup, "LLM_TIMEOUT_SECS")?.unwrap_or(60)),
    }))
}

/// Constructs the **summary** profile from the chat profile.
///
/// Same provider and endpoint; `SUMMARY_MODEL` may name a cheaper model.
/// Low temperature and a short completion budget.
pub fn config_summary(lookup: EnvLookup<'_>, chat: &LlmModelConfig) -> LlmModelConfig {
    let model = opt_var(lookup, "SUMMARY_MODEL").unwrap_or_else(|| chat.model.clone());
    LlmModelConfig {
        model,
        max_tokens: Some(150),
        temperature: Some(0.3),
        ..chat.clone()
    }
}

/// Constructs the **embedding** profile.
///
/// # Defaults
/// - provider: `EMBEDDING_PROVIDER`, else `LLM_KIND`, else Ollama
/// - model: `EMBEDDING_MODEL`; OpenAI and Hugging Face have a default model,
///   Ollama requires one
/// - `temperature = 0.0`, `timeout_secs = 30`
///
/// # Errors
/// Missing credentials or model. Callers surface these as configuration
/// errors with remediation text.
pub fn config_embedding(lookup: EnvLookup<'_>) -> Result<LlmModelConfig, AiLlmError> {
    let provider = match provider_var(lookup, "EMBEDDING_PROVIDER")? {
        Some(p) => p,
        None => provider_var(lookup, "LLM_KIND")?.unwrap_or(LlmProvider::Ollama),
    };

    let model = match (opt_var(lookup, "EMBEDDING_MODEL"), provider) {
        (Some(m), _) => m,
        (None, LlmProvider::OpenAI) => OPENAI_DEFAULT_EMBEDDING.to_string(),
        (None, LlmProvider::HuggingFace) => HF_DEFAULT_EMBEDDING.to_string(),
        (None, LlmProvider::Ollama) => return Err(ConfigError::MissingVar("EMBEDDING_MODEL").into()),
    };

    let (endpoint, api_key) = endpoint_and_key(lookup, provider)?;

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(30),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn no_chat_model_means_template_mode() {
        let lookup = env(&[("OLLAMA_URL", "http://localhost:11434")]);
        assert!(config_chat(&lookup).unwrap().is_none());
    }

    #[test]
    fn openai_chat_requires_key() {
        let lookup = env(&[("LLM_KIND", "openai"), ("CHAT_MODEL", "gpt-4o-mini")]);
        let err = config_chat(&lookup).unwrap_err();
        assert!(err.is_auth());

        let lookup = env(&[
            ("LLM_KIND", "openai"),
            ("CHAT_MODEL", "gpt-4o-mini"),
            ("OPENAI_API_KEY", "sk-test"),
        ]);
        let cfg = config_chat(&lookup).unwrap().unwrap();
        assert_eq!(cfg.provider, LlmProvider::OpenAI);
        assert_eq!(cfg.endpoint, OPENAI_DEFAULT_BASE);
        assert_eq!(cfg.temperature, Some(0.7));
    }

    #[test]
    fn ollama_port_builds_localhost_url() {
        let lookup = env(&[("OLLAMA_PORT", "11434"), ("OLLAMA_MODEL", "llama3.1")]);
        let cfg = config_chat(&lookup).unwrap().unwrap();
        assert_eq!(cfg.endpoint, "http://localhost:11434");
        assert_eq!(cfg.model, "llama3.1");
    }

    #[test]
    fn huggingface_embedding_defaults_model() {
        let lookup = env(&[("EMBEDDING_PROVIDER", "huggingface"), ("HUGGINGFACE_API_KEY", "hf_x")]);
        let cfg = config_embedding(&lookup).unwrap();
        assert_eq!(cfg.model, HF_DEFAULT_EMBEDDING);
        assert_eq!(cfg.api_key.as_deref(), Some("hf_x"));
    }

    #[test]
    fn huggingface_embedding_without_key_is_auth_error() {
        let lookup = env(&[("EMBEDDING_PROVIDER", "hf")]);
        assert!(config_embedding(&lookup).unwrap_err().is_auth());
    }

    #[test]
    fn summary_inherits_chat_endpoint() {
        let lookup = env(&[("OLLAMA_URL", "http://h:1"), ("OLLAMA_MODEL", "big"), ("SUMMARY_MODEL", "small")]);
        let chat = config_chat(&lookup).unwrap().unwrap();
        let summary = config_summary(&lookup, &chat);
        assert_eq!(summary.model, "small");
        assert_eq!(summary.endpoint, chat.endpoint);
        assert_eq!(summary.max_tokens, Some(150));
    }
}
