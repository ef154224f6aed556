//! Shared LLM service with three profiles: `chat`, `summary`, and `embedding`.
//!
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (provider+endpoint+model+key+timeout).
//! - The chat profile is optional; callers check [`LlmServiceProfiles::has_chat`]
//!   and answer from templates when it is absent.
//! - If the summary profile is not provided, it falls back to chat.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::{
    chat::{ChatMessage, ChatReply, ToolSpec},
    config::{
        default_config::{config_chat, config_embedding, config_summary},
        llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    error_handler::{AiLlmError, ConfigError, EnvLookup, Provider, ProviderError, ProviderErrorKind},
    health_service::{HealthService, HealthStatus},
    services::{
        huggingface_service::HuggingFaceService, ollama_service::OllamaService,
        open_ai_service::OpenAiService,
    },
};

/// Shared service managing the chat, summary and embedding profiles.
pub struct LlmServiceProfiles {
    chat: Option<LlmModelConfig>,
    summary: Option<LlmModelConfig>,
    embedding: LlmModelConfig,

    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
    openai: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,
    huggingface: RwLock<HashMap<ClientKey, Arc<HuggingFaceService>>>,

    health: HealthService,
}

impl LlmServiceProfiles {
    /// Creates a new service.
    ///
    /// - `chat`: optional chat profile.
    /// - `summary`: optional summary profile. If `None`, falls back to `chat`.
    /// - `embedding`: required embedding profile.
    /// - `health_timeout_secs`: optional timeout for the health checker.
    pub fn new(
        chat: Option<LlmModelConfig>,
        summary: Option<LlmModelConfig>,
        embedding: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        if let Some(c) = &chat {
            if !c.provider.supports_chat() {
                return Err(ConfigError::UnsupportedRole {
                    provider: c.provider.to_string(),
                    role: "chat",
                }
                .into());
            }
        }
        let summary = summary.or_else(|| chat.clone());

        Ok(Self {
            chat,
            summary,
            embedding,
            ollama: RwLock::new(HashMap::new()),
            openai: RwLock::new(HashMap::new()),
            huggingface: RwLock::new(HashMap::new()),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Builds all profiles from variables (see `config::default_config`).
    pub fn from_lookup(lookup: EnvLookup<'_>) -> Result<Self, AiLlmError> {
        let embedding = config_embedding(lookup)?;
        let chat = config_chat(lookup)?;
        let summary = chat.as_ref().map(|c| config_summary(lookup, c));
        Self::new(chat, summary, embedding, Some(10))
    }

    /// Whether a chat model is configured.
    pub fn has_chat(&self) -> bool {
        self.chat.is_some()
    }

    /// Name of the chat model, if any.
    pub fn chat_model(&self) -> Option<&str> {
        self.chat.as_ref().map(|c| c.model.as_str())
    }

    /// Returns references to the current profiles `(chat, summary, embedding)`.
    pub fn profiles(
        &self,
    ) -> (
        Option<&LlmModelConfig>,
        Option<&LlmModelConfig>,
        &LlmModelConfig,
    ) {
        (self.chat.as_ref(), self.summary.as_ref(), &self.embedding)
    }

    /// One chat call using the **chat** profile.
    ///
    /// # Errors
    /// [`ConfigError::MissingVar`] when no chat model is configured; provider
    /// errors otherwise.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatReply, AiLlmError> {
        let cfg = self
            .chat
            .as_ref()
            .ok_or(ConfigError::MissingVar("CHAT_MODEL"))?;
        self.chat_with(cfg, messages, tools).await
    }

    /// Plain-text completion using the **summary** profile.
    pub async fn summarize(&self, system: &str, prompt: &str) -> Result<String, AiLlmError> {
        let cfg = self
            .summary
            .as_ref()
            .ok_or(ConfigError::MissingVar("SUMMARY_MODEL"))?;
        let messages = [ChatMessage::system(system), ChatMessage::user(prompt)];
        let reply = self.chat_with(cfg, &messages, &[]).await?;
        Ok(reply.content.unwrap_or_default())
    }

    /// Computes one embedding using the **embedding** profile.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let mut out = self.embed_batch(&[input.to_string()]).await?;
        out.pop().ok_or_else(|| {
            ProviderError::new(
                provider_tag(self.embedding.provider),
                ProviderErrorKind::EmptyEmbedding,
            )
            .into()
        })
    }

    /// Computes embeddings for a batch, preserving input order.
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        match self.embedding.provider {
            LlmProvider::Ollama => {
                let cli = self.get_or_init_ollama(&self.embedding).await?;
                cli.embeddings(inputs).await
            }
            LlmProvider::OpenAI => {
                let cli = self.get_or_init_openai(&self.embedding).await?;
                cli.embeddings(inputs).await
            }
            LlmProvider::HuggingFace => {
                let cli = self.get_or_init_huggingface(&self.embedding).await?;
                cli.embeddings(inputs).await
            }
        }
    }

    /// Returns a health snapshot for all distinct profiles.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = Vec::<LlmModelConfig>::with_capacity(3);
        for cfg in [self.chat.as_ref(), self.summary.as_ref(), Some(&self.embedding)]
            .into_iter()
            .flatten()
        {
            if !list.contains(cfg) {
                list.push(cfg.clone());
            }
        }
        self.health.check_many(&list).await
    }

    /* --------------------- Internals --------------------- */

    async fn chat_with(
        &self,
        cfg: &LlmModelConfig,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatReply, AiLlmError> {
        match cfg.provider {
            LlmProvider::Ollama => {
                let cli = self.get_or_init_ollama(cfg).await?;
                cli.chat(messages, tools).await
            }
            LlmProvider::OpenAI => {
                let cli = self.get_or_init_openai(cfg).await?;
                cli.chat(messages, tools).await
            }
            LlmProvider::HuggingFace => Err(ConfigError::UnsupportedRole {
                provider: cfg.provider.to_string(),
                role: "chat",
            }
            .into()),
        }
    }

    async fn get_or_init_ollama(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OllamaService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.ollama.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        let cli = Arc::new(OllamaService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn get_or_init_openai(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OpenAiService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.openai.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.openai.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        let cli = Arc::new(OpenAiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn get_or_init_huggingface(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<HuggingFaceService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.huggingface.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.huggingface.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        let cli = Arc::new(HuggingFaceService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

fn provider_tag(p: LlmProvider) -> Provider {
    match p {
        LlmProvider::Ollama => Provider::Ollama,
        LlmProvider::OpenAI => Provider::OpenAI,
        LlmProvider::HuggingFace => Provider::HuggingFace,
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ollama(model: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: model.into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
        }
    }

    #[test]
    fn summary_falls_back_to_chat() {
        let svc = LlmServiceProfiles::new(Some(ollama("chat")), None, ollama("embed"), None).unwrap();
        let (chat, summary, embedding) = svc.profiles();
        assert_eq!(chat, summary);
        assert_eq!(embedding.model, "embed");
        assert_eq!(svc.chat_model(), Some("chat"));
    }

    #[test]
    fn huggingface_cannot_chat() {
        let hf = LlmModelConfig {
            provider: LlmProvider::HuggingFace,
            api_key: Some("hf".into()),
            ..ollama("m")
        };
        assert!(LlmServiceProfiles::new(Some(hf), None, ollama("embed"), None).is_err());
    }

    #[tokio::test]
    async fn chat_without_profile_is_config_error() {
        let svc = LlmServiceProfiles::new(None, None, ollama("embed"), None).unwrap();
        assert!(!svc.has_chat());
        let err = svc.chat(&[ChatMessage::user("hi")], &[]).await.unwrap_err();
        assert!(matches!(err, AiLlmError::Config(_)));
    }

    #[tokio::test]
    async fn empty_batch_makes_no_call() {
        let svc = LlmServiceProfiles::new(None, None, ollama("embed"), None).unwrap();
        assert!(svc.embed_batch(&[]).await.unwrap().is_empty());
    }
}
