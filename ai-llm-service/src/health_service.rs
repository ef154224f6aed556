//! Health probes for the configured LLM backends.
//!
//! - Ollama: `GET {endpoint}/api/tags`, model must be listed
//! - OpenAI: `GET {endpoint}/v1/models` with Bearer auth, model must be listed
//! - Hugging Face: no cheap probe; reported from configuration only
//!
//! [`HealthService::check`] never fails: errors become `ok = false`.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, HttpError, make_snippet};

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub provider: String,
    pub endpoint: String,
    pub model: Option<String>,
    pub ok: bool,
    pub latency_ms: u128,
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: cfg.provider.to_string(),
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// A health checker that reuses a single HTTP client.
pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    /// Creates a new health service with an optional client timeout (seconds).
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Checks health for a single config.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let start = Instant::now();
        let result = match cfg.provider {
            LlmProvider::Ollama => self.probe_model_list(cfg, "/api/tags", false).await,
            LlmProvider::OpenAI => self.probe_model_list(cfg, "/v1/models", true).await,
            LlmProvider::HuggingFace => Ok(HealthStatus::new(
                cfg,
                cfg.api_key.is_some(),
                0,
                "no probe endpoint; API key configured",
            )),
        };

        match result {
            Ok(status) => {
                info!(
                    provider = %status.provider,
                    model = %cfg.model,
                    ok = status.ok,
                    latency_ms = status.latency_ms,
                    "health probe completed"
                );
                status
            }
            Err(err) => {
                let status = HealthStatus::new(cfg, false, start.elapsed().as_millis(), err.to_string());
                warn!(
                    provider = %status.provider,
                    model = %cfg.model,
                    message = %status.message,
                    "health probe failed"
                );
                status
            }
        }
    }

    /// Checks health for multiple configs sequentially.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        debug!(count = configs.len(), "running batch health probes");
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    /// GETs a model listing and reports whether `cfg.model` is in it.
    ///
    /// Accepts both `{ "models": [{ "name" }] }` (Ollama) and
    /// `{ "data": [{ "id" }] }` (OpenAI).
    async fn probe_model_list(
        &self,
        cfg: &LlmModelConfig,
        path: &str,
        bearer: bool,
    ) -> Result<HealthStatus, AiLlmError> {
        let url = format!("{}{path}", cfg.endpoint.trim_end_matches('/'));
        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);

        let mut req = self.client.get(&url).timeout(timeout);
        if bearer {
            let key = cfg
                .api_key
                .as_deref()
                .ok_or_else(|| HealthError::Decode("missing API key".into()))?;
            req = req.bearer_auth(key);
        }

        let start = Instant::now();
        let resp = req.send().await?;
        let latency = start.elapsed().as_millis();

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(HealthError::HttpStatus(HttpError {
                status,
                url,
                snippet: make_snippet(&text),
            })
            .into());
        }

        match resp.json::<ModelListing>().await {
            Ok(listing) => {
                let names = listing.names();
                if names.is_empty() || names.iter().any(|n| *n == cfg.model) {
                    Ok(HealthStatus::new(cfg, true, latency, "reachable; model available"))
                } else {
                    Ok(HealthStatus::new(cfg, false, latency, "reachable, but model not listed"))
                }
            }
            Err(e) => Ok(HealthStatus::new(
                cfg,
                true,
                latency,
                format!("reachable; model listing not decoded: {e}"),
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ModelListing {
    #[serde(default)]
    models: Vec<NamedModel>,
    #[serde(default)]
    data: Vec<NamedModel>,
}

#[derive(Debug, Deserialize)]
struct NamedModel {
    #[serde(alias = "id")]
    name: String,
}

impl ModelListing {
    fn names(&self) -> Vec<&str> {
        self.models
            .iter()
            .chain(self.data.iter())
            .map(|m| m.name.as_str())
            .collect()
    }
}
