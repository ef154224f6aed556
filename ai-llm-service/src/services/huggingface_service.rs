//! Hugging Face inference API client (feature extraction only).
//!
//! `POST {endpoint}/{model}` with `{ inputs, options: { wait_for_model: true } }`.
//! The response shape depends on the model pipeline: a flat vector, a list
//! of vectors, token-level vectors, or an object with `embeddings`. All of
//! them are normalized to one sentence vector per input.

use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind},
    services::{DEFAULT_TIMEOUT, ensure_success, normalize_base, transport_error},
};

#[derive(Debug)]
pub struct HuggingFaceService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    api_key: String,
    timeout: Duration,
    url_model: String,
}

impl HuggingFaceService {
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::HuggingFace {
            return Err(ProviderError::new(
                Provider::HuggingFace,
                ProviderErrorKind::InvalidProvider,
            )
            .into());
        }
        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(Provider::HuggingFace, ProviderErrorKind::MissingApiKey)
        })?;
        let base = normalize_base(Provider::HuggingFace, &cfg.endpoint)?;
        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url_model: format!("{base}/{}", cfg.model),
            api_key,
            cfg,
            timeout,
        })
    }

    #[instrument(skip_all, fields(model = %self.cfg.model, batch = inputs.len()))]
    pub async fn embeddings(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        let started = Instant::now();
        let body = FeatureExtractionRequest {
            inputs,
            options: RequestOptions {
                wait_for_model: true,
            },
        };

        debug!("POST {}", self.url_model);
        let resp = self
            .client
            .post(&self.url_model)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;
        let resp = ensure_success(
            Provider::HuggingFace,
            &self.url_model,
            &self.cfg.model,
            started,
            resp,
        )
        .await?;

        let raw: Value = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::HuggingFace,
                ProviderErrorKind::Decode(format!("serde error: {e}")),
            )
        })?;

        let vectors = parse_embeddings(raw, inputs.len())?;
        debug!(latency_ms = started.elapsed().as_millis(), "embeddings completed");
        Ok(vectors)
    }
}

#[derive(Debug, Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [String],
    options: RequestOptions,
}

#[derive(Debug, Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

fn decode_err(msg: impl Into<String>) -> AiLlmError {
    ProviderError::new(Provider::HuggingFace, ProviderErrorKind::Decode(msg.into())).into()
}

fn as_vector(v: &Value) -> Option<Vec<f32>> {
    v.as_array()?
        .iter()
        .map(|x| x.as_f64().map(|f| f as f32))
        .collect()
}

/// Averages token vectors into one sentence vector.
fn mean_pool(tokens: &[Value]) -> Option<Vec<f32>> {
    let rows: Vec<Vec<f32>> = tokens.iter().map(as_vector).collect::<Option<_>>()?;
    let dim = rows.first()?.len();
    if rows.iter().any(|r| r.len() != dim) {
        return None;
    }
    let mut out = vec![0.0f32; dim];
    for row in &rows {
        for (acc, x) in out.iter_mut().zip(row) {
            *acc += x;
        }
    }
    let n = rows.len() as f32;
    out.iter_mut().for_each(|x| *x /= n);
    Some(out)
}

/// Depth of nested arrays at the first element (`[1.0]` → 1, `[[1.0]]` → 2).
fn depth(v: &Value) -> usize {
    match v {
        Value::Array(items) => 1 + items.first().map(depth).unwrap_or(0),
        _ => 0,
    }
}

fn sentence_vector(v: &Value) -> Option<Vec<f32>> {
    match depth(v) {
        1 => as_vector(v),
        2 => mean_pool(v.as_array()?),
        _ => None,
    }
}

/// Normalizes any known feature-extraction response into `expected` vectors.
pub(crate) fn parse_embeddings(raw: Value, expected: usize) -> Result<Vec<Vec<f32>>, AiLlmError> {
    let raw = match raw {
        Value::Object(mut map) => match map.remove("embeddings") {
            Some(inner) => inner,
            None => {
                let msg = map
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("object without `embeddings`")
                    .to_string();
                return Err(decode_err(msg));
            }
        },
        other => other,
    };

    let vectors: Vec<Vec<f32>> = match depth(&raw) {
        // Single flat vector.
        1 if expected == 1 => vec![as_vector(&raw).ok_or_else(|| decode_err("non-numeric vector"))?],
        // One sentence vector per input, or token vectors for a single input.
        2 => {
            let items = raw.as_array().ok_or_else(|| decode_err("expected array"))?;
            if items.len() == expected {
                items
                    .iter()
                    .map(as_vector)
                    .collect::<Option<_>>()
                    .ok_or_else(|| decode_err("non-numeric vector"))?
            } else if expected == 1 {
                vec![mean_pool(items).ok_or_else(|| decode_err("ragged token vectors"))?]
            } else {
                return Err(decode_err(format!(
                    "expected {expected} embeddings, got {}",
                    items.len()
                )));
            }
        }
        // Token vectors per input.
        3 => raw
            .as_array()
            .ok_or_else(|| decode_err("expected array"))?
            .iter()
            .map(sentence_vector)
            .collect::<Option<_>>()
            .ok_or_else(|| decode_err("ragged token vectors"))?,
        _ => return Err(decode_err("unrecognized embedding response shape")),
    };

    if vectors.len() != expected {
        return Err(decode_err(format!(
            "expected {expected} embeddings, got {}",
            vectors.len()
        )));
    }
    if vectors.iter().any(Vec::is_empty) {
        return Err(
            ProviderError::new(Provider::HuggingFace, ProviderErrorKind::EmptyEmbedding).into(),
        );
    }
    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn flat_vector_for_single_input() {
        let v = parse_embeddings(json!([0.1, 0.2, 0.3]), 1).unwrap();
        assert_eq!(v, vec![vec![0.1, 0.2, 0.3]]);
    }

    #[test]
    fn nested_batch() {
        let v = parse_embeddings(json!([[1.0, 0.0], [0.0, 1.0]]), 2).unwrap();
        assert_eq!(v.len(), 2);
        assert_eq!(v[1], vec![0.0, 1.0]);
    }

    #[test]
    fn embeddings_object() {
        let v = parse_embeddings(json!({"embeddings": [[1.0, 2.0]]}), 1).unwrap();
        assert_eq!(v, vec![vec![1.0, 2.0]]);
    }

    #[test]
    fn token_vectors_are_mean_pooled() {
        let v = parse_embeddings(json!([[[1.0, 3.0], [3.0, 5.0]]]), 1).unwrap();
        assert_eq!(v, vec![vec![2.0, 4.0]]);
    }

    #[test]
    fn error_object_is_decode_error() {
        let err = parse_embeddings(json!({"error": "Model is loading"}), 1).unwrap_err();
        assert!(err.to_string().contains("Model is loading"));
    }

    #[test]
    fn empty_vector_is_rejected() {
        assert!(parse_embeddings(json!([[]]), 1).is_err());
    }
}
