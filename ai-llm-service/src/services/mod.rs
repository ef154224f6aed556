pub mod huggingface_service;
pub mod ollama_service;
pub mod open_ai_service;

use std::time::{Duration, Instant};

use tracing::error;

use crate::error_handler::{AiLlmError, HttpError, Provider, ProviderError, make_snippet};

/// Default request timeout when a profile does not set one.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Returns the response unchanged on 2xx; otherwise logs a snippet of the body
/// and classifies the status into a [`ProviderError`].
pub(crate) async fn ensure_success(
    provider: Provider,
    url: &str,
    model: &str,
    started: Instant,
    resp: reqwest::Response,
) -> Result<reqwest::Response, AiLlmError> {
    if resp.status().is_success() {
        return Ok(resp);
    }

    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let snippet = make_snippet(&text);

    error!(
        %provider,
        %status,
        %url,
        %snippet,
        model = %model,
        latency_ms = started.elapsed().as_millis(),
        "provider returned non-success status"
    );

    Err(ProviderError::from_status(
        provider,
        HttpError {
            status,
            url: url.to_string(),
            snippet,
        },
    )
    .into())
}

/// Checks that an endpoint is a non-empty http(s) URL and strips trailing slashes.
pub(crate) fn normalize_base(provider: Provider, endpoint: &str) -> Result<String, AiLlmError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
    {
        return Err(ProviderError::new(
            provider,
            crate::error_handler::ProviderErrorKind::InvalidEndpoint(endpoint.to_string()),
        )
        .into());
    }
    Ok(endpoint.trim_end_matches('/').to_string())
}

/// Maps a send error, keeping timeouts distinct from other transport failures.
pub(crate) fn transport_error(err: reqwest::Error, timeout: Duration) -> AiLlmError {
    if err.is_timeout() {
        AiLlmError::Timeout(timeout)
    } else {
        AiLlmError::HttpTransport(err)
    }
}
