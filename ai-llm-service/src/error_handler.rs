//! Unified error handling for `ai-llm-service`.
//!
//! This module exposes a single top-level error type [`AiLlmError`] for the whole
//! library and groups domain-specific errors in nested enums ([`ConfigError`],
//! [`ProviderError`], [`HealthError`]). Small helpers for reading and validating
//! configuration variables return the unified [`Result<T>`] alias.
//!
//! All messages carry the `[AI LLM Service]` prefix to simplify attribution in logs.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, AiLlmError>;

/// Variable lookup used by config loaders. Production passes the process
/// environment, tests pass a closure over a fixed map.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Reads a variable from the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `ai-llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors (startup/readiness).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Provider call failed (status, auth, decoding, empty payloads).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Health-check/connectivity/decoding errors.
    #[error(transparent)]
    Health(#[from] HealthError),

    /// Underlying HTTP transport error.
    #[error("[AI LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Operation exceeded the configured timeout.
    #[error("[AI LLM Service] operation timed out after {0:?}")]
    Timeout(Duration),
}

impl AiLlmError {
    /// Credentials are missing or were rejected by the provider.
    pub fn is_auth(&self) -> bool {
        match self {
            AiLlmError::Provider(p) => matches!(
                p.kind,
                ProviderErrorKind::MissingApiKey | ProviderErrorKind::Unauthorized(_)
            ),
            AiLlmError::Config(ConfigError::MissingVar(var)) => var.contains("API_KEY"),
            _ => false,
        }
    }

    /// The provider asked us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::RateLimited(_),
                ..
            })
        )
    }

    /// The call may succeed if repeated later (rate limit, 5xx, transport, timeout).
    pub fn is_retryable(&self) -> bool {
        match self {
            AiLlmError::Provider(p) => match &p.kind {
                ProviderErrorKind::RateLimited(_) => true,
                ProviderErrorKind::HttpStatus(h) => h.status.is_server_error(),
                _ => false,
            },
            AiLlmError::HttpTransport(_) | AiLlmError::Timeout(_) => true,
            _ => false,
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Errors raised while loading or validating configuration.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required variable is missing or empty.
    #[error("[AI LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (ports, limits, timeouts).
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// Unsupported provider name.
    #[error("[AI LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g. invalid URL).
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[AI LLM Service] {field} is out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: &'static str,
    },

    /// The selected provider cannot serve this role (e.g. chat on Hugging Face).
    #[error("[AI LLM Service] provider {provider} cannot serve the {role} profile")]
    UnsupportedRole {
        provider: String,
        role: &'static str,
    },
}

/* ------------------------------------------------------------------------- */
/* Provider errors                                                           */
/* ------------------------------------------------------------------------- */

/// Provider that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    OpenAI,
    HuggingFace,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Provider::Ollama => "Ollama",
            Provider::OpenAI => "OpenAI",
            Provider::HuggingFace => "HuggingFace",
        };
        f.write_str(s)
    }
}

/// Non-success HTTP response details.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: StatusCode,
    pub url: String,
    /// Trimmed prefix of the response body.
    pub snippet: String,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} from {}: {}", self.status, self.url, self.snippet)
    }
}

/// What went wrong inside a provider call.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum ProviderErrorKind {
    InvalidProvider,
    MissingApiKey,
    InvalidEndpoint(String),
    Unauthorized(HttpError),
    RateLimited(HttpError),
    HttpStatus(HttpError),
    Decode(String),
    EmptyChoices,
    EmptyEmbedding,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::InvalidProvider => f.write_str("config is for a different provider"),
            ProviderErrorKind::MissingApiKey => f.write_str("API key is missing"),
            ProviderErrorKind::InvalidEndpoint(e) => write!(f, "invalid endpoint: {e}"),
            ProviderErrorKind::Unauthorized(h) => write!(f, "unauthorized ({h})"),
            ProviderErrorKind::RateLimited(h) => write!(f, "rate limited ({h})"),
            ProviderErrorKind::HttpStatus(h) => write!(f, "{h}"),
            ProviderErrorKind::Decode(msg) => write!(f, "decode error: {msg}"),
            ProviderErrorKind::EmptyChoices => f.write_str("response contained no choices"),
            ProviderErrorKind::EmptyEmbedding => f.write_str("response contained no embedding"),
        }
    }
}

/// Provider-scoped error.
#[derive(Debug, Clone, Error)]
#[error("[AI LLM Service] {provider}: {kind}")]
pub struct ProviderError {
    pub provider: Provider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: Provider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }

    /// Classifies a non-success HTTP status into auth / rate-limit / generic.
    pub fn from_status(provider: Provider, http: HttpError) -> Self {
        let kind = match http.status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderErrorKind::Unauthorized(http),
            StatusCode::TOO_MANY_REQUESTS => ProviderErrorKind::RateLimited(http),
            _ => ProviderErrorKind::HttpStatus(http),
        };
        Self { provider, kind }
    }
}

/* ------------------------------------------------------------------------- */
/* Health errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for provider health checks.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("[AI LLM Service] health check not supported for {0}")]
    Unsupported(String),

    #[error("[AI LLM Service] health {0}")]
    HttpStatus(HttpError),

    #[error("[AI LLM Service] health decode error: {0}")]
    Decode(String),
}

/* ------------------------------------------------------------------------- */
/* Helpers                                                                   */
/* ------------------------------------------------------------------------- */

/// Shortens a response body for logs and error messages.
pub fn make_snippet(text: &str) -> String {
    const MAX: usize = 300;
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(MAX).collect();
    out.push('…');
    out
}

/// Fetches a required, non-empty variable.
pub fn must_var(lookup: EnvLookup<'_>, name: &'static str) -> Result<String> {
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::MissingVar(name).into()),
    }
}

/// Fetches an optional variable (`None` if unset or blank).
pub fn opt_var(lookup: EnvLookup<'_>, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses an optional `u32` (`Ok(None)` if unset/empty).
pub fn var_opt_u32(lookup: EnvLookup<'_>, name: &'static str) -> Result<Option<u32>> {
    match opt_var(lookup, name) {
        Some(v) => v.parse::<u32>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u32",
            })
        }),
        None => Ok(None),
    }
}

/// Parses an optional `u64` (`Ok(None)` if unset/empty).
pub fn var_opt_u64(lookup: EnvLookup<'_>, name: &'static str) -> Result<Option<u64>> {
    match opt_var(lookup, name) {
        Some(v) => v.parse::<u64>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u64",
            })
        }),
        None => Ok(None),
    }
}

/// Parses an optional `f32` (`Ok(None)` if unset/empty).
pub fn var_opt_f32(lookup: EnvLookup<'_>, name: &'static str) -> Result<Option<f32>> {
    match opt_var(lookup, name) {
        Some(v) => v.parse::<f32>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected float",
            })
        }),
        None => Ok(None),
    }
}

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Validates that a floating-point value lies within an inclusive range.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected value in inclusive range",
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> HttpError {
        HttpError {
            status: StatusCode::from_u16(status).unwrap(),
            url: "http://x".into(),
            snippet: String::new(),
        }
    }

    #[test]
    fn status_classification() {
        let e: AiLlmError = ProviderError::from_status(Provider::OpenAI, http(401)).into();
        assert!(e.is_auth());
        assert!(!e.is_retryable());

        let e: AiLlmError = ProviderError::from_status(Provider::OpenAI, http(429)).into();
        assert!(e.is_rate_limited());
        assert!(e.is_retryable());

        let e: AiLlmError = ProviderError::from_status(Provider::Ollama, http(503)).into();
        assert!(e.is_retryable());
        assert!(!e.is_auth());
    }

    #[test]
    fn snippet_is_bounded() {
        let long = "x".repeat(1000);
        let s = make_snippet(&long);
        assert_eq!(s.chars().count(), 301);
        assert_eq!(make_snippet("  short  "), "short");
    }

    #[test]
    fn var_helpers() {
        let lookup = |k: &str| match k {
            "N" => Some("42".to_string()),
            "BAD" => Some("x".to_string()),
            "BLANK" => Some("  ".to_string()),
            _ => None,
        };
        assert_eq!(var_opt_u32(&lookup, "N").unwrap(), Some(42));
        assert!(var_opt_u32(&lookup, "BAD").is_err());
        assert_eq!(var_opt_u32(&lookup, "BLANK").unwrap(), None);
        assert!(must_var(&lookup, "MISSING").is_err());
    }
}
