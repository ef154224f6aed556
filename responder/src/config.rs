//! Runtime configuration loaded from environment variables.

use std::str::FromStr;

use crate::error::ResponderError;

/// How a configured chat model gets its context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponderMode {
    /// The model receives retrieval tools and decides when to search.
    Tools,
    /// Context is retrieved up front and embedded in the system prompt.
    Direct,
}

impl FromStr for ResponderMode {
    type Err = ResponderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tools" | "tool" | "tool-calling" => Ok(Self::Tools),
            "direct" | "context" => Ok(Self::Direct),
            other => Err(ResponderError::Config(format!(
                "RESPONDER_MODE must be `tools` or `direct`, got `{other}`"
            ))),
        }
    }
}

pub const MIN_CONVERSATION_LIMIT: usize = 2;
pub const MAX_CONVERSATION_LIMIT: usize = 50;

#[derive(Clone, Debug, PartialEq)]
pub struct ResponderConfig {
    /// Name the assistant speaks as.
    pub persona_name: String,
    /// Professional title used in the system prompt.
    pub persona_title: String,
    /// History messages kept verbatim, clamped to 2..=50.
    pub conversation_limit: usize,
    /// Summarize truncated history with the model instead of concatenating it.
    pub enable_summary: bool,
    pub mode: ResponderMode,
    /// Reasoning calls allowed before the loop is forced to answer.
    pub max_tool_steps: usize,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            persona_name: "the candidate".into(),
            persona_title: "Software Engineer".into(),
            conversation_limit: 6,
            enable_summary: false,
            mode: ResponderMode::Tools,
            max_tool_steps: 5,
        }
    }
}

fn opt(lookup: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse<T: FromStr>(
    lookup: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ResponderError> {
    match opt(lookup, key) {
        Some(v) => v
            .parse()
            .map_err(|_| ResponderError::Config(format!("{key} has an invalid value `{v}`"))),
        None => Ok(default),
    }
}

impl ResponderConfig {
    pub fn from_env() -> Result<Self, ResponderError> {
        Self::from_lookup(&|k| std::env::var(k).ok())
    }

    /// `CONVERSATION_LIMIT`, `ENABLE_CONVERSATION_SUMMARY`, `RESPONDER_MODE`,
    /// `MAX_TOOL_STEPS`. An out-of-range limit is clamped, not rejected.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ResponderError> {
        let d = Self::default();
        let mode = match opt(lookup, "RESPONDER_MODE") {
            Some(v) => v.parse()?,
            None => d.mode,
        };
        let limit: i64 = parse(lookup, "CONVERSATION_LIMIT", d.conversation_limit as i64)?;
        let max_tool_steps: usize = parse(lookup, "MAX_TOOL_STEPS", d.max_tool_steps)?;
        if max_tool_steps == 0 {
            return Err(ResponderError::Config("MAX_TOOL_STEPS must be > 0".into()));
        }
        Ok(Self {
            conversation_limit: clamp_limit(limit),
            enable_summary: opt(lookup, "ENABLE_CONVERSATION_SUMMARY")
                .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1"),
            mode,
            max_tool_steps,
            ..d
        })
    }

    pub fn with_persona(mut self, name: impl Into<String>, title: impl Into<String>) -> Self {
        self.persona_name = name.into();
        self.persona_title = title.into();
        self
    }
}

pub fn clamp_limit(limit: i64) -> usize {
    limit.clamp(MIN_CONVERSATION_LIMIT as i64, MAX_CONVERSATION_LIMIT as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |k: &str| pairs.iter().find(|(key, _)| *key == k).map(|(_, v)| v.to_string())
    }

    #[test]
    fn defaults() {
        let cfg = ResponderConfig::from_lookup(&with(&[])).unwrap();
        assert_eq!(cfg.conversation_limit, 6);
        assert_eq!(cfg.mode, ResponderMode::Tools);
        assert_eq!(cfg.max_tool_steps, 5);
        assert!(!cfg.enable_summary);
    }

    #[test]
    fn limit_is_clamped() {
        let low = ResponderConfig::from_lookup(&with(&[("CONVERSATION_LIMIT", "0")])).unwrap();
        assert_eq!(low.conversation_limit, 2);
        let high = ResponderConfig::from_lookup(&with(&[("CONVERSATION_LIMIT", "500")])).unwrap();
        assert_eq!(high.conversation_limit, 50);
        let neg = ResponderConfig::from_lookup(&with(&[("CONVERSATION_LIMIT", "-3")])).unwrap();
        assert_eq!(neg.conversation_limit, 2);
    }

    #[test]
    fn mode_and_summary_flags() {
        let cfg = ResponderConfig::from_lookup(&with(&[
            ("RESPONDER_MODE", "direct"),
            ("ENABLE_CONVERSATION_SUMMARY", "TRUE"),
        ]))
        .unwrap();
        assert_eq!(cfg.mode, ResponderMode::Direct);
        assert!(cfg.enable_summary);
        assert!(ResponderConfig::from_lookup(&with(&[("RESPONDER_MODE", "agent")])).is_err());
        assert!(ResponderConfig::from_lookup(&with(&[("MAX_TOOL_STEPS", "0")])).is_err());
    }
}
