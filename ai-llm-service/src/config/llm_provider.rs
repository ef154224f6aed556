use std::fmt;
use std::str::FromStr;

use crate::error_handler::ConfigError;

/// Backend used for chat completions or embeddings.
///
/// `OpenAI` covers every OpenAI-compatible endpoint (OpenAI itself, Groq,
/// self-hosted gateways); only the base URL and key differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime.
    Ollama,
    /// OpenAI-compatible REST API.
    OpenAI,
    /// Hugging Face inference API (embeddings only).
    HuggingFace,
}

impl LlmProvider {
    /// Whether the provider exposes a chat endpoint with tool calling.
    pub fn supports_chat(self) -> bool {
        !matches!(self, LlmProvider::HuggingFace)
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LlmProvider::Ollama => "ollama",
            LlmProvider::OpenAI => "openai",
            LlmProvider::HuggingFace => "huggingface",
        };
        f.write_str(s)
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "openai" | "chatgpt" | "groq" => Ok(LlmProvider::OpenAI),
            "huggingface" | "hf" => Ok(LlmProvider::HuggingFace),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("Ollama".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
        assert_eq!("groq".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!("hf".parse::<LlmProvider>().unwrap(), LlmProvider::HuggingFace);
        assert!("anthropic".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn huggingface_has_no_chat() {
        assert!(!LlmProvider::HuggingFace.supports_chat());
        assert!(LlmProvider::OpenAI.supports_chat());
    }
}
