//! LLM provider layer for the profile assistant.
//!
//! One [`service_profiles::LlmServiceProfiles`] instance owns three logical
//! profiles (chat, summary, embedding) and routes each call to the matching
//! provider client. Provider failures are normalized into [`AiLlmError`].

pub mod chat;
pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use chat::{ChatMessage, ChatReply, ChatRole, ToolCall, ToolSpec};
pub use config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
pub use error_handler::{AiLlmError, ConfigError, ProviderError, ProviderErrorKind};
pub use service_profiles::LlmServiceProfiles;
