use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use conversation_log::ConversationLog;
use rag_store::{Chunk, IndexingOptions, Retriever};
use responder::Responder;
use tokio::sync::Mutex;

/// Shared state for all HTTP handlers.
pub struct AppState {
    /// Answers chat turns; owns the retriever and the conversation log.
    pub responder: Responder,
    /// Corpus indexed when `/api/initialize` gets no documents.
    pub default_corpus: Vec<Chunk>,
    /// Batch size, throttle and expected dimension for bulk indexing.
    pub indexing: IndexingOptions,
    /// Provider profiles for health probes; `None` when none are configured.
    pub profiles: Option<Arc<LlmServiceProfiles>>,
    /// Serializes initialize/reset so two runs never interleave.
    pub index_lock: Mutex<()>,
}

impl AppState {
    pub fn new(
        responder: Responder,
        default_corpus: Vec<Chunk>,
        indexing: IndexingOptions,
        profiles: Option<Arc<LlmServiceProfiles>>,
    ) -> Self {
        Self {
            responder,
            default_corpus,
            indexing,
            profiles,
            index_lock: Mutex::new(()),
        }
    }

    pub fn retriever(&self) -> &Retriever {
        self.responder.retriever()
    }

    pub fn log(&self) -> &Arc<ConversationLog> {
        self.responder.log()
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    /// `API_ADDRESS`, e.g. `127.0.0.1:8080`.
    pub address: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8080".into(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(&|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        match lookup("API_ADDRESS").map(|v| v.trim().to_string()) {
            Some(address) if !address.is_empty() => Self { address },
            _ => Self::default(),
        }
    }
}
