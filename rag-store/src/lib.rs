//! Retrieval engine for the profile assistant.
//!
//! - [`Embedder`]: text → vector through an external provider
//! - [`VectorIndex`]: `(id, vector, metadata)` storage with top-K cosine
//!   queries, in-memory ([`InMemoryIndex`]) or Qdrant ([`QdrantIndex`])
//! - [`Retriever`]: query embedding, ranking, score floor, context building
//! - [`index_corpus`]: throttled bulk embedding + upsert
//!
//! Adapters are chosen from [`RagConfig`] by [`build_index`] and
//! [`build_embedder`]; everything above them is adapter-agnostic.

use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use tracing::{info, warn};

pub mod config;
pub mod embed;
pub mod embed_pool;
pub mod errors;
mod filters;
pub mod index;
pub mod ingest;
pub mod progress;
pub mod record;
pub mod retrieve;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use config::{ConfidenceThresholds, IndexBackend, QdrantSettings, RagConfig};
pub use embed::{Embedder, ServiceEmbedder, UnconfiguredEmbedder};
pub use errors::{ProviderFailure, RagError};
pub use index::{InMemoryIndex, QdrantIndex, VectorIndex, cosine_similarity};
pub use ingest::{IndexReport, IndexingOptions, index_corpus};
pub use progress::{IndicatifProgress, NoopProgress, Progress};
pub use record::{Chunk, ChunkMetadata, EmbeddedChunk, IndexInfo, RagFilter, SearchOptions, SearchResult};
pub use retrieve::{ConfidenceLevel, NO_CONTEXT, RagContext, Retriever};

/// Index adapter selected by `cfg.backend`.
pub fn build_index(cfg: &RagConfig) -> Result<Arc<dyn VectorIndex>, RagError> {
    let index: Arc<dyn VectorIndex> = match cfg.backend {
        IndexBackend::Memory => Arc::new(InMemoryIndex::new()),
        IndexBackend::Qdrant => Arc::new(QdrantIndex::new(&cfg.qdrant)?),
    };
    info!(backend = index.backend(), "vector index ready");
    Ok(index)
}

/// Embedder over the configured provider.
///
/// Without a usable embedding profile the server still starts: the returned
/// embedder fails every call with the configuration error, which
/// `/api/initialize` reports as a 400.
pub fn build_embedder(
    profiles: Result<Arc<LlmServiceProfiles>, String>,
    cfg: &RagConfig,
) -> Arc<dyn Embedder> {
    match profiles {
        Ok(p) => Arc::new(ServiceEmbedder::new(p, cfg.embedding_dim)),
        Err(reason) => {
            warn!(%reason, "embedding provider not configured");
            Arc::new(UnconfiguredEmbedder::new(reason))
        }
    }
}
