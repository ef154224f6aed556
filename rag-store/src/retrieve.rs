//! Retrieval: embed the query, rank by the index, drop weak matches, build context.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::config::{ConfidenceThresholds, RagConfig};
use crate::embed::Embedder;
use crate::errors::RagError;
use crate::index::VectorIndex;
use crate::record::{SearchOptions, SearchResult};

/// Context text used when nothing relevant was retrieved.
pub const NO_CONTEXT: &str = "No relevant information found in the knowledge base.";

/// Bucketed mean similarity of the retrieved context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(score: f32, thresholds: &ConfidenceThresholds) -> Self {
        if score >= thresholds.high {
            Self::High
        } else if score >= thresholds.medium {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Prompt-ready context plus the hits it was built from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RagContext {
    pub context: String,
    pub sources: Vec<SearchResult>,
    /// Mean score of `sources`, 0 when empty.
    pub confidence: f32,
    pub level: ConfidenceLevel,
}

/// Formats hits as `[i] title:\ncontent` blocks separated by blank lines.
pub fn format_context(hits: &[SearchResult]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, h)| format!("[{}] {}:\n{}", i + 1, h.metadata.display_title(), h.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Mean of the hit scores.
pub fn mean_score(hits: &[SearchResult]) -> f32 {
    if hits.is_empty() {
        return 0.0;
    }
    hits.iter().map(|h| h.score).sum::<f32>() / hits.len() as f32
}

/// Query-side pipeline over an [`Embedder`] and a [`VectorIndex`].
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    cfg: RagConfig,
}

impl Retriever {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>, cfg: RagConfig) -> Self {
        Self {
            index,
            embedder,
            cfg,
        }
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn config(&self) -> &RagConfig {
        &self.cfg
    }

    /// Ranked hits with `score >= min_similarity_score`, best first.
    ///
    /// An empty index yields `[]` without calling the embedder.
    #[instrument(skip_all, fields(top_k = opts.top_k, min = opts.min_similarity_score))]
    pub async fn search(&self, query: &str, opts: &SearchOptions) -> Result<Vec<SearchResult>, RagError> {
        match self.search_checked(query, opts).await {
            Err(RagError::EmptyIndex) => {
                warn!("search on an empty index; initialize the corpus first");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Like [`Retriever::search`], but an empty index is [`RagError::EmptyIndex`].
    pub async fn search_checked(
        &self,
        query: &str,
        opts: &SearchOptions,
    ) -> Result<Vec<SearchResult>, RagError> {
        if self.index.info().await?.count == 0 {
            return Err(RagError::EmptyIndex);
        }
        let embedding = self.embedder.embed(query).await?;
        let hits = self
            .index
            .query(&embedding, opts.top_k, opts.filter.as_ref())
            .await?;
        let fetched = hits.len();
        let kept: Vec<SearchResult> = hits
            .into_iter()
            .filter(|h| h.score >= opts.min_similarity_score)
            .collect();
        debug!(fetched, kept = kept.len(), "retrieval done");
        Ok(kept)
    }

    /// Context with the configured `RAG_TOP_K` / `RAG_MIN_SCORE`.
    pub async fn get_context(&self, query: &str) -> Result<RagContext, RagError> {
        let opts = SearchOptions::new(self.cfg.top_k, self.cfg.min_score);
        self.get_context_with(query, &opts).await
    }

    pub async fn get_context_with(
        &self,
        query: &str,
        opts: &SearchOptions,
    ) -> Result<RagContext, RagError> {
        let sources = self.search(query, opts).await?;
        Ok(self.build_context(sources))
    }

    /// Turns ranked hits into a [`RagContext`] using the configured thresholds.
    pub fn build_context(&self, sources: Vec<SearchResult>) -> RagContext {
        if sources.is_empty() {
            return RagContext {
                context: NO_CONTEXT.to_string(),
                sources,
                confidence: 0.0,
                level: ConfidenceLevel::Low,
            };
        }
        let confidence = mean_score(&sources);
        RagContext {
            context: format_context(&sources),
            level: ConfidenceLevel::from_score(confidence, &self.cfg.thresholds),
            confidence,
            sources,
        }
    }
}
