//! Corpus indexing: chunks → embeddings (throttled) → index upsert.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, instrument};

use crate::config::RagConfig;
use crate::embed::Embedder;
use crate::embed_pool::embed_all;
use crate::errors::RagError;
use crate::index::VectorIndex;
use crate::progress::Progress;
use crate::record::{Chunk, EmbeddedChunk};

/// Knobs for one indexing run.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexingOptions {
    pub batch_size: usize,
    pub delay: Duration,
    /// Re-embed even when the index already holds documents.
    pub force: bool,
    pub expected_dim: Option<usize>,
}

impl Default for IndexingOptions {
    fn default() -> Self {
        Self::from(&RagConfig::default())
    }
}

impl From<&RagConfig> for IndexingOptions {
    fn from(cfg: &RagConfig) -> Self {
        Self {
            batch_size: cfg.embed_batch_size,
            delay: cfg.embed_delay,
            force: false,
            expected_dim: cfg.embedding_dim,
        }
    }
}

impl IndexingOptions {
    pub fn forced(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Outcome of an indexing run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// Chunks embedded and upserted in this run.
    pub indexed: usize,
    /// Chunks in the corpus handed to the run.
    pub total: usize,
    /// True when the run was a no-op because the index was already populated.
    pub skipped: bool,
    /// Index size after the run.
    pub count: usize,
    pub message: String,
}

/// Embeds and upserts `chunks`.
///
/// When the index is non-empty and `opts.force` is false, nothing is
/// embedded and the report says the store is already initialized. With
/// `force`, the whole corpus is embedded before the index is reset, so a
/// provider failure leaves the previous index in place and a smaller corpus
/// does not leave stale chunks behind.
#[instrument(skip_all, fields(total = chunks.len(), force = opts.force, backend = index.backend()))]
pub async fn index_corpus(
    index: &dyn VectorIndex,
    embedder: &dyn Embedder,
    chunks: Vec<Chunk>,
    opts: &IndexingOptions,
    progress: &dyn Progress,
) -> Result<IndexReport, RagError> {
    let total = chunks.len();
    let before = index.info().await?.count;

    if before > 0 && !opts.force {
        info!(count = before, "index already populated; skipping");
        return Ok(IndexReport {
            indexed: 0,
            total,
            skipped: true,
            count: before,
            message: format!("Vector store already initialized with {before} documents"),
        });
    }
    progress.set_total(total as u64);
    progress.message("embedding corpus");

    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let vectors = embed_all(
        embedder,
        &texts,
        opts.batch_size,
        opts.delay,
        opts.expected_dim,
        progress,
    )
    .await?;

    if before > 0 {
        index.reset().await?;
    }

    let items: Vec<EmbeddedChunk> = chunks
        .into_iter()
        .zip(vectors)
        .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
        .collect();
    let ids = index.upsert(items).await?;
    let count = index.info().await?.count;

    let message = format!("Indexed {} of {total} documents", ids.len());
    progress.finish(&message);
    info!(indexed = ids.len(), count, "corpus indexed");

    Ok(IndexReport {
        indexed: ids.len(),
        total,
        skipped: false,
        count,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::InMemoryIndex;
    use crate::progress::NoopProgress;
    use crate::record::ChunkMetadata;
    use crate::testing::{FailingEmbedder, KeywordEmbedder};

    fn corpus() -> Vec<Chunk> {
        ["rust services", "aws platform", "react dashboards"]
            .iter()
            .enumerate()
            .map(|(i, text)| Chunk {
                id: format!("doc:{i}"),
                content: text.to_string(),
                metadata: ChunkMetadata::new("test", "doc"),
            })
            .collect()
    }

    fn opts() -> IndexingOptions {
        IndexingOptions {
            batch_size: 2,
            delay: Duration::ZERO,
            force: false,
            expected_dim: None,
        }
    }

    #[tokio::test]
    async fn second_run_is_a_noop() {
        let index = InMemoryIndex::new();
        let embedder = KeywordEmbedder::new(&["rust", "aws", "react"]);

        let first = index_corpus(&index, &embedder, corpus(), &opts(), &NoopProgress)
            .await
            .unwrap();
        assert_eq!((first.indexed, first.count, first.skipped), (3, 3, false));

        embedder.reset_calls();
        let second = index_corpus(&index, &embedder, corpus(), &opts(), &NoopProgress)
            .await
            .unwrap();
        assert!(second.skipped);
        assert_eq!(second.count, 3);
        assert_eq!(embedder.calls(), 0);
        assert!(second.message.contains("already initialized with 3 documents"));
    }

    #[tokio::test]
    async fn force_rebuilds_from_scratch() {
        let index = InMemoryIndex::new();
        let embedder = KeywordEmbedder::new(&["rust", "aws", "react"]);
        index_corpus(&index, &embedder, corpus(), &opts(), &NoopProgress)
            .await
            .unwrap();

        let smaller = corpus().into_iter().take(1).collect();
        let report = index_corpus(&index, &embedder, smaller, &opts().forced(true), &NoopProgress)
            .await
            .unwrap();
        assert_eq!(report.indexed, 1);
        assert_eq!(report.count, 1);
    }

    #[tokio::test]
    async fn forced_run_keeps_old_index_when_provider_fails() {
        let index = InMemoryIndex::new();
        let embedder = KeywordEmbedder::new(&["rust", "aws", "react"]);
        index_corpus(&index, &embedder, corpus(), &opts(), &NoopProgress)
            .await
            .unwrap();

        let err = index_corpus(
            &index,
            &FailingEmbedder::rate_limited(),
            corpus(),
            &opts().forced(true),
            &NoopProgress,
        )
        .await
        .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(index.info().await.unwrap().count, 3);
    }

    #[tokio::test]
    async fn expected_dimension_is_enforced() {
        let index = InMemoryIndex::new();
        let embedder = KeywordEmbedder::new(&["rust", "aws", "react"]);
        let mut o = opts();
        o.expected_dim = Some(384);
        let err = index_corpus(&index, &embedder, corpus(), &o, &NoopProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { got: 3, want: 384 }));
        assert_eq!(index.info().await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn provider_auth_failure_leaves_index_untouched() {
        let index = InMemoryIndex::new();
        let err = index_corpus(
            &index,
            &FailingEmbedder::unauthorized(),
            corpus(),
            &opts(),
            &NoopProgress,
        )
        .await
        .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(index.info().await.unwrap().count, 0);
    }
}
