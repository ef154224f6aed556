//! Process-local brute-force index.
//!
//! Items live in an arena (`Vec`) with an id → slot map, behind a
//! `tokio::sync::RwLock`: queries share the read lock, upserts and resets
//! take the write lock. Suitable for corpora of a few thousand chunks.

use std::cmp::Ordering;
use std::collections::HashMap;

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::RagError;
use crate::index::{VectorIndex, check_batch, cosine_similarity};
use crate::record::{EmbeddedChunk, IndexInfo, RagFilter, SearchResult};

#[derive(Debug, Default)]
struct Arena {
    items: Vec<EmbeddedChunk>,
    slots: HashMap<String, usize>,
    dimension: Option<usize>,
}

#[derive(Debug, Default)]
pub struct InMemoryIndex {
    arena: RwLock<Arena>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorIndex for InMemoryIndex {
    fn upsert<'a>(&'a self, items: Vec<EmbeddedChunk>) -> BoxFuture<'a, Result<Vec<String>, RagError>> {
        Box::pin(async move {
            let mut arena = self.arena.write().await;
            // Validate the whole batch before touching the arena.
            let dimension = check_batch(&items, arena.dimension)?;

            let mut ids = Vec::with_capacity(items.len());
            let mut replaced = 0usize;
            for item in items {
                let id = item.chunk.id.clone();
                match arena.slots.get(&id).copied() {
                    Some(slot) => {
                        arena.items[slot] = item;
                        replaced += 1;
                    }
                    None => {
                        let slot = arena.items.len();
                        arena.items.push(item);
                        arena.slots.insert(id.clone(), slot);
                    }
                }
                ids.push(id);
            }
            if arena.dimension.is_none() {
                arena.dimension = dimension;
            }

            debug!(
                upserted = ids.len(),
                replaced,
                count = arena.items.len(),
                "in-memory upsert"
            );
            Ok(ids)
        })
    }

    fn query<'a>(
        &'a self,
        embedding: &'a [f32],
        top_k: usize,
        filter: Option<&'a RagFilter>,
    ) -> BoxFuture<'a, Result<Vec<SearchResult>, RagError>> {
        Box::pin(async move {
            let arena = self.arena.read().await;
            let Some(want) = arena.dimension else {
                return Ok(Vec::new());
            };
            if embedding.len() != want {
                return Err(RagError::DimensionMismatch {
                    got: embedding.len(),
                    want,
                });
            }
            if top_k == 0 {
                return Ok(Vec::new());
            }

            let mut scored: Vec<(f32, &EmbeddedChunk)> = arena
                .items
                .iter()
                .filter(|item| filter.is_none_or(|f| f.matches(&item.chunk.metadata)))
                .map(|item| (cosine_similarity(&item.embedding, embedding), item))
                .collect();

            scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
            scored.truncate(top_k);

            Ok(scored
                .into_iter()
                .map(|(score, item)| SearchResult {
                    id: item.chunk.id.clone(),
                    score,
                    content: item.chunk.content.clone(),
                    metadata: item.chunk.metadata.clone(),
                })
                .collect())
        })
    }

    fn reset<'a>(&'a self) -> BoxFuture<'a, Result<(), RagError>> {
        Box::pin(async move {
            let mut arena = self.arena.write().await;
            *arena = Arena::default();
            Ok(())
        })
    }

    fn info<'a>(&'a self) -> BoxFuture<'a, Result<IndexInfo, RagError>> {
        Box::pin(async move {
            let arena = self.arena.read().await;
            Ok(IndexInfo {
                count: arena.items.len(),
                dimension: arena.dimension,
            })
        })
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
