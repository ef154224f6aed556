//! Vector index capability and its adapters.

use futures::future::BoxFuture;

use crate::errors::RagError;
use crate::record::{EmbeddedChunk, IndexInfo, RagFilter, SearchResult};

pub mod memory;
pub mod qdrant;

pub use memory::InMemoryIndex;
pub use qdrant::QdrantIndex;

/// Stores `(id, vector, metadata)` triples and answers top-K cosine queries.
///
/// Contract shared by every adapter:
/// - all vectors in one index have the same dimension; a mismatched upsert
///   or query fails with [`RagError::DimensionMismatch`]
/// - upserting an existing id replaces it (count unchanged)
/// - `query` returns at most `top_k` results in non-increasing score order
/// - querying an empty index returns `[]`
pub trait VectorIndex: Send + Sync {
    /// Inserts or replaces items, returning their ids in input order.
    fn upsert<'a>(&'a self, items: Vec<EmbeddedChunk>) -> BoxFuture<'a, Result<Vec<String>, RagError>>;

    /// Top-K nearest items by cosine similarity, optionally filtered on metadata.
    fn query<'a>(
        &'a self,
        embedding: &'a [f32],
        top_k: usize,
        filter: Option<&'a RagFilter>,
    ) -> BoxFuture<'a, Result<Vec<SearchResult>, RagError>>;

    /// Removes every item and forgets the dimension.
    fn reset<'a>(&'a self) -> BoxFuture<'a, Result<(), RagError>>;

    /// Item count and dimension.
    fn info<'a>(&'a self) -> BoxFuture<'a, Result<IndexInfo, RagError>>;

    /// Adapter name for logs and health output.
    fn backend(&self) -> &'static str;
}

/// Cosine similarity; 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Rejects a batch that is internally inconsistent or disagrees with `current`.
/// Returns the dimension the batch establishes.
pub(crate) fn check_batch(
    items: &[EmbeddedChunk],
    current: Option<usize>,
) -> Result<Option<usize>, RagError> {
    let mut want = current;
    for item in items {
        let got = item.embedding.len();
        if got == 0 {
            return Err(RagError::EmptyEmbedding);
        }
        match want {
            Some(w) if w != got => return Err(RagError::DimensionMismatch { got, want: w }),
            None => want = Some(got),
            _ => {}
        }
    }
    Ok(want)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) < -0.99);
    }

    proptest! {
        #[test]
        fn cosine_is_bounded_and_never_nan(
            a in prop::collection::vec(-100.0f32..100.0, 1..16),
            b in prop::collection::vec(-100.0f32..100.0, 1..16),
        ) {
            let n = a.len().min(b.len());
            let s = cosine_similarity(&a[..n], &b[..n]);
            prop_assert!(!s.is_nan());
            prop_assert!(s <= 1.0 + 1e-4 && s >= -1.0 - 1e-4);
        }
    }
}
