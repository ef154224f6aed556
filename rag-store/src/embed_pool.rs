//! Bulk embedding with a fixed pause between provider calls and dimension checks.

use std::time::Duration;

use tracing::{debug, info};

use crate::{
    embed::Embedder,
    errors::{ProviderFailure, RagError},
    progress::Progress,
};

/// Embeds `texts` in batches of `batch_size`, sleeping `delay` between batches.
///
/// Calls are strictly sequential: hosted free tiers reject bursts, and a
/// rate-limit error here aborts the run so the caller can retry later.
///
/// # Errors
/// - [`RagError::EmptyEmbedding`] if any vector is empty
/// - [`RagError::DimensionMismatch`] if vectors disagree with each other or
///   with `expected_dim`
/// - provider errors unchanged
pub async fn embed_all(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
    delay: Duration,
    expected_dim: Option<usize>,
    progress: &dyn Progress,
) -> Result<Vec<Vec<f32>>, RagError> {
    let batch_size = batch_size.max(1);
    info!(
        total = texts.len(),
        batch_size,
        delay_ms = delay.as_millis() as u64,
        embedder = %embedder.name(),
        "embed_pool::embed_all"
    );

    let mut want = expected_dim;
    let mut out = Vec::with_capacity(texts.len());

    for (i, batch) in texts.chunks(batch_size).enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let vectors = embedder.embed_batch(batch).await?;
        if vectors.len() != batch.len() {
            return Err(RagError::Provider {
                failure: ProviderFailure::Invalid,
                message: format!("expected {} embeddings, got {}", batch.len(), vectors.len()),
            });
        }

        for v in vectors {
            if v.is_empty() {
                return Err(RagError::EmptyEmbedding);
            }
            match want {
                Some(w) if v.len() != w => {
                    return Err(RagError::DimensionMismatch { got: v.len(), want: w });
                }
                None => want = Some(v.len()),
                _ => {}
            }
            out.push(v);
            progress.step("embedding");
        }
        debug!(batch = i, done = out.len(), "batch embedded");
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future::BoxFuture;
    use tokio::time::Instant;

    use super::*;
    use crate::progress::NoopProgress;

    struct Scripted {
        calls: AtomicUsize,
        dims: Vec<usize>,
    }

    impl Embedder for Scripted {
        fn embed<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
            Box::pin(async move {
                let i = self.calls.fetch_add(1, Ordering::SeqCst);
                let dim = self.dims.get(i).copied().unwrap_or(3);
                Ok(vec![1.0; dim])
            })
        }

        fn name(&self) -> String {
            "scripted".into()
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("text {i}")).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_between_batches_only() {
        let e = Scripted {
            calls: AtomicUsize::new(0),
            dims: vec![],
        };
        let started = Instant::now();
        let out = embed_all(&e, &texts(5), 2, Duration::from_millis(100), None, &NoopProgress)
            .await
            .unwrap();
        assert_eq!(out.len(), 5);
        assert_eq!(e.calls.load(Ordering::SeqCst), 5);
        // 3 batches → 2 pauses
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(300));
    }

    #[tokio::test]
    async fn inconsistent_dimensions_are_rejected() {
        let e = Scripted {
            calls: AtomicUsize::new(0),
            dims: vec![3, 4],
        };
        let err = embed_all(&e, &texts(2), 8, Duration::ZERO, None, &NoopProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { got: 4, want: 3 }));
    }

    #[tokio::test]
    async fn empty_vectors_are_rejected() {
        let e = Scripted {
            calls: AtomicUsize::new(0),
            dims: vec![0],
        };
        let err = embed_all(&e, &texts(1), 8, Duration::ZERO, None, &NoopProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::EmptyEmbedding));
    }
}
