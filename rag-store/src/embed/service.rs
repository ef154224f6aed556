//! Embedder backed by the shared LLM service profiles.

use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use futures::future::BoxFuture;
use tracing::warn;

use crate::{embed::Embedder, errors::RagError};

/// Embedder that delegates to the embedding profile of [`LlmServiceProfiles`].
#[derive(Clone)]
pub struct ServiceEmbedder {
    svc: Arc<LlmServiceProfiles>,
    /// Expected dimension, checked on every vector when set.
    dim: Option<usize>,
}

impl ServiceEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>, dim: Option<usize>) -> Self {
        Self { svc, dim }
    }

    fn check(&self, v: &[f32]) -> Result<(), RagError> {
        if v.is_empty() {
            return Err(RagError::EmptyEmbedding);
        }
        match self.dim {
            Some(want) if v.len() != want => {
                warn!(got = v.len(), want, "embedding dimension differs from EMBEDDING_DIM");
                Err(RagError::DimensionMismatch { got: v.len(), want })
            }
            _ => Ok(()),
        }
    }
}

impl Embedder for ServiceEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
        Box::pin(async move {
            let v = self.svc.embed(text).await?;
            self.check(&v)?;
            Ok(v)
        })
    }

    fn embed_batch<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, RagError>> {
        Box::pin(async move {
            let out = self.svc.embed_batch(texts).await?;
            for v in &out {
                self.check(v)?;
            }
            Ok(out)
        })
    }

    fn name(&self) -> String {
        let (_, _, embedding) = self.svc.profiles();
        format!("{}:{}", embedding.provider, embedding.model)
    }
}
