//! Embedding abstraction.
//!
//! Async is required because real providers (Ollama, OpenAI, Hugging Face)
//! perform HTTP requests.

use futures::future::BoxFuture;

use crate::errors::RagError;

pub mod service;
pub mod unconfigured;

pub use service::ServiceEmbedder;
pub use unconfigured::UnconfiguredEmbedder;

/// Text → fixed-length vector.
///
/// Implementations must return vectors of one dimension for the lifetime of
/// an index and must never substitute zeros for a failed call.
pub trait Embedder: Send + Sync {
    /// Embeds a single text.
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>>;

    /// Embeds many texts, preserving order. Defaults to one call per text.
    fn embed_batch<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, RagError>> {
        Box::pin(async move {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        })
    }

    /// Short identifier for logs (`provider:model`).
    fn name(&self) -> String;
}
