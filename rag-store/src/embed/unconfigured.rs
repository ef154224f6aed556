use futures::future::BoxFuture;

use crate::{embed::Embedder, errors::RagError};

/// Stand-in used when the embedding provider could not be configured.
///
/// Every call fails with [`RagError::Config`] carrying the original reason,
/// so the server can start and report the problem per request.
#[derive(Clone, Debug)]
pub struct UnconfiguredEmbedder {
    reason: String,
}

impl UnconfiguredEmbedder {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Embedder for UnconfiguredEmbedder {
    fn embed<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
        Box::pin(async move { Err(RagError::Config(self.reason.clone())) })
    }

    fn name(&self) -> String {
        "unconfigured".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_call_reports_reason() {
        let e = UnconfiguredEmbedder::new("HUGGINGFACE_API_KEY is not set");
        let err = e.embed("hello").await.unwrap_err();
        assert!(err.to_string().contains("HUGGINGFACE_API_KEY"));
        assert!(e.embed_batch(&["a".to_string()]).await.is_err());
    }
}
