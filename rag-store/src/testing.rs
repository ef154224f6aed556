//! Deterministic test doubles (enabled by `cfg(test)` or the `test-util` feature).

use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::BoxFuture;

use crate::embed::Embedder;
use crate::errors::{ProviderFailure, RagError};

/// Bag-of-words embedder over a fixed vocabulary.
///
/// Dimension = vocabulary size; each component counts occurrences of one
/// word (a trailing plural `s` is ignored when the singular is known).
#[derive(Debug)]
pub struct KeywordEmbedder {
    vocabulary: Vec<String>,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new(vocabulary: &[&str]) -> Self {
        Self {
            vocabulary: vocabulary.iter().map(|w| w.to_lowercase()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0; self.vocabulary.len()];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let slot = self.vocabulary.iter().position(|w| w == token).or_else(|| {
                token
                    .strip_suffix('s')
                    .and_then(|stem| self.vocabulary.iter().position(|w| w == stem))
            });
            if let Some(i) = slot {
                v[i] += 1.0;
            }
        }
        v
    }
}

impl Embedder for KeywordEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.vectorize(text))
        })
    }

    fn name(&self) -> String {
        format!("keyword:{}", self.vocabulary.len())
    }
}

/// Embedder whose every call fails with a fixed provider error.
#[derive(Debug, Clone)]
pub struct FailingEmbedder {
    failure: ProviderFailure,
}

impl FailingEmbedder {
    pub fn new(failure: ProviderFailure) -> Self {
        Self { failure }
    }

    pub fn rate_limited() -> Self {
        Self::new(ProviderFailure::RateLimited)
    }

    pub fn unauthorized() -> Self {
        Self::new(ProviderFailure::Auth)
    }
}

impl Embedder for FailingEmbedder {
    fn embed<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
        Box::pin(async move {
            Err(RagError::Provider {
                failure: self.failure,
                message: "scripted embedding failure".into(),
            })
        })
    }

    fn name(&self) -> String {
        "failing".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_words_and_plurals() {
        let e = KeywordEmbedder::new(&["skill", "aws"]);
        assert_eq!(e.vectorize("Skills: AWS, aws and skill"), vec![2.0, 2.0]);
        assert_eq!(e.vectorize("nothing known"), vec![0.0, 0.0]);
    }
}
