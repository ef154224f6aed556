//! Runtime configuration for indexing and retrieval.

use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::errors::RagError;

/// Which vector index implementation backs the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    /// Process-local brute-force index.
    Memory,
    /// Managed Qdrant collection.
    Qdrant,
}

impl FromStr for IndexBackend {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Ok(Self::Memory),
            "qdrant" => Ok(Self::Qdrant),
            other => Err(RagError::Config(format!(
                "VECTOR_BACKEND must be `memory` or `qdrant`, got `{other}`"
            ))),
        }
    }
}

/// Qdrant connection settings.
#[derive(Clone, Debug, PartialEq)]
pub struct QdrantSettings {
    /// gRPC endpoint, e.g. `http://localhost:6334`.
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
}

impl Default for QdrantSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".into(),
            api_key: None,
            collection: "profile_chunks".into(),
        }
    }
}

/// Mean-score cutoffs for the High / Medium confidence buckets.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ConfidenceThresholds {
    pub high: f32,
    pub medium: f32,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: 0.7,
            medium: 0.5,
        }
    }
}

/// Configuration for indexing and retrieval.
#[derive(Clone, Debug, PartialEq)]
pub struct RagConfig {
    pub backend: IndexBackend,
    pub qdrant: QdrantSettings,
    /// Results fetched for context building.
    pub top_k: usize,
    /// Similarity floor for broad searches.
    pub min_score: f32,
    /// Similarity floor for narrow lookups (one company, one skill area).
    pub narrow_min_score: f32,
    pub thresholds: ConfidenceThresholds,
    /// Texts per embedding request during bulk indexing.
    pub embed_batch_size: usize,
    /// Pause between embedding requests during bulk indexing.
    pub embed_delay: Duration,
    /// Expected embedding dimension; checked on every vector when set.
    pub embedding_dim: Option<usize>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            backend: IndexBackend::Memory,
            qdrant: QdrantSettings::default(),
            top_k: 8,
            min_score: 0.6,
            narrow_min_score: 0.65,
            thresholds: ConfidenceThresholds::default(),
            embed_batch_size: 16,
            embed_delay: Duration::from_millis(100),
            embedding_dim: None,
        }
    }
}

fn parse<T: FromStr>(
    lookup: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, RagError> {
    match lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(v) => v
            .parse::<T>()
            .map_err(|_| RagError::Config(format!("{key} has an invalid value `{v}`"))),
        None => Ok(default),
    }
}

fn opt(lookup: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl RagConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, RagError> {
        Self::from_lookup(&|k| std::env::var(k).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults.
    ///
    /// Variables: `VECTOR_BACKEND`, `QDRANT_URL`, `QDRANT_API_KEY`,
    /// `QDRANT_COLLECTION`, `RAG_TOP_K`, `RAG_MIN_SCORE`, `RAG_NARROW_MIN_SCORE`,
    /// `CONFIDENCE_HIGH`, `CONFIDENCE_MEDIUM`, `EMBED_BATCH_SIZE`,
    /// `EMBED_DELAY_MS`, `EMBEDDING_DIM`.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, RagError> {
        let d = Self::default();
        let backend = match opt(lookup, "VECTOR_BACKEND") {
            Some(v) => v.parse()?,
            None => d.backend,
        };
        let cfg = Self {
            backend,
            qdrant: QdrantSettings {
                url: opt(lookup, "QDRANT_URL").unwrap_or(d.qdrant.url),
                api_key: opt(lookup, "QDRANT_API_KEY"),
                collection: opt(lookup, "QDRANT_COLLECTION").unwrap_or(d.qdrant.collection),
            },
            top_k: parse(lookup, "RAG_TOP_K", d.top_k)?,
            min_score: parse(lookup, "RAG_MIN_SCORE", d.min_score)?,
            narrow_min_score: parse(lookup, "RAG_NARROW_MIN_SCORE", d.narrow_min_score)?,
            thresholds: ConfidenceThresholds {
                high: parse(lookup, "CONFIDENCE_HIGH", d.thresholds.high)?,
                medium: parse(lookup, "CONFIDENCE_MEDIUM", d.thresholds.medium)?,
            },
            embed_batch_size: parse(lookup, "EMBED_BATCH_SIZE", d.embed_batch_size)?,
            embed_delay: Duration::from_millis(parse(lookup, "EMBED_DELAY_MS", 100u64)?),
            embedding_dim: opt(lookup, "EMBEDDING_DIM")
                .map(|v| {
                    v.parse::<usize>()
                        .map_err(|_| RagError::Config(format!("EMBEDDING_DIM has an invalid value `{v}`")))
                })
                .transpose()?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.top_k == 0 {
            return Err(RagError::Config("RAG_TOP_K must be > 0".into()));
        }
        if self.embed_batch_size == 0 {
            return Err(RagError::Config("EMBED_BATCH_SIZE must be > 0".into()));
        }
        for (name, v) in [
            ("RAG_MIN_SCORE", self.min_score),
            ("RAG_NARROW_MIN_SCORE", self.narrow_min_score),
            ("CONFIDENCE_HIGH", self.thresholds.high),
            ("CONFIDENCE_MEDIUM", self.thresholds.medium),
        ] {
            if !(-1.0..=1.0).contains(&v) {
                return Err(RagError::Config(format!("{name} must be within -1.0..=1.0")));
            }
        }
        if self.thresholds.medium > self.thresholds.high {
            return Err(RagError::Config(
                "CONFIDENCE_MEDIUM must not exceed CONFIDENCE_HIGH".into(),
            ));
        }
        if self.backend == IndexBackend::Qdrant {
            if self.qdrant.url.trim().is_empty() {
                return Err(RagError::Config("QDRANT_URL is empty".into()));
            }
            if self.qdrant.collection.trim().is_empty() {
                return Err(RagError::Config("QDRANT_COLLECTION is empty".into()));
            }
        }
        if self.embedding_dim == Some(0) {
            return Err(RagError::Config("EMBEDDING_DIM must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let cfg = RagConfig::from_lookup(&lookup(&[])).unwrap();
        assert_eq!(cfg, RagConfig::default());
        assert_eq!(cfg.thresholds.high, 0.7);
        assert_eq!(cfg.min_score, 0.6);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = RagConfig::from_lookup(&lookup(&[
            ("VECTOR_BACKEND", "qdrant"),
            ("QDRANT_COLLECTION", "twin"),
            ("CONFIDENCE_HIGH", "0.5"),
            ("CONFIDENCE_MEDIUM", "0.3"),
            ("EMBED_DELAY_MS", "250"),
            ("EMBEDDING_DIM", "384"),
        ]))
        .unwrap();
        assert_eq!(cfg.backend, IndexBackend::Qdrant);
        assert_eq!(cfg.qdrant.collection, "twin");
        assert_eq!(cfg.thresholds, ConfidenceThresholds { high: 0.5, medium: 0.3 });
        assert_eq!(cfg.embed_delay, Duration::from_millis(250));
        assert_eq!(cfg.embedding_dim, Some(384));
    }

    #[test]
    fn rejects_inverted_thresholds_and_garbage() {
        assert!(RagConfig::from_lookup(&lookup(&[("CONFIDENCE_MEDIUM", "0.9")])).is_err());
        assert!(RagConfig::from_lookup(&lookup(&[("RAG_TOP_K", "many")])).is_err());
        assert!(RagConfig::from_lookup(&lookup(&[("VECTOR_BACKEND", "faiss")])).is_err());
    }
}
