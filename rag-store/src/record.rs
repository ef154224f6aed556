//! Core data models used by the library.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Descriptive metadata attached to every chunk.
///
/// Known fields are typed; anything else lands in `extra` and round-trips
/// unchanged (flattened on the wire).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(default)]
    pub category: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ChunkMetadata {
    pub fn new(category: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// JSON value of a metadata field by its wire name.
    pub fn field(&self, key: &str) -> Option<Value> {
        match key {
            "category" => Some(Value::String(self.category.clone())),
            "type" => Some(Value::String(self.kind.clone())),
            "project" => self.project.clone().map(Value::String),
            "title" => self.title.clone().map(Value::String),
            "source" => self.source.clone().map(Value::String),
            "keywords" => Some(Value::Array(
                self.keywords.iter().cloned().map(Value::String).collect(),
            )),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Display title: title, else category, else type, else a generic label.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| Some(self.category.as_str()).filter(|c| !c.is_empty()))
            .or_else(|| Some(self.kind.as_str()).filter(|k| !k.is_empty()))
            .unwrap_or("Professional Content")
    }
}

/// A unit of retrievable text. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// A chunk together with its embedding.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A ranked retrieval hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub score: f32,
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// Exact-match filter over metadata fields, all conditions must hold.
///
/// Array-valued fields (e.g. `keywords`) match when any element equals the value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RagFilter {
    pub equals: Vec<(String, Value)>,
}

impl RagFilter {
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            equals: vec![(key.into(), value.into())],
        }
    }

    pub fn and(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
    }

    pub fn matches(&self, metadata: &ChunkMetadata) -> bool {
        self.equals.iter().all(|(key, want)| match metadata.field(key) {
            Some(Value::Array(items)) => items.iter().any(|v| v == want),
            Some(v) => &v == want,
            None => false,
        })
    }
}

/// Parameters of a single similarity search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchOptions {
    pub top_k: usize,
    pub min_similarity_score: f32,
    pub filter: Option<RagFilter>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            min_similarity_score: 0.6,
            filter: None,
        }
    }
}

impl SearchOptions {
    pub fn new(top_k: usize, min_similarity_score: f32) -> Self {
        Self {
            top_k,
            min_similarity_score,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: RagFilter) -> Self {
        self.filter = Some(filter).filter(|f| !f.is_empty());
        self
    }
}

/// Size of an index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IndexInfo {
    pub count: usize,
    /// `None` until the first upsert fixes the dimension.
    pub dimension: Option<usize>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn metadata_wire_format_uses_type_and_flattens_extra() {
        let raw = json!({
            "category": "experience",
            "type": "result",
            "project": "Atlas",
            "keywords": ["rust", "aws"],
            "company": "Acme"
        });
        let meta: ChunkMetadata = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(meta.kind, "result");
        assert_eq!(meta.extra.get("company"), Some(&json!("Acme")));
        assert_eq!(serde_json::to_value(&meta).unwrap(), raw);
    }

    #[test]
    fn display_title_fallback_order() {
        let mut meta = ChunkMetadata::new("skills", "technical");
        assert_eq!(meta.display_title(), "skills");
        meta.title = Some("Technical Skills".into());
        assert_eq!(meta.display_title(), "Technical Skills");
        let meta = ChunkMetadata::new("", "overview");
        assert_eq!(meta.display_title(), "overview");
        assert_eq!(ChunkMetadata::default().display_title(), "Professional Content");
    }

    #[test]
    fn filter_matches_scalars_and_arrays() {
        let mut meta = ChunkMetadata::new("experience", "action");
        meta.keywords = vec!["kubernetes".into(), "aws".into()];
        meta.extra.insert("company".into(), json!("Acme"));

        assert!(RagFilter::eq("category", "experience").matches(&meta));
        assert!(RagFilter::eq("keywords", "aws").matches(&meta));
        assert!(RagFilter::eq("company", "Acme").and("type", "action").matches(&meta));
        assert!(!RagFilter::eq("company", "Globex").matches(&meta));
        assert!(!RagFilter::eq("project", "Atlas").matches(&meta));
        assert!(RagFilter::default().matches(&meta));
    }
}
