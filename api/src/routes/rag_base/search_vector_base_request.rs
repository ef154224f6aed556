use rag_store::RagFilter;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Body of `POST /api/search`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchVectorBaseRequest {
    pub query: String,
    pub top_k: Option<usize>,
    pub min_score: Option<f32>,
    /// Exact-match metadata filter, e.g. `{ "category": "skills" }`.
    #[serde(default)]
    pub filter: Map<String, Value>,
}

impl SearchVectorBaseRequest {
    pub fn rag_filter(&self) -> Option<RagFilter> {
        let equals: Vec<(String, Value)> = self
            .filter
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        (!equals.is_empty()).then_some(RagFilter { equals })
    }
}
