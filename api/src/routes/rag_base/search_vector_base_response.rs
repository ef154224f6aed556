use rag_store::SearchResult;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SearchVectorBaseResponse {
    pub query: String,
    pub count: usize,
    pub results: Vec<SearchResult>,
}
