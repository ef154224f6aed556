use profile_corpus::DocumentInput;
use serde::Deserialize;

/// Optional body of `POST /api/initialize`.
#[derive(Debug, Default, Deserialize)]
pub struct InitializeRequest {
    /// Replaces the built-in profile corpus for this run.
    #[serde(default)]
    pub documents: Option<Vec<DocumentInput>>,
    /// Re-embed even when the index is already populated.
    #[serde(default)]
    pub force: bool,
}

impl InitializeRequest {
    /// Empty or whitespace-only bodies mean "defaults".
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
    }
}
