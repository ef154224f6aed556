use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read profile {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("profile JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid profile: {0}")]
    Invalid(String),
}
