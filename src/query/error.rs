// src/query/error.rs

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("backend returned {status} for {path}: {detail}")]
    Status {
        path: String,
        status: u16,
        detail: String,
    },
    #[error("unexpected response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl QueryError {
    /// Whether the backend could not be reached or answered with an error,
    /// as opposed to answering with something unparseable.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }
}
