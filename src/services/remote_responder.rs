// src/services/remote_responder.rs
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("model API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model refused to answer: {0}")]
    Blocked(String),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

// The URL is dropped so request details never reach the logs.
impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Request(err.without_url())
    }
}

/// A hosted text-generation model. One call, no retries.
#[async_trait]
pub trait RemoteResponder: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, RemoteError>;
}
