// src/services/local_responder.rs
use thiserror::Error;

/// Best candidate returned by a local responder.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalReply {
    pub text: String,
    /// Similarity between the input and the matched prompt, in `[0, 1]`.
    pub similarity: f32,
}

#[derive(Debug, Error)]
pub enum LocalError {
    #[error("matcher store has no exchanges")]
    EmptyStore,

    #[error("local responder failed: {0}")]
    Other(String),
}

/// A deterministic responder that answers from previously trained exchanges.
///
/// When nothing is similar enough, implementations return
/// [`default_response`](LocalResponder::default_response) as the reply text.
pub trait LocalResponder: Send + Sync {
    fn respond(&self, text: &str) -> Result<LocalReply, LocalError>;

    fn default_response(&self) -> &str;
}
