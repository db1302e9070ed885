// src/services/dispatcher.rs
use std::sync::Arc;

use super::local_responder::{LocalError, LocalReply, LocalResponder};
use super::remote_responder::RemoteResponder;
use crate::error::AppError;
use crate::message::{ChatResponse, Source};

/// Remote replies must be longer than this many trimmed characters.
pub const MIN_REMOTE_REPLY_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Local,
    Remote,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub text: String,
    pub confidence: Option<f32>,
    pub originator: Tier,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Answered(DispatchOutcome),
    /// Neither tier produced a usable reply.
    Unanswered,
}

pub fn build_prompt(message: &str) -> String {
    format!(
        "You are a smart and friendly AI assistant that helps students with homework \
and research questions. Answer in a way that is easy to understand, clear and accurate. \
If you do not know the answer, say that you do not know.
Do not make up information.
My question is: {message}
Your answer: "
    )
}

/// Picks between the local matcher and the remote model for each message.
#[derive(Clone)]
pub struct Dispatcher {
    local: Arc<dyn LocalResponder>,
    remote: Arc<dyn RemoteResponder>,
    apology: String,
}

impl Dispatcher {
    pub fn new(
        local: Arc<dyn LocalResponder>,
        remote: Arc<dyn RemoteResponder>,
        apology: impl Into<String>,
    ) -> Self {
        Self { local, remote, apology: apology.into() }
    }

    pub async fn dispatch(&self, message: &str) -> Result<Dispatch, AppError> {
        if message.trim().is_empty() {
            return Err(AppError::BadRequest("Message cannot be empty".to_string()));
        }

        match self.respond_locally(message).await {
            Ok(reply) if reply.text != self.local.default_response() => {
                tracing::info!(similarity = reply.similarity, "local matcher answered");
                return Ok(Dispatch::Answered(DispatchOutcome {
                    text: reply.text,
                    confidence: Some(reply.similarity),
                    originator: Tier::Local,
                }));
            }
            Ok(reply) => {
                tracing::info!(similarity = reply.similarity, "no local match, asking remote model");
            }
            Err(e) => {
                tracing::warn!(error = %e, "local matcher failed, asking remote model");
            }
        }

        match self.remote.generate(&build_prompt(message)).await {
            Ok(text) if text.trim().chars().count() > MIN_REMOTE_REPLY_CHARS => {
                tracing::info!("remote model answered");
                Ok(Dispatch::Answered(DispatchOutcome {
                    text,
                    confidence: None,
                    originator: Tier::Remote,
                }))
            }
            Ok(text) => {
                tracing::warn!(len = text.trim().chars().count(), "remote reply too short");
                Ok(Dispatch::Unanswered)
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote model failed");
                Ok(Dispatch::Unanswered)
            }
        }
    }

    // Matching is CPU-bound, so it runs on the blocking pool.
    async fn respond_locally(&self, message: &str) -> Result<LocalReply, LocalError> {
        let local = Arc::clone(&self.local);
        let message = message.to_owned();
        tokio::task::spawn_blocking(move || local.respond(&message))
            .await
            .map_err(|e| LocalError::Other(format!("matcher task failed: {e}")))?
    }

    /// Dispatches and renders the wire response.
    pub async fn reply(&self, message: &str) -> Result<ChatResponse, AppError> {
        Ok(match self.dispatch(message).await? {
            Dispatch::Answered(outcome) => ChatResponse {
                reply: outcome.text,
                source: match outcome.originator {
                    Tier::Local => Source::Local,
                    Tier::Remote => Source::Remote,
                },
            },
            Dispatch::Unanswered => ChatResponse { reply: self.apology.clone(), source: Source::Error },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_message() {
        let prompt = build_prompt("What is 2 + 2?");
        assert!(prompt.contains("My question is: What is 2 + 2?"));
        assert!(prompt.trim_end().ends_with("Your answer:"));
    }
}
