#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use study_assistant_backend::services::dispatcher::Dispatcher;
use study_assistant_backend::services::local_responder::{LocalError, LocalReply, LocalResponder};
use study_assistant_backend::services::remote_responder::{RemoteError, RemoteResponder};

pub const SENTINEL: &str = "Sorry, I don't understand your question.";
pub const APOLOGY: &str = "Sorry, I can't answer this question.";

pub enum LocalBehavior {
    Answer(&'static str),
    Miss,
    Fail,
    Panic,
}

pub struct FakeLocal {
    behavior: LocalBehavior,
    pub calls: AtomicUsize,
}

impl FakeLocal {
    pub fn new(behavior: LocalBehavior) -> Arc<Self> {
        Arc::new(Self { behavior, calls: AtomicUsize::new(0) })
    }
}

impl LocalResponder for FakeLocal {
    fn respond(&self, _text: &str) -> Result<LocalReply, LocalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            LocalBehavior::Answer(text) => Ok(LocalReply { text: text.to_string(), similarity: 0.97 }),
            LocalBehavior::Miss => Ok(LocalReply { text: SENTINEL.to_string(), similarity: 0.2 }),
            LocalBehavior::Fail => Err(LocalError::Other("store unavailable".into())),
            LocalBehavior::Panic => panic!("matcher crashed"),
        }
    }

    fn default_response(&self) -> &str {
        SENTINEL
    }
}

pub enum RemoteBehavior {
    Reply(&'static str),
    Fail,
}

pub struct FakeRemote {
    behavior: RemoteBehavior,
    pub calls: AtomicUsize,
    pub last_prompt: std::sync::Mutex<Option<String>>,
}

impl FakeRemote {
    pub fn new(behavior: RemoteBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_prompt: std::sync::Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteResponder for FakeRemote {
    async fn generate(&self, prompt: &str) -> Result<String, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        match self.behavior {
            RemoteBehavior::Reply(text) => Ok(text.to_string()),
            RemoteBehavior::Fail => Err(RemoteError::Status { status: 503, body: "unavailable".into() }),
        }
    }
}

pub fn dispatcher(local: Arc<FakeLocal>, remote: Arc<FakeRemote>) -> Dispatcher {
    Dispatcher::new(local, remote, APOLOGY)
}
