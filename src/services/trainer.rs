// src/services/trainer.rs
//! Builds the matcher store from the bundled training corpus.
//!
//! Training is an explicit step: `serve` calls [`ensure_trained`] before
//! opening the store and the `train` command can run it on its own.

use std::{
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use serde::Deserialize;
use thiserror::Error;

use super::matcher::{Exchange, MatcherStore, StoreMarker};

const BUILTIN_CORPUS: &str = include_str!("../../corpus/training.json");

#[derive(Debug, Deserialize)]
pub struct Corpus {
    pub name: String,
    pub conversations: Vec<Vec<String>>,
}

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("corpus JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write matcher store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainOutcome {
    AlreadyTrained,
    Trained { exchanges: usize },
}

pub fn builtin_corpus() -> Result<Corpus, TrainError> {
    Ok(serde_json::from_str(BUILTIN_CORPUS)?)
}

/// Every utterance after the first in a conversation answers the one before it.
pub fn exchanges_from(corpus: &Corpus) -> Vec<Exchange> {
    corpus
        .conversations
        .iter()
        .flat_map(|conversation| {
            conversation.windows(2).map(|pair| Exchange {
                prompt: pair[0].trim().to_string(),
                response: pair[1].trim().to_string(),
            })
        })
        .filter(|ex| !ex.prompt.is_empty() && !ex.response.is_empty())
        .collect()
}

/// Trains only when the store is missing, smaller than `min_bytes`, or lacks
/// a marker for the bundled corpus.
pub async fn ensure_trained(path: &Path, min_bytes: u64) -> Result<TrainOutcome, TrainError> {
    let corpus = builtin_corpus()?;

    if is_trained(path, min_bytes, &corpus.name).await {
        tracing::info!(store = %path.display(), "matcher store already trained");
        return Ok(TrainOutcome::AlreadyTrained);
    }

    write_store(path, &corpus).await
}

/// Unconditionally rebuilds the store.
pub async fn train(path: &Path) -> Result<TrainOutcome, TrainError> {
    let corpus = builtin_corpus()?;
    write_store(path, &corpus).await
}

async fn is_trained(path: &Path, min_bytes: u64, corpus_name: &str) -> bool {
    let size = match tokio::fs::metadata(path).await {
        Ok(meta) => meta.len(),
        Err(_) => return false,
    };
    if size < min_bytes {
        tracing::info!(store = %path.display(), size, min_bytes, "matcher store below minimum size");
        return false;
    }

    match MatcherStore::load(path).await {
        Ok(store) => store.marker.is_some_and(|m| m.corpus == corpus_name),
        Err(e) => {
            tracing::warn!(error = %e, "unreadable matcher store, retraining");
            false
        }
    }
}

async fn write_store(path: &Path, corpus: &Corpus) -> Result<TrainOutcome, TrainError> {
    tracing::info!(store = %path.display(), corpus = %corpus.name, "training matcher");

    let exchanges = exchanges_from(corpus);
    let count = exchanges.len();
    let store = MatcherStore {
        marker: Some(StoreMarker { corpus: corpus.name.clone(), trained_at: unix_now() }),
        exchanges,
    };
    let json = serde_json::to_vec_pretty(&store)?;

    let io_err = |source: std::io::Error| TrainError::Io { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    // Write then rename so a half-written store never carries a marker.
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, &json).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;

    tracing::info!(exchanges = count, "training finished");
    Ok(TrainOutcome::Trained { exchanges: count })
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
