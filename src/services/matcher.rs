// src/services/matcher.rs
//! Best-match responder over a trained store of prompt/response exchanges.
//!
//! The store is a JSON file written by the trainer and only read here. It is
//! loaded once at startup and matched against in memory.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::local_responder::{LocalError, LocalReply, LocalResponder};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub prompt: String,
    pub response: String,
}

/// Proof that the store was produced by a completed training run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMarker {
    pub corpus: String,
    /// Seconds since the Unix epoch.
    pub trained_at: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatcherStore {
    pub marker: Option<StoreMarker>,
    #[serde(default)]
    pub exchanges: Vec<Exchange>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read matcher store {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("matcher store {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl MatcherStore {
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

struct Entry {
    normalized_prompt: Vec<char>,
    response: String,
}

/// In-memory, read-only matcher built from a [`MatcherStore`].
pub struct CorpusMatcher {
    entries: Vec<Entry>,
    threshold: f32,
    default_response: String,
}

impl CorpusMatcher {
    pub fn new(store: MatcherStore, threshold: f32, default_response: impl Into<String>) -> Self {
        let entries = store
            .exchanges
            .into_iter()
            .filter(|ex| !ex.prompt.trim().is_empty() && !ex.response.trim().is_empty())
            .map(|ex| Entry {
                normalized_prompt: normalize(&ex.prompt).chars().collect(),
                response: ex.response,
            })
            .collect();

        Self { entries, threshold, default_response: default_response.into() }
    }

    pub async fn open(
        path: &Path,
        threshold: f32,
        default_response: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let store = MatcherStore::load(path).await?;
        Ok(Self::new(store, threshold, default_response))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LocalResponder for CorpusMatcher {
    fn respond(&self, text: &str) -> Result<LocalReply, LocalError> {
        if self.entries.is_empty() {
            return Err(LocalError::EmptyStore);
        }

        let input: Vec<char> = normalize(text).chars().collect();

        // Prompts the length difference alone rules out are never scored, so
        // the similarity reported on a miss is the best among scored prompts.
        let mut best: Option<&Entry> = None;
        let mut best_score = 0.0_f32;
        for entry in &self.entries {
            let ceiling = similarity_ceiling(input.len(), entry.normalized_prompt.len());
            if ceiling < self.threshold || (best.is_some() && ceiling <= best_score) {
                continue;
            }

            let score = similarity(&input, &entry.normalized_prompt);
            if best.is_none() || score > best_score {
                best = Some(entry);
                best_score = score;
            }
            if score >= 1.0 {
                break;
            }
        }

        Ok(match best {
            Some(entry) if best_score >= self.threshold => LocalReply {
                text: entry.response.clone(),
                similarity: best_score,
            },
            _ => LocalReply { text: self.default_response.clone(), similarity: best_score },
        })
    }

    fn default_response(&self) -> &str {
        &self.default_response
    }
}

/// Trims, collapses whitespace runs and lowercases.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Upper bound of [`similarity`] for inputs of these lengths, since the
/// edit distance is at least the length difference.
fn similarity_ceiling(a_len: usize, b_len: usize) -> f32 {
    let longest = a_len.max(b_len);
    if longest == 0 {
        return 1.0;
    }
    1.0 - a_len.abs_diff(b_len) as f32 / longest as f32
}

/// Levenshtein ratio: `1 - distance / max(len)`. Two empty inputs score 1.
pub fn similarity(a: &[char], b: &[char]) -> f32 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f32 / longest as f32
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
