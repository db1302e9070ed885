// src/config.rs
use std::{path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;

pub const DEFAULT_RESPONSE: &str = "Sorry, I don't understand your question.";
pub const APOLOGY_RESPONSE: &str = "Sorry, I can't answer this question.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set in the environment")]
    MissingVar(&'static str),

    #[error("{var} has an invalid value {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Where the local matcher keeps its trained exchanges and how it matches.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    pub store_path: PathBuf,
    pub min_store_bytes: u64,
    pub similarity_threshold: f32,
    pub default_response: String,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub apology_response: String,
    pub matcher: MatcherConfig,
    pub gemini: GeminiConfig,
}

impl MatcherConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let threshold: f32 = parse_or(&lookup, "SIMILARITY_THRESHOLD", 0.90)?;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidValue {
                var: "SIMILARITY_THRESHOLD",
                value: threshold.to_string(),
            });
        }

        Ok(Self {
            store_path: lookup("MATCHER_STORE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/matcher.json")),
            min_store_bytes: parse_or(&lookup, "MATCHER_MIN_STORE_BYTES", 512)?,
            similarity_threshold: threshold,
            default_response: non_blank_or(&lookup, "DEFAULT_RESPONSE", DEFAULT_RESPONSE)?,
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("GEMINI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingVar("GEMINI_API_KEY"))?;

        let gemini = GeminiConfig {
            api_key,
            model: lookup("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.0-flash".to_string()),
            base_url: lookup("GEMINI_BASE_URL")
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string()),
            timeout: Duration::from_secs(parse_or(&lookup, "REMOTE_TIMEOUT_SECS", 60)?),
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            apology_response: non_blank_or(&lookup, "APOLOGY_RESPONSE", APOLOGY_RESPONSE)?,
            matcher: MatcherConfig::from_lookup(&lookup)?,
            gemini,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        None => Ok(default),
    }
}

// Replies must never be empty, so a blank override is a configuration error.
fn non_blank_or(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: &str,
) -> Result<String, ConfigError> {
    match lookup(var) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::InvalidValue { var, value }),
        Some(value) => Ok(value),
        None => Ok(default.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("GEMINI_API_KEY")));
    }

    #[test]
    fn defaults_apply() {
        let cfg = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3000");
        assert_eq!(cfg.gemini.model, "gemini-2.0-flash");
        assert_eq!(cfg.matcher.similarity_threshold, 0.90);
        assert_eq!(cfg.matcher.default_response, DEFAULT_RESPONSE);
        assert_eq!(cfg.apology_response, APOLOGY_RESPONSE);
    }

    #[test]
    fn matcher_config_does_not_need_api_key() {
        let cfg = MatcherConfig::from_lookup(lookup_from(&[("MATCHER_STORE", "/tmp/x.json")]))
            .unwrap();
        assert_eq!(cfg.store_path, PathBuf::from("/tmp/x.json"));
    }

    #[test]
    fn rejects_blank_reply_overrides() {
        let err = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("APOLOGY_RESPONSE", "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "APOLOGY_RESPONSE", .. }));

        let err = MatcherConfig::from_lookup(lookup_from(&[("DEFAULT_RESPONSE", "")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "DEFAULT_RESPONSE", .. }));

        let cfg = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("APOLOGY_RESPONSE", "Xin lỗi, tôi không thể trả lời câu hỏi này."),
        ]))
        .unwrap();
        assert_eq!(cfg.apology_response, "Xin lỗi, tôi không thể trả lời câu hỏi này.");
    }

    #[test]
    fn rejects_bad_threshold() {
        let err = MatcherConfig::from_lookup(lookup_from(&[("SIMILARITY_THRESHOLD", "1.5")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "SIMILARITY_THRESHOLD", .. }));

        let err = MatcherConfig::from_lookup(lookup_from(&[("SIMILARITY_THRESHOLD", "high")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
