//! Common types and utilities shared across Briefly crates.
//!
//! This crate defines provider configuration, credential handling,
//! observability helpers, and the shared error type used throughout the
//! Briefly workspace. It stays dependency‑light so every crate can pull it in.
//!
//! # Overview
//!
//! - [`LlmConfig`]: which generative-text provider summarizes a run
//! - [`Credentials`] and [`Secret`]: per-run API keys that never reach logs
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`BrieflyError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use briefly_common::{Credentials, Secret};
//!
//! let creds = Credentials::new(Secret::new("llm-key"), Secret::new("serp-key"));
//! assert_eq!(creds.llm_api_key.expose(), "llm-key");
//! assert!(!format!("{creds:?}").contains("serp-key"));
//! ```
use serde::Deserialize;
use std::fmt;

pub mod observability;

/// Default Gemini model used for summaries.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
/// Default OpenAI model used for summaries.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// An API key or token.
///
/// `Debug` and `Display` never print the wrapped value; callers must go
/// through [`Secret::expose`] to read it.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True when the key is missing or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Provider keys for a single pipeline run.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Key for the generative-text provider.
    pub llm_api_key: Secret,
    /// Key for the search provider.
    pub search_api_key: Secret,
}

impl Credentials {
    pub fn new(llm_api_key: Secret, search_api_key: Secret) -> Self {
        Self {
            llm_api_key,
            search_api_key,
        }
    }
}

/// Configuration for the generative-text provider used by the summarizer.
///
/// See the `briefly-llm` crate for concrete client implementations.
#[derive(Debug, Clone)]
pub enum LlmConfig {
    Gemini {
        api_key: Secret,
        model: String,
        /// Override for the API base URL (tests, proxies).
        endpoint: Option<String>,
    },
    OpenAi {
        api_key: Secret,
        model: String,
        endpoint: Option<String>,
    },
}

impl LlmConfig {
    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::Gemini { .. } => "gemini",
            Self::OpenAi { .. } => "openai",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::Gemini { model, .. } | Self::OpenAi { model, .. } => model,
        }
    }
}

/// Error types used across the Briefly system.
#[derive(thiserror::Error, Debug)]
pub enum BrieflyError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A provider client could not be constructed or used.
    #[error("Provider error: {0}")]
    Provider(String),
}

/// Convenient alias for results that use [`BrieflyError`].
pub type Result<T> = std::result::Result<T, BrieflyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_redacted_in_debug_and_display() {
        let s = Secret::new("sk-live-123");
        assert_eq!(format!("{s:?}"), "Secret(<redacted>)");
        assert_eq!(s.to_string(), "<redacted>");
        assert_eq!(s.expose(), "sk-live-123");
    }

    #[test]
    fn blank_secret_detection() {
        assert!(Secret::default().is_blank());
        assert!(Secret::new("  \n").is_blank());
        assert!(!Secret::new("k").is_blank());
    }

    #[test]
    fn secret_deserializes_from_plain_string() {
        let s: Secret = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(s.expose(), "abc");
    }

    #[test]
    fn llm_config_reports_provider_and_model() {
        let cfg = LlmConfig::OpenAi {
            api_key: Secret::new("k"),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            endpoint: None,
        };
        assert_eq!(cfg.provider_name(), "openai");
        assert_eq!(cfg.model(), "gpt-4o-mini");
        assert!(!format!("{cfg:?}").contains("\"k\""));
    }
}
