//! Provider-agnostic summarization for Briefly.
//!
//! This crate exposes a common [`traits::LlmClient`] interface with Gemini
//! and OpenAI implementations, the [`summary::SummaryGenerator`] that wraps
//! either one in a shared retry and truncation contract, and a helper to
//! build a client from a [`briefly_common::LlmConfig`].
//!
//! # Examples
//! ```no_run
//! use briefly_common::{LlmConfig, Result, Secret, DEFAULT_GEMINI_MODEL};
//! use briefly_llm::build_llm_client;
//!
//! # fn main() -> Result<()> {
//! let cfg = LlmConfig::Gemini {
//!     api_key: Secret::new("key"),
//!     model: DEFAULT_GEMINI_MODEL.to_string(),
//!     endpoint: None,
//! };
//! let client = build_llm_client(&cfg)?;
//! assert_eq!(client.provider(), "gemini");
//! # Ok(())
//! # }
//! ```
pub mod gemini;
pub mod openai;
pub mod retry;
pub mod summary;
pub mod traits;

use briefly_common::{BrieflyError, LlmConfig};
use gemini::GeminiClient;
use openai::OpenAiClient;
use std::sync::Arc;
use traits::LlmClient;

pub use summary::{LengthPreference, Summary, SummaryFailure, SummaryGenerator};
pub use traits::FailureKind;

/// Construct the configured provider client.
pub fn build_llm_client(config: &LlmConfig) -> briefly_common::Result<Arc<dyn LlmClient>> {
    let (LlmConfig::Gemini { api_key, .. } | LlmConfig::OpenAi { api_key, .. }) = config;
    if api_key.is_blank() {
        return Err(BrieflyError::Config(format!(
            "{} API key is missing",
            config.provider_name()
        )));
    }

    let client: Arc<dyn LlmClient> = match config {
        LlmConfig::Gemini {
            api_key,
            model,
            endpoint,
        } => {
            let client = match endpoint {
                Some(url) => GeminiClient::with_endpoint(api_key.clone(), model.clone(), url)?,
                None => GeminiClient::new(api_key.clone(), model.clone())?,
            };
            Arc::new(client)
        }
        LlmConfig::OpenAi {
            api_key,
            model,
            endpoint,
        } => {
            let client = match endpoint {
                Some(url) => OpenAiClient::with_endpoint(api_key.clone(), model.clone(), url)?,
                None => OpenAiClient::new(api_key.clone(), model.clone())?,
            };
            Arc::new(client)
        }
    };

    tracing::debug!(
        provider = client.provider(),
        model = client.model_name(),
        "llm.client.ready"
    );
    Ok(client)
}
