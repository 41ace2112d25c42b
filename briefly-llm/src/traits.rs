use async_trait::async_trait;
use briefly_http::HttpError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

/// Sampling knobs sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
    /// Ignored by providers without top-k sampling (OpenAI).
    pub top_k: u32,
    pub candidate_count: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            candidate_count: 1,
            max_output_tokens: 1024,
        }
    }
}

/// Failure classes a provider call can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Safety,
    Auth,
    Quota,
    RateLimited,
    Transient,
    InvalidRequest,
    Unexpected,
}

impl FailureKind {
    /// Only throttling and transient outages can succeed on a later attempt.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::Transient)
    }

    /// One-line message shown to the person who submitted the query.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::Safety => "Content blocked by safety filters.",
            Self::Auth => "The language model rejected the API key.",
            Self::Quota => "API quota exceeded.",
            Self::RateLimited | Self::Transient => "The language model is unavailable.",
            Self::InvalidRequest => "The language model rejected the request.",
            Self::Unexpected => "An unexpected error occurred.",
        }
    }

    pub fn remedy(self) -> &'static str {
        match self {
            Self::Safety => "Try a different query.",
            Self::Auth => "Check your API key configuration.",
            Self::Quota => "Please check your billing details or try again later.",
            Self::RateLimited | Self::Transient => "Please try again later.",
            Self::InvalidRequest => "Try a shorter or different query.",
            Self::Unexpected => "Please try again or contact support if the problem persists.",
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("content blocked by safety filters: {0}")]
    Safety(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("quota exceeded: {0}")]
    Quota(String),

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("transient provider error: {0}")]
    Transient(String),

    #[error("malformed request: {0}")]
    InvalidRequest(String),

    #[error("unexpected provider response: {0}")]
    Unexpected(String),
}

impl LlmError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Safety(_) => FailureKind::Safety,
            Self::Auth(_) => FailureKind::Auth,
            Self::Quota(_) => FailureKind::Quota,
            Self::RateLimited(_) => FailureKind::RateLimited,
            Self::Transient(_) => FailureKind::Transient,
            Self::InvalidRequest(_) => FailureKind::InvalidRequest,
            Self::Unexpected(_) => FailureKind::Unexpected,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Map an HTTP status and provider message onto the failure taxonomy.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        let lower = message.to_ascii_lowercase();
        let mentions_key = lower.contains("api key") || lower.contains("api_key");
        let mentions_quota = lower.contains("quota") || lower.contains("billing");

        match status.as_u16() {
            400 if mentions_key => Self::Auth(message),
            400 if lower.contains("safety") || lower.contains("blocked") => Self::Safety(message),
            400 | 404 | 413 | 422 => Self::InvalidRequest(message),
            401 | 403 => Self::Auth(message),
            429 if mentions_quota => Self::Quota(message),
            429 => Self::RateLimited(message),
            408 | 500..=599 => Self::Transient(message),
            _ => Self::Unexpected(format!("HTTP {status}: {message}")),
        }
    }
}

impl From<HttpError> for LlmError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Timeout(m) | HttpError::Network(m) => Self::Transient(m),
            HttpError::Api {
                status, message, ..
            } => Self::from_status(status, message),
            HttpError::Url(m) | HttpError::Build(m) => Self::InvalidRequest(m),
            HttpError::Decode(m, snippet) => Self::Unexpected(format!("{m} ({snippet})")),
        }
    }
}

/// A generative-text provider that answers one single-turn prompt.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send `prompt` as a fresh single-turn exchange.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<LlmResponse, LlmError>;

    /// Get the model name being used
    fn model_name(&self) -> &str;

    /// Short provider identifier used in logs.
    fn provider(&self) -> &'static str;
}
