use crate::traits::{GenerationParams, LlmClient, LlmError, LlmResponse};
use async_trait::async_trait;
use briefly_common::{BrieflyError, Result, Secret};
use briefly_http::{Auth, HttpClient, RequestOpts};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
    safety_settings: Vec<GeminiSafetySetting>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    candidate_count: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct GeminiSafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    usage_metadata: Option<GeminiUsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    total_token_count: Option<u32>,
}

/// Google Gemini API client.
///
/// Requires a valid API key and internet access.
pub struct GeminiClient {
    http: HttpClient,
    api_key: Secret,
    model: String,
}

impl GeminiClient {
    /// Create a new client using the provided API key and model.
    pub fn new(api_key: Secret, model: String) -> Result<Self> {
        Self::with_endpoint(api_key, model, GEMINI_BASE_URL)
    }

    /// Same as [`GeminiClient::new`] but against a custom base URL.
    pub fn with_endpoint(api_key: Secret, model: String, endpoint: &str) -> Result<Self> {
        let base = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };
        let http = HttpClient::new(&base)
            .map_err(|e| BrieflyError::Provider(format!("Failed to create HTTP client: {e}")))?
            .with_timeout(Duration::from_secs(60));

        Ok(Self {
            http,
            api_key,
            model,
        })
    }

    fn safety_settings() -> Vec<GeminiSafetySetting> {
        [
            "HARM_CATEGORY_HARASSMENT",
            "HARM_CATEGORY_HATE_SPEECH",
            "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            "HARM_CATEGORY_DANGEROUS_CONTENT",
        ]
        .into_iter()
        .map(|category| GeminiSafetySetting {
            category,
            threshold: "BLOCK_MEDIUM_AND_ABOVE",
        })
        .collect()
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> std::result::Result<LlmResponse, LlmError> {
        let path = format!("models/{}:generateContent", self.model);

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: params.temperature,
                top_p: params.top_p,
                top_k: params.top_k,
                candidate_count: params.candidate_count,
                max_output_tokens: params.max_output_tokens,
            },
            safety_settings: Self::safety_settings(),
        };

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "llm.gemini.request");

        let resp: GeminiResponse = self
            .http
            .post_json_opts(
                &path,
                &request,
                RequestOpts {
                    auth: Some(Auth::Query {
                        name: "key",
                        value: Cow::Borrowed(self.api_key.expose()),
                    }),
                    ..Default::default()
                },
            )
            .await?;

        if let Some(reason) = resp
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(LlmError::Safety(format!("prompt blocked: {reason}")));
        }

        let candidate = resp
            .candidates
            .first()
            .ok_or_else(|| LlmError::Unexpected("No candidates returned from Gemini".into()))?;

        if matches!(
            candidate.finish_reason.as_deref(),
            Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST")
        ) {
            return Err(LlmError::Safety(
                "response blocked by Gemini safety filters".into(),
            ));
        }

        let text: String = candidate
            .content
            .as_ref()
            .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::Unexpected(
                "No content parts in Gemini response".into(),
            ));
        }

        Ok(LlmResponse {
            text,
            model: resp.model_version.or_else(|| Some(self.model.clone())),
            tokens_used: resp.usage_metadata.and_then(|u| u.total_token_count),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider(&self) -> &'static str {
        "gemini"
    }
}
