use crate::traits::{GenerationParams, LlmClient, LlmError, LlmResponse};
use async_trait::async_trait;
use briefly_common::{BrieflyError, Result, Secret};
use briefly_http::HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1/";

pub struct OpenAiClient {
    client: HttpClient,
    api_key: Secret,
    model: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    top_p: f32,
    n: u32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: Option<u32>,
}

impl OpenAiClient {
    /// Create a new client for the given API key and model.
    pub fn new(api_key: Secret, model: String) -> Result<Self> {
        Self::with_endpoint(api_key, model, OPENAI_API_BASE)
    }

    /// Point the client at an OpenAI-compatible endpoint (Azure, gateways, tests).
    pub fn with_endpoint(api_key: Secret, model: String, endpoint: &str) -> Result<Self> {
        let base = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };
        let client = HttpClient::new(&base)
            .map_err(|e| BrieflyError::Provider(format!("HttpClient init failed: {e}")))?
            .with_timeout(Duration::from_secs(60));

        Ok(Self {
            client,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> std::result::Result<LlmResponse, LlmError> {
        let req = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            top_p: params.top_p,
            n: params.candidate_count,
            max_tokens: params.max_output_tokens,
        };

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "llm.openai.request");

        let resp: ChatCompletionResponse = self
            .client
            .post_json("chat/completions", Some(self.api_key.expose()), &req)
            .await?;

        let choice = resp
            .choices
            .first()
            .ok_or_else(|| LlmError::Unexpected("No choices returned from OpenAI".into()))?;

        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(LlmError::Safety("response withheld by content filter".into()));
        }
        let message = choice
            .message
            .as_ref()
            .ok_or_else(|| LlmError::Unexpected("choice without message".into()))?;
        if let Some(refusal) = message.refusal.as_deref().filter(|r| !r.is_empty()) {
            return Err(LlmError::Safety(refusal.to_string()));
        }

        let text = message.content.clone().unwrap_or_default();
        if text.trim().is_empty() {
            return Err(LlmError::Unexpected("empty completion".into()));
        }

        Ok(LlmResponse {
            text,
            model: resp.model.or_else(|| Some(self.model.clone())),
            tokens_used: resp.usage.and_then(|u| u.total_tokens),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider(&self) -> &'static str {
        "openai"
    }
}
