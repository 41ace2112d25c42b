//! Summary generation: length presets, prompt budgeting, and the retrying
//! call into whichever [`LlmClient`] the run was configured with.

use crate::retry::{RetryDecision, RetryPolicy};
use crate::traits::{FailureKind, GenerationParams, LlmClient, LlmError};
use regex::Regex;
use serde::Deserialize;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

/// Target length of the generated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthPreference {
    #[default]
    Short,
    Medium,
    Detailed,
}

impl LengthPreference {
    pub const ALL: [LengthPreference; 3] = [Self::Short, Self::Medium, Self::Detailed];

    pub fn target_words(self) -> u32 {
        match self {
            Self::Short => 250,
            Self::Medium => 500,
            Self::Detailed => 1000,
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Self::Short => "Create a concise summary in about 250 words.",
            Self::Medium => "Create a detailed summary in about 500 words.",
            Self::Detailed => "Create a comprehensive report in about 1000 words.",
        }
    }

    /// Output token ceiling; roughly twice the target word count.
    pub fn max_output_tokens(self) -> u32 {
        match self {
            Self::Short => 512,
            Self::Medium => 1024,
            Self::Detailed => 2048,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Detailed => "detailed",
        }
    }
}

impl fmt::Display for LengthPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LengthPreference {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "detailed" => Ok(Self::Detailed),
            other => Err(format!(
                "unknown length '{other}', expected short, medium or detailed"
            )),
        }
    }
}

/// Build the single-turn prompt sent to the model.
pub fn build_prompt(length: LengthPreference, content: &str) -> String {
    format!(
        "Based on the following content, {}\n\
         Focus on key information and insights. Structure the report with clear headings and sections.\n\n\
         Content: {}",
        length.instruction(),
        content
    )
}

/// Rough token count: runs of word characters plus individual punctuation.
pub fn estimate_token_count(text: &str) -> usize {
    static TOKEN_RE: OnceLock<Option<Regex>> = OnceLock::new();
    match TOKEN_RE.get_or_init(|| Regex::new(r"\w+|[^\w\s]").ok()) {
        Some(re) => re.find_iter(text).count(),
        None => text.split_whitespace().count(),
    }
}

/// Keep the first `max_chars` characters of `content`.
///
/// ```
/// use briefly_llm::summary::truncate_to_budget;
///
/// assert_eq!(truncate_to_budget("abcdef", 4), "abcd");
/// assert_eq!(truncate_to_budget("abc", 4), "abc");
/// ```
pub fn truncate_to_budget(content: &str, max_chars: usize) -> Cow<'_, str> {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => Cow::Borrowed(&content[..byte_idx]),
        None => Cow::Borrowed(content),
    }
}

/// How much source text fits in one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget {
    pub context_window_tokens: u32,
    pub safety_buffer_tokens: u32,
    pub chars_per_token: u32,
    /// Hard cap on input characters regardless of window size.
    pub max_input_chars: Option<usize>,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            context_window_tokens: 32_768,
            safety_buffer_tokens: 512,
            chars_per_token: 4,
            max_input_chars: Some(15_000),
        }
    }
}

impl ContextBudget {
    /// Characters of content allowed for `length`, after reserving room for
    /// the instruction text, the requested output, and the safety buffer.
    pub fn input_char_budget(&self, length: LengthPreference) -> usize {
        let overhead = estimate_token_count(&build_prompt(length, "")) as u64;
        let reserved = overhead
            + u64::from(length.max_output_tokens())
            + u64::from(self.safety_buffer_tokens);
        let available = u64::from(self.context_window_tokens).saturating_sub(reserved);
        let chars = usize::try_from(available * u64::from(self.chars_per_token.max(1)))
            .unwrap_or(usize::MAX);
        match self.max_input_chars {
            Some(cap) => chars.min(cap),
            None => chars,
        }
    }
}

/// A prompt ready to send, with the bookkeeping used in logs.
#[derive(Debug, Clone)]
pub struct PreparedPrompt {
    pub prompt: String,
    pub params: GenerationParams,
    pub budget_chars: usize,
    pub input_chars: usize,
    pub truncated: bool,
}

/// A generated report and how many provider calls it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub text: String,
    pub attempts: u32,
}

/// Terminal summarization failure, already classified and explained.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{} ({detail}) after {attempts} attempt(s)", kind.user_message())]
pub struct SummaryFailure {
    pub kind: FailureKind,
    pub attempts: u32,
    pub detail: String,
}

impl SummaryFailure {
    pub fn user_message(&self) -> &'static str {
        self.kind.user_message()
    }

    pub fn remedy(&self) -> &'static str {
        self.kind.remedy()
    }
}

/// Provider-agnostic summarizer sharing one retry and truncation contract.
pub struct SummaryGenerator {
    client: Arc<dyn LlmClient>,
    policy: RetryPolicy,
    budget: ContextBudget,
    sampling: GenerationParams,
}

impl SummaryGenerator {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            policy: RetryPolicy::default(),
            budget: ContextBudget::default(),
            sampling: GenerationParams::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_budget(mut self, budget: ContextBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_sampling(mut self, sampling: GenerationParams) -> Self {
        self.sampling = sampling;
        self
    }

    /// Truncate `content` to the budget and wrap it in the instruction.
    pub fn prepare(&self, content: &str, length: LengthPreference) -> PreparedPrompt {
        let budget_chars = self.budget.input_char_budget(length);
        let body = truncate_to_budget(content, budget_chars);
        let truncated = body.len() < content.len();
        PreparedPrompt {
            prompt: build_prompt(length, &body),
            params: GenerationParams {
                max_output_tokens: length.max_output_tokens(),
                ..self.sampling
            },
            budget_chars,
            input_chars: body.chars().count(),
            truncated,
        }
    }

    /// Produce a report, or a classified failure once retries are exhausted
    /// or a non-retryable error occurs.
    pub async fn summarize(
        &self,
        content: &str,
        length: LengthPreference,
    ) -> Result<Summary, SummaryFailure> {
        let prepared = self.prepare(content, length);
        let provider = self.client.provider();
        tracing::info!(
            provider,
            model = self.client.model_name(),
            length = %length,
            input_chars = prepared.input_chars,
            budget_chars = prepared.budget_chars,
            truncated = prepared.truncated,
            "llm.summary.start"
        );

        let mut last_attempt = 0;
        let outcome = self
            .policy
            .run(
                |attempt| {
                    last_attempt = attempt;
                    tracing::debug!(provider, attempt, "llm.summary.attempt");
                    self.client.generate(&prepared.prompt, &prepared.params)
                },
                |e: &LlmError| {
                    if e.is_retryable() {
                        RetryDecision::Retry
                    } else {
                        RetryDecision::Stop
                    }
                },
            )
            .await;

        match outcome {
            Ok(resp) => {
                tracing::info!(
                    provider,
                    report_chars = resp.text.len(),
                    attempts = last_attempt,
                    tokens_used = ?resp.tokens_used,
                    "llm.summary.done"
                );
                Ok(Summary {
                    text: resp.text,
                    attempts: last_attempt,
                })
            }
            Err(failure) => {
                let failure = SummaryFailure {
                    kind: failure.error.kind(),
                    attempts: failure.attempts,
                    detail: failure.error.to_string(),
                };
                tracing::error!(
                    provider,
                    kind = ?failure.kind,
                    attempts = failure.attempts,
                    detail = %failure.detail,
                    "{}",
                    failure.user_message()
                );
                Err(failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_preference_asks_for_250_words() {
        let prompt = build_prompt(LengthPreference::Short, "text");
        assert!(prompt.contains("about 250 words"));
        assert!(prompt.ends_with("Content: text"));
    }

    #[test]
    fn every_preference_has_a_distinct_instruction() {
        for p in LengthPreference::ALL {
            assert!(p
                .instruction()
                .contains(&format!("about {} words", p.target_words())));
        }
        assert_eq!(LengthPreference::Medium.target_words(), 500);
        assert_eq!(LengthPreference::Detailed.target_words(), 1000);
    }

    #[test]
    fn parses_preferences_case_insensitively() {
        assert_eq!("Detailed".parse(), Ok(LengthPreference::Detailed));
        assert_eq!(" short ".parse(), Ok(LengthPreference::Short));
        assert!("huge".parse::<LengthPreference>().is_err());
    }

    #[test]
    fn token_estimate_counts_words_and_punctuation() {
        assert_eq!(estimate_token_count("Hello, world!"), 4);
        assert_eq!(estimate_token_count(""), 0);
    }

    #[test]
    fn truncation_keeps_front_and_is_exact() {
        let content = "é".repeat(40);
        let cut = truncate_to_budget(&content, 25);
        assert_eq!(cut.chars().count(), 25);
        assert!(content.starts_with(cut.as_ref()));
    }

    #[test]
    fn truncation_is_idempotent() {
        let content = "abcdefghij".repeat(10);
        let once = truncate_to_budget(&content, 33).into_owned();
        let twice = truncate_to_budget(&once, 33);
        assert_eq!(once, twice);
    }

    #[test]
    fn default_budget_is_capped_at_15000_chars() {
        let budget = ContextBudget::default();
        for p in LengthPreference::ALL {
            assert_eq!(budget.input_char_budget(p), 15_000);
        }
    }

    #[test]
    fn small_window_reserves_instruction_output_and_buffer() {
        let budget = ContextBudget {
            context_window_tokens: 1_000,
            safety_buffer_tokens: 100,
            chars_per_token: 4,
            max_input_chars: None,
        };
        let overhead = estimate_token_count(&build_prompt(LengthPreference::Short, ""));
        let expected = (1_000 - 512 - 100 - overhead) * 4;
        assert_eq!(budget.input_char_budget(LengthPreference::Short), expected);
        // Detailed needs more output room than the window has.
        assert_eq!(budget.input_char_budget(LengthPreference::Detailed), 0);
    }
}
