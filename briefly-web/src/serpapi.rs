use crate::types::SearchResult;
use briefly_common::{BrieflyError, Secret};
use briefly_http::{Auth, HttpClient, HttpError, RequestOpts};
use serde::Deserialize;
use std::borrow::Cow;
use std::time::Instant;

pub const SERPAPI_BASE_URL: &str = "https://serpapi.com/";

/// Why a search produced no results.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The provider answered but reported an error in the body.
    #[error("search provider error: {0}")]
    Provider(String),

    #[error("search request failed with HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("search request failed: {0}")]
    Network(String),

    #[error("unreadable search response: {0}")]
    Decode(String),
}

impl From<HttpError> for SearchError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Api {
                status, message, ..
            } => Self::Status {
                status: status.as_u16(),
                message,
            },
            HttpError::Decode(m, _) => Self::Decode(m),
            HttpError::Timeout(m)
            | HttpError::Network(m)
            | HttpError::Url(m)
            | HttpError::Build(m) => Self::Network(m),
        }
    }
}

/// Results of one query. `error` is set whenever the provider could not be
/// asked or refused; `results` is then empty.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    pub error: Option<SearchError>,
}

impl SearchOutcome {
    fn failed(error: SearchError) -> Self {
        Self {
            results: Vec::new(),
            error: Some(error),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    error: Option<serde_json::Value>,
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

impl From<OrganicResult> for SearchResult {
    fn from(r: OrganicResult) -> Self {
        Self {
            title: r.title.unwrap_or_default(),
            link: r.link.unwrap_or_default(),
            snippet: r.snippet.unwrap_or_default(),
        }
    }
}

/// Minimal client for the SerpAPI search endpoint.
#[derive(Clone)]
pub struct SearchClient {
    http: HttpClient,
    engine: String,
    num_results: u32,
}

impl SearchClient {
    pub fn new() -> briefly_common::Result<Self> {
        Self::with_endpoint(SERPAPI_BASE_URL)
    }

    /// Same as [`SearchClient::new`] but against a custom base URL; a
    /// trailing `/` is added so `search` resolves below it.
    pub fn with_endpoint(endpoint: &str) -> briefly_common::Result<Self> {
        let base = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };
        let http = HttpClient::new(&base)
            .map_err(|e| BrieflyError::Provider(format!("search client init failed: {e}")))?;
        Ok(Self {
            http,
            engine: "google".to_string(),
            num_results: 5,
        })
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    pub fn with_num_results(mut self, num: u32) -> Self {
        self.num_results = num;
        self
    }

    /// Issue exactly one search request. Failures are reported in the
    /// outcome rather than returned as `Err`.
    pub async fn search(&self, query: &str, api_key: &Secret) -> SearchOutcome {
        let query_snippet: String = query.chars().take(160).collect();
        let started = Instant::now();
        tracing::info!(
            target: "web.serpapi",
            query = %query_snippet,
            engine = %self.engine,
            num = self.num_results,
            "search.serpapi.start"
        );

        let params: Vec<(&str, Cow<'_, str>)> = vec![
            ("q", Cow::Borrowed(query)),
            ("engine", Cow::Borrowed(self.engine.as_str())),
            ("num", Cow::Owned(self.num_results.to_string())),
        ];
        let resp: SerpApiResponse = match self
            .http
            .get_json(
                "search",
                RequestOpts {
                    auth: Some(Auth::Query {
                        name: "api_key",
                        value: Cow::Borrowed(api_key.expose()),
                    }),
                    query: Some(params),
                    ..Default::default()
                },
            )
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                let error = SearchError::from(e);
                tracing::warn!(
                    target: "web.serpapi",
                    query = %query_snippet,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %error,
                    "search.serpapi.error"
                );
                return SearchOutcome::failed(error);
            }
        };

        if let Some(err) = resp.error {
            let message = match err {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            tracing::warn!(
                target: "web.serpapi",
                query = %query_snippet,
                message = %message,
                "search.serpapi.provider_error"
            );
            return SearchOutcome::failed(SearchError::Provider(message));
        }

        let results: Vec<SearchResult> = resp
            .organic_results
            .into_iter()
            .map(SearchResult::from)
            .collect();
        tracing::info!(
            target: "web.serpapi",
            query = %query_snippet,
            hit_count = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search.serpapi.success"
        );
        SearchOutcome {
            results,
            error: None,
        }
    }
}
