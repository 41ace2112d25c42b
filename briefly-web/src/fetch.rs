use crate::extract::{MIN_FRAGMENT_CHARS, extract_document};
use crate::types::{AggregatedContent, ExtractedDocument, SearchResult};
use briefly_common::BrieflyError;
use briefly_http::{HttpClient, HttpError, RequestOpts};
use futures::stream::{self, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::{Duration, Instant};
use url::Url;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Why a single page contributed nothing. Never escapes [`ContentFetcher::extract`].
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("invalid url '{0}'")]
    InvalidUrl(String),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("no usable text")]
    NoContent,
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub user_agent: String,
    /// Pages fetched at once.
    pub concurrency: usize,
    pub min_fragment_chars: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrency: 4,
            min_fragment_chars: MIN_FRAGMENT_CHARS,
        }
    }
}

/// Downloads search result pages and turns them into summarizer input.
#[derive(Clone)]
pub struct ContentFetcher {
    http: HttpClient,
    headers: HeaderMap,
    settings: FetchSettings,
}

impl ContentFetcher {
    pub fn new(settings: FetchSettings) -> briefly_common::Result<Self> {
        // Every page is requested by absolute URL; nothing joins against this base.
        let http = HttpClient::new("about:blank")
            .map_err(|e| BrieflyError::Provider(format!("fetch client init failed: {e}")))?
            .with_timeout(settings.timeout);
        let ua = HeaderValue::from_str(&settings.user_agent)
            .map_err(|e| BrieflyError::Config(format!("invalid user agent: {e}")))?;
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, ua);
        Ok(Self {
            http,
            headers,
            settings,
        })
    }

    /// Fetch every result and aggregate what could be extracted, in input
    /// order. Individual failures are logged and skipped.
    pub async fn extract(&self, results: &[SearchResult]) -> AggregatedContent {
        let started = Instant::now();
        let docs: Vec<ExtractedDocument> = stream::iter(results)
            .map(|result| async move {
                match self.fetch_one(result).await {
                    Ok(doc) => Some(doc),
                    Err(e) => {
                        tracing::warn!(
                            target: "web.fetch",
                            link = %result.link,
                            error = %e,
                            "fetch.page.skipped"
                        );
                        None
                    }
                }
            })
            .buffered(self.settings.concurrency.max(1))
            .filter_map(|doc| async move { doc })
            .collect()
            .await;

        let content = AggregatedContent::from_documents(&docs, results.len());
        tracing::info!(
            target: "web.fetch",
            sources_attempted = content.sources_attempted,
            sources_used = content.sources_used,
            content_chars = content.text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fetch.batch.done"
        );
        content
    }

    async fn fetch_one(&self, result: &SearchResult) -> Result<ExtractedDocument, FetchError> {
        let url = Url::parse(&result.link)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or_else(|| FetchError::InvalidUrl(result.link.clone()))?;

        let html = self
            .http
            .get_text(
                url.as_str(),
                RequestOpts {
                    headers: Some(self.headers.clone()),
                    allow_absolute: true,
                    ..Default::default()
                },
            )
            .await?;

        let doc = extract_document(&result.title, &html, self.settings.min_fragment_chars)
            .ok_or(FetchError::NoContent)?;
        tracing::debug!(
            target: "web.fetch",
            link = %result.link,
            html_bytes = html.len(),
            body_chars = doc.body_text.len(),
            "fetch.page.extracted"
        );
        Ok(doc)
    }
}
