//! Minimal HTTP client with safe logging and flexible auth.
//!
//! - Request options: headers, `Auth`, query params, timeout, absolute URLs
//! - JSON (`get_json`, `post_json_opts`) and text (`get_text`) helpers
//! - Redacts sensitive query params and never logs secret values
//! - Optional *raw* request/response logging via `BRIEFLY_HTTP_RAW=1`
//!
//! Every call issues exactly one request. Retry decisions belong to the
//! caller, which sees the typed [`HttpError`] (status, timeout, network).
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), briefly_http::HttpError> {
//! let client = briefly_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", briefly_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), final errors, and (optionally)
//! raw request/response lines (target `http.raw`).

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

const RAW_ENV: &str = "BRIEFLY_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret_param(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "access_token"
            | "authorization"
            | "auth"
            | "key"
            | "api_key"
            | "apikey"
            | "token"
            | "secret"
            | "client_secret"
            | "bearer"
    )
}

/// Copy of `url` with secret query values replaced by `<redacted>`.
fn redacted_url(url: &Url) -> Url {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if is_secret_param(&k) {
                "<redacted>".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();
    let mut out = url.clone();
    if pairs.is_empty() {
        return out;
    }
    out.query_pairs_mut().clear().extend_pairs(pairs);
    out
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap, body: Option<&[u8]>) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, val.replace('\'', r"'\''")));
    }
    if let Some(bytes) = body {
        match std::str::from_utf8(bytes) {
            Ok(s) => {
                let s = truncate_chars(s, RAW_MAX_BODY);
                parts.push(format!("-d '{}'", s.replace('\'', r"'\''")));
            }
            Err(_) => parts.push(format!("--data-binary @- # ({} bytes)", bytes.len())),
        }
    }
    parts.push(format!("'{}'", redacted_url(url).as_str()));
    parts.join(" ")
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if key.eq_ignore_ascii_case("authorization")
                || key.eq_ignore_ascii_case("x-goog-api-key")
                || is_secret_param(&key)
            {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// HTTP status for [`HttpError::Api`] failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for failures that happened before a response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Network(_))
    }
}

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use briefly_http::Auth;
///
/// let bearer = Auth::Bearer("token");
/// match bearer {
///     Auth::Bearer(value) => assert_eq!(value, "token"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    /// Auth via query param (e.g., SerpAPI: api_key)
    Query {
        name: &'a str,
        value: Cow<'a, str>,
    },
    None,
}

impl Auth<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Auth::Bearer(_) => "bearer",
            Auth::Query { .. } => "query",
            Auth::None => "none",
        }
    }
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use briefly_http::{Auth, RequestOpts};
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(10)),
///     auth: Some(Auth::Query {
///         name: "api_key",
///         value: Cow::Borrowed("demo"),
///     }),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 10);
/// assert!(!opts.allow_absolute);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
    /// If true and `path` is an absolute URL, use it as-is (ignore base).
    pub allow_absolute: bool,
}

/// Status, headers, and body of a completed exchange.
struct RawResponse {
    req_id: String,
    status: StatusCode,
    headers: HeaderMap,
    body: bytes::Bytes,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use briefly_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(30));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(30),
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    ///
    /// ```no_run
    /// use briefly_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?
    ///     .with_timeout(Duration::from_secs(2));
    /// assert_eq!(client.default_timeout, Duration::from_secs(2));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// GET JSON with per-request options.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let raw = self.send::<()>(Method::GET, path, None, opts).await?;
        decode_json(raw)
    }

    /// POST JSON using optional Bearer auth.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let opts = RequestOpts {
            auth: bearer.map(Auth::Bearer),
            ..Default::default()
        };
        self.post_json_opts(path, body, opts).await
    }

    /// POST JSON with per-request options.
    pub async fn post_json_opts<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let raw = self.send(Method::POST, path, Some(body), opts).await?;
        decode_json(raw)
    }

    /// GET a text body (HTML pages). Non-2xx statuses are errors.
    pub async fn get_text(&self, path: &str, opts: RequestOpts<'_>) -> Result<String, HttpError> {
        let raw = self.send::<()>(Method::GET, path, None, opts).await?;
        // Pages that lie about their charset still carry usable text.
        Ok(String::from_utf8_lossy(&raw.body).into_owned())
    }

    fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        if allow_absolute {
            if let Ok(abs) = Url::parse(path) {
                return Ok(abs);
            }
        }
        self.base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: RequestOpts<'_>,
    ) -> Result<RawResponse, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.resolve(path, opts.allow_absolute)?;
        let timeout = opts.timeout.unwrap_or(self.default_timeout);

        let mut query: Vec<(&str, &str)> = opts
            .query
            .as_ref()
            .map(|q| q.iter().map(|(k, v)| (*k, v.as_ref())).collect())
            .unwrap_or_default();

        let mut rb = self
            .inner
            .request(method.clone(), url.clone())
            .timeout(timeout);

        let body_bytes = match body {
            Some(b) => Some(serde_json::to_vec(b).map_err(|e| HttpError::Build(e.to_string()))?),
            None => None,
        };
        if let Some(bytes) = &body_bytes {
            rb = rb
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(bytes.clone());
        }

        if let Some(hdrs) = &opts.headers {
            rb = rb.headers(hdrs.clone());
        }

        match &opts.auth {
            Some(Auth::Bearer(tok)) => {
                rb = rb.bearer_auth(sanitize_api_key(tok)?);
            }
            Some(Auth::Query { name, value }) => {
                query.push((*name, value.as_ref()));
            }
            Some(Auth::None) | None => {}
        }
        if !query.is_empty() {
            rb = rb.query(&query);
        }

        let req_id = format!("r{}", REQUEST_SEQ.fetch_add(1, Ordering::Relaxed));
        let redacted_q: Vec<(&str, &str)> = query
            .iter()
            .map(|(k, v)| (*k, if is_secret_param(k) { "<redacted>" } else { *v }))
            .collect();

        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            query=?redacted_q,
            timeout_ms=timeout.as_millis() as u64,
            auth_kind=opts.auth.as_ref().map(Auth::kind).unwrap_or("none"),
            has_body=%body_bytes.is_some(),
            "http.request.start"
        );

        if raw_enabled() {
            let shown = opts.headers.clone().unwrap_or_default();
            let curl = make_curl(&method, &url, &shown, body_bytes.as_deref());
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        let t0 = std::time::Instant::now();
        let resp = rb.send().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(req_id=%req_id, message=%message, timeout=err.is_timeout(), "http.network_error.send");
            if err.is_timeout() {
                HttpError::Timeout(message)
            } else {
                HttpError::Network(message)
            }
        })?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(req_id=%req_id, message=%message, "http.network_error.body");
            if err.is_timeout() {
                HttpError::Timeout(message)
            } else {
                HttpError::Network(message)
            }
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let upstream_id = upstream_request_id(&headers);
        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=body.len(),
            x_request_id=%upstream_id,
            "http.response.headers"
        );

        if raw_enabled() {
            let truncated = body.len() > RAW_MAX_BODY;
            let shown = if truncated {
                &body[..RAW_MAX_BODY]
            } else {
                &body[..]
            };
            tracing::info!(
                target: "http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?redact_headers(&headers),
                body=%String::from_utf8_lossy(shown),
                truncated
            );
        }

        if !status.is_success() {
            let message = extract_error_message(&body);
            tracing::warn!(
                req_id=%req_id,
                %status,
                message=%message,
                x_request_id=%upstream_id,
                "http.error"
            );
            return Err(HttpError::Api {
                status,
                message,
                request_id: upstream_id,
            });
        }

        Ok(RawResponse {
            req_id,
            status,
            headers,
            body,
        })
    }
}

fn decode_json<T: DeserializeOwned>(raw: RawResponse) -> Result<T, HttpError> {
    let content_type = raw
        .headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    serde_json::from_slice::<T>(&raw.body).map_err(|e| {
        let snippet = snip_body(&raw.body);
        tracing::warn!(
            req_id=%raw.req_id,
            status=%raw.status,
            content_type,
            serde_line=%e.line(),
            serde_col=%e.column(),
            serde_err=%e,
            body_snippet=%snippet,
            "http.response.decode_error"
        );
        HttpError::Decode(e.to_string(), snippet)
    })
}

fn upstream_request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .or_else(|| headers.get("x-correlation-id"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

/// Best-effort human message from provider error bodies.
///
/// Understands `{"error":{"message":..,"status":..}}` (OpenAI, Gemini),
/// `{"error":".."}` (SerpAPI) and `{"message":..}`/`{"detail":..}`.
fn extract_error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct Nested {
        error: NestedDetail,
    }
    #[derive(Deserialize)]
    struct NestedDetail {
        #[serde(default)]
        message: String,
        #[serde(default)]
        status: String,
    }

    #[derive(Deserialize)]
    struct Flat {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<Nested>(body) {
        return match (env.error.status.is_empty(), env.error.message.is_empty()) {
            (true, _) => env.error.message,
            (false, true) => env.error.status,
            (false, false) => format!("{}: {}", env.error.status, env.error.message),
        };
    }
    if let Ok(m) = serde_json::from_slice::<Flat>(body) {
        for candidate in [m.message, m.detail, m.error] {
            if !candidate.is_empty() {
                return candidate;
            }
        }
    }
    snip_body(body)
}

fn truncate_chars(s: &str, max: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max) {
        Some((idx, _)) => Cow::Owned(format!("{}...", &s[..idx])),
        None => Cow::Borrowed(s),
    }
}

fn snip_body(body: &[u8]) -> String {
    truncate_chars(&String::from_utf8_lossy(body), SNIPPET_MAX).into_owned()
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains control characters".into(),
        ));
    }

    HeaderValue::from_str(&format!("Bearer {}", s))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_error_message_includes_status() {
        let body = br#"{"error":{"code":429,"message":"Quota exceeded for metric","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            extract_error_message(body),
            "RESOURCE_EXHAUSTED: Quota exceeded for metric"
        );
    }

    #[test]
    fn openai_error_message_without_status() {
        let body = br#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(extract_error_message(body), "Incorrect API key provided");
    }

    #[test]
    fn flat_error_string() {
        let body = br#"{"error":"Invalid API key."}"#;
        assert_eq!(extract_error_message(body), "Invalid API key.");
    }

    #[test]
    fn non_json_body_falls_back_to_snippet() {
        let body = "x".repeat(800);
        let msg = extract_error_message(body.as_bytes());
        assert_eq!(msg.len(), SNIPPET_MAX + 3);
        assert!(msg.ends_with("..."));
    }

    #[test]
    fn redacts_secret_query_params() {
        let url = Url::parse("https://serpapi.com/search?q=rust&api_key=abc123&num=5").unwrap();
        let shown = redacted_url(&url);
        assert!(!shown.as_str().contains("abc123"));
        assert!(shown.as_str().contains("q=rust"));
        assert!(shown.as_str().contains("num=5"));
    }

    #[test]
    fn curl_never_contains_bearer_or_query_secret() {
        let url = Url::parse("https://api.example.com/v1?key=s3cret").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer sk-123"));
        headers.insert("user-agent", HeaderValue::from_static("briefly"));
        let curl = make_curl(&Method::POST, &url, &headers, Some(b"{\"a\":1}"));
        assert!(!curl.contains("sk-123"));
        assert!(!curl.contains("s3cret"));
        assert!(curl.contains("user-agent: briefly"));
    }

    #[test]
    fn sanitize_strips_quotes_and_whitespace() {
        assert_eq!(sanitize_api_key(" \"sk-1 23\"\n").unwrap(), "sk-123");
        assert!(sanitize_api_key("clé").is_err());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé...");
        assert_eq!(truncate_chars("hi", 5), "hi");
    }
}
