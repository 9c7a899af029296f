//! Minimal HTTP client with safe logging and bounded retries.
//!
//! - Request options: headers, query params, timeout, attempt budget
//! - Every request carries the client identity (`User-Agent`) and `Accept` pair
//! - Retries 429/503 honoring `Retry-After`, else linear backoff; network
//!   failures get a shorter fixed backoff (see [`retry::RetryPolicy`])
//! - Optional *raw* request/response logging via `WANDER_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), wander_http::FetchError> {
//! let client = wander_http::HttpClient::new("https://en.wikipedia.org/api/rest_v1")?;
//! let got: serde_json::Value = client
//!     .get_json("page/random/summary", wander_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), retries, final errors, and
//! (optionally) raw request/response lines (target `http.raw`).

pub mod retry;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, Method, StatusCode, Url};
use retry::{RetryCause, RetryPolicy, Sleeper, TokioSleeper};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use wander_common::{DEFAULT_ACCEPT, DEFAULT_USER_AGENT};

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "WANDER_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Render a best-effort curl command for repro/debug.
fn make_curl(url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string(), "-XGET".to_string()];
    for (name, val) in headers.iter() {
        let v = val.to_str().unwrap_or("");
        parts.push(format!(
            "-H '{}: {}'",
            name.as_str(),
            v.replace('\'', r"'\''")
        ));
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

// ==============================
// Path helpers
// ==============================

/// Everything except RFC 3986 unreserved characters is escaped, including
/// `/` so a title like `AC/DC` stays a single segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode one path segment.
///
/// ```
/// assert_eq!(wander_http::encode_segment("AC/DC"), "AC%2FDC");
/// assert_eq!(wander_http::encode_segment("Alan Turing"), "Alan%20Turing");
/// ```
pub fn encode_segment(raw: &str) -> String {
    utf8_percent_encode(raw, SEGMENT).to_string()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: usize },
    #[error("service unavailable after {attempts} attempts")]
    Unavailable { attempts: usize },
    #[error("not found: {path}")]
    NotFound { path: String },
    #[error("server returned error {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
}

impl FetchError {
    /// Short, stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Url(_) => "url",
            FetchError::Build(_) => "build",
            FetchError::Network(_) => "network",
            FetchError::RateLimited { .. } => "rate_limited",
            FetchError::Unavailable { .. } => "unavailable",
            FetchError::NotFound { .. } => "not_found",
            FetchError::Status { .. } => "status",
            FetchError::Decode(..) => "decode",
        }
    }
}

// ==============================
// Request Options
// ==============================

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use wander_http::RequestOpts;
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     attempts: Some(1),
///     query: Some(vec![("action", Cow::Borrowed("opensearch"))]),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(!opts.allow_absolute);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    /// Overrides the policy's attempt budget for this request.
    pub attempts: Option<usize>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>, // e.g. [("search", "term".into())]
    /// If true and `path` is an absolute URL, use it as-is (ignore base).
    pub allow_absolute: bool,
}

// ==============================
// Client
// ==============================

/// Everything needed to build a configured [`HttpClient`] in one go.
#[derive(Clone, Debug)]
pub struct ClientSettings {
    pub user_agent: String,
    pub accept: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            timeout: Duration::from_secs(12),
            retry: RetryPolicy::default(),
        }
    }
}

static REQ_SEQ: AtomicU64 = AtomicU64::new(1);

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    identity: HeaderMap,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    pub default_timeout: Duration,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base", &self.base.as_str())
            .field("retry", &self.retry)
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// The base is treated as a directory: `https://host/api/rest_v1` and
    /// `https://host/api/rest_v1/` resolve relative paths identically.
    ///
    /// ```no_run
    /// use wander_http::{HttpClient, FetchError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://en.wikipedia.org/api/rest_v1")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(12));
    /// assert_eq!(client.retry_policy().max_attempts, 3);
    /// # Ok::<(), FetchError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, FetchError> {
        let mut base = Url::parse(base).map_err(|e| FetchError::Url(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| FetchError::Build(e.to_string()))?;
        let mut client = Self {
            base,
            inner,
            identity: HeaderMap::new(),
            retry: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            default_timeout: Duration::from_secs(12),
        };
        client.set_identity(DEFAULT_USER_AGENT, DEFAULT_ACCEPT)?;
        Ok(client)
    }

    /// Build a client from [`ClientSettings`].
    pub fn from_settings(base: &str, settings: &ClientSettings) -> Result<Self, FetchError> {
        Ok(Self::new(base)?
            .with_identity(&settings.user_agent, &settings.accept)?
            .with_timeout(settings.timeout)
            .with_retry(settings.retry.clone()))
    }

    /// Replace the identifying `User-Agent`/`Accept` pair.
    pub fn with_identity(mut self, user_agent: &str, accept: &str) -> Result<Self, FetchError> {
        self.set_identity(user_agent, accept)?;
        Ok(self)
    }

    fn set_identity(&mut self, user_agent: &str, accept: &str) -> Result<(), FetchError> {
        let ua = HeaderValue::from_str(user_agent)
            .map_err(|e| FetchError::Build(format!("invalid user agent: {e}")))?;
        let acc = HeaderValue::from_str(accept)
            .map_err(|e| FetchError::Build(format!("invalid accept header: {e}")))?;
        self.identity.insert(USER_AGENT, ua);
        self.identity.insert(ACCEPT, acc);
        Ok(())
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Swap the sleep implementation used between attempts.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// GET and decode a JSON body.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let bytes = self.fetch(path, opts).await?;
        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            let snippet = snip_body(&bytes);
            tracing::warn!(
                path,
                serde_line=%e.line(),
                serde_col=%e.column(),
                serde_err=%e,
                body_snippet=%snippet,
                "http.response.decode_error"
            );
            FetchError::Decode(e.to_string(), snippet)
        })
    }

    /// GET a body as text (lossy UTF-8).
    pub async fn get_text(&self, path: &str, opts: RequestOpts<'_>) -> Result<String, FetchError> {
        let bytes = self.fetch(path, opts).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, FetchError> {
        if allow_absolute {
            if let Ok(abs) = Url::parse(path) {
                return Ok(abs);
            }
        }
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| FetchError::Url(e.to_string()))
    }

    // ==============================
    // Core request implementation
    // ==============================

    /// GET `path` and return the raw body of a 2xx response.
    ///
    /// 429/503 and network failures are retried per the [`RetryPolicy`];
    /// once the budget is spent the last error is returned.
    pub async fn fetch(&self, path: &str, opts: RequestOpts<'_>) -> Result<Vec<u8>, FetchError> {
        let url = self.resolve(path, opts.allow_absolute)?;
        let policy = RetryPolicy {
            max_attempts: opts.attempts.unwrap_or(self.retry.max_attempts).max(1),
            ..self.retry.clone()
        };
        let max_attempts = policy.max_attempts;
        let timeout = opts.timeout.unwrap_or(self.default_timeout);

        let mut headers = self.identity.clone();
        if let Some(extra) = &opts.headers {
            for (k, v) in extra.iter() {
                headers.insert(k, v.clone());
            }
        }
        let pairs: Vec<(&str, &str)> = opts
            .query
            .as_ref()
            .map(|q| q.iter().map(|(k, v)| (*k, v.as_ref())).collect())
            .unwrap_or_default();

        let req_id = format!("r{:x}", REQ_SEQ.fetch_add(1, Ordering::Relaxed));
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            let retry_allowed = policy.should_retry(attempt);

            let rb = self
                .inner
                .request(Method::GET, url.clone())
                .timeout(timeout)
                .headers(headers.clone())
                .query(&pairs);

            tracing::debug!(
                req_id=%req_id,
                attempt,
                max_attempts,
                host_path=%format!("{}{}", url.domain().unwrap_or("-"), url.path()),
                query=?pairs,
                timeout_ms=timeout.as_millis() as u64,
                "http.request.start"
            );

            if raw_enabled() {
                let curl = match rb.try_clone().and_then(|b| b.build().ok()) {
                    Some(req) => make_curl(req.url(), &headers),
                    None => make_curl(&url, &headers),
                };
                tracing::debug!(target: "http.raw", %req_id, %curl, "request");
            }

            // ----- Send -----
            let t0 = std::time::Instant::now();
            let resp = match rb.send().await {
                Ok(resp) => resp,
                Err(err) => {
                    let message = err.to_string();
                    if retry_allowed {
                        self.backoff(&policy, &req_id, RetryCause::Network, attempt, &message, "network_send")
                            .await;
                        continue;
                    }
                    tracing::warn!(req_id=%req_id, attempt, max_attempts, message=%message, "http.network_error.send");
                    return Err(FetchError::Network(message));
                }
            };
            let status = resp.status();
            let resp_headers = resp.headers().clone();
            let bytes = match resp.bytes().await {
                Ok(bytes) => bytes,
                Err(err) => {
                    let message = err.to_string();
                    if retry_allowed {
                        self.backoff(&policy, &req_id, RetryCause::Network, attempt, &message, "network_body")
                            .await;
                        continue;
                    }
                    tracing::warn!(req_id=%req_id, attempt, max_attempts, message=%message, "http.network_error.body");
                    return Err(FetchError::Network(message));
                }
            };
            let dur_ms = t0.elapsed().as_millis() as u64;

            let request_id = resp_headers
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::debug!(
                req_id=%req_id,
                %status,
                duration_ms=dur_ms,
                body_len=bytes.len(),
                x_request_id=%request_id,
                "http.response.headers"
            );

            if raw_enabled() {
                let truncated = bytes.len() > RAW_MAX_BODY;
                let text = String::from_utf8_lossy(&bytes[..bytes.len().min(RAW_MAX_BODY)]);
                tracing::info!(
                    target: "http.raw",
                    %req_id,
                    status=%status,
                    duration_ms=dur_ms,
                    body=%text,
                    truncated
                );
            }

            // ----- Success path -----
            if status.is_success() {
                tracing::trace!(req_id=%req_id, body_snippet=%snip_body(&bytes), "http.response.body_snippet");
                return Ok(bytes.to_vec());
            }

            // ----- Non-success: maybe retry -----
            let message = extract_error_message(&bytes);
            let retryable_status =
                status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE;

            if retryable_status && retry_allowed {
                let cause = RetryCause::Status {
                    retry_after: retry_after_delay_secs(&resp_headers),
                };
                self.backoff(&policy, &req_id, cause, attempt, &message, "status")
                    .await;
                continue;
            }

            tracing::warn!(
                req_id=%req_id,
                %status,
                attempt,
                message=%message,
                x_request_id=%request_id,
                "http.error"
            );
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited { attempts: attempt },
                StatusCode::SERVICE_UNAVAILABLE => FetchError::Unavailable { attempts: attempt },
                StatusCode::NOT_FOUND => FetchError::NotFound {
                    path: url.path().to_string(),
                },
                _ => FetchError::Status { status, message },
            });
        }
    }

    async fn backoff(
        &self,
        policy: &RetryPolicy,
        req_id: &str,
        cause: RetryCause,
        attempt: usize,
        message: &str,
        event: &'static str,
    ) {
        let delay = policy.delay_for(cause, attempt);
        tracing::warn!(
            req_id=%req_id,
            attempt,
            max_attempts = policy.max_attempts,
            cause=?cause,
            backoff_ms=delay.as_millis() as u64,
            message=%message,
            stage = event,
            "http.retrying"
        );
        self.sleeper.sleep(delay).await;
    }
}

// ==============================
// Helpers
// ==============================

/// Pull a readable message out of the REST (`detail`/`title`) or Action API
/// (`error.info`) error envelopes.
fn extract_error_message(body: &[u8]) -> String {
    // Action API: {"error":{"code":"...","info":"..."}}
    #[derive(Deserialize)]
    struct ActionEnv {
        error: ActionDetail,
    }
    #[derive(Deserialize)]
    struct ActionDetail {
        #[serde(default)]
        info: String,
        #[serde(default)]
        code: String,
    }

    // REST: {"type":"...","title":"Not found.","detail":"..."}
    #[derive(Deserialize)]
    struct Problem {
        #[serde(default)]
        detail: String,
        #[serde(default)]
        title: String,
    }

    if let Ok(env) = serde_json::from_slice::<ActionEnv>(body) {
        if !env.error.info.is_empty() {
            return env.error.info;
        }
        if !env.error.code.is_empty() {
            return env.error.code;
        }
    }
    if let Ok(p) = serde_json::from_slice::<Problem>(body) {
        if !p.detail.is_empty() {
            return p.detail;
        }
        if !p.title.is_empty() {
            return p.title;
        }
    }
    snip_body(body)
}

fn retry_after_delay_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .trim()
        .parse()
        .ok()
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > 500 {
        let mut cut = 500;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_gets_trailing_slash() {
        let c = HttpClient::new("https://en.wikipedia.org/api/rest_v1").unwrap();
        let url = c.resolve("page/random/summary", false).unwrap();
        assert_eq!(
            url.as_str(),
            "https://en.wikipedia.org/api/rest_v1/page/random/summary"
        );
    }

    #[test]
    fn leading_slash_stays_under_base() {
        let c = HttpClient::new("https://en.wikipedia.org/api/rest_v1/").unwrap();
        let abs = c.resolve("https://example.org/x", true).unwrap();
        assert_eq!(abs.as_str(), "https://example.org/x");
        let rel = c.resolve("/page/html/Cat", false).unwrap();
        assert_eq!(
            rel.as_str(),
            "https://en.wikipedia.org/api/rest_v1/page/html/Cat"
        );
    }

    #[test]
    fn encodes_titles_as_one_segment() {
        assert_eq!(encode_segment("Cat"), "Cat");
        assert_eq!(encode_segment("Rock & roll"), "Rock%20%26%20roll");
        assert_eq!(encode_segment("Zürich"), "Z%C3%BCrich");
        assert_eq!(encode_segment("Star Wars: A"), "Star%20Wars%3A%20A");
    }

    #[test]
    fn error_message_from_action_api() {
        let body = br#"{"error":{"code":"badvalue","info":"Unrecognized value"}}"#;
        assert_eq!(extract_error_message(body), "Unrecognized value");
    }

    #[test]
    fn error_message_from_rest_problem() {
        let body = br#"{"type":"https://mediawiki.org/wiki/HyperSwitch/errors/not_found","title":"Not found.","detail":"Page or revision not found."}"#;
        assert_eq!(extract_error_message(body), "Page or revision not found.");
    }

    #[test]
    fn error_message_falls_back_to_snippet() {
        assert_eq!(extract_error_message(b"<html>oops</html>"), "<html>oops</html>");
    }

    #[test]
    fn retry_after_parses_seconds_only() {
        let mut h = HeaderMap::new();
        h.insert(RETRY_AFTER, HeaderValue::from_static(" 7 "));
        assert_eq!(retry_after_delay_secs(&h), Some(7));
        h.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after_delay_secs(&h), None);
    }

    #[test]
    fn snippet_is_truncated_on_char_boundary() {
        let body = "é".repeat(400);
        let s = snip_body(body.as_bytes());
        assert!(s.ends_with("..."));
        assert!(s.len() <= 503);
    }

    #[test]
    fn kinds_are_stable_labels() {
        assert_eq!(FetchError::Network("x".into()).kind(), "network");
        assert_eq!(FetchError::RateLimited { attempts: 3 }.kind(), "rate_limited");
        assert_eq!(FetchError::NotFound { path: "/x".into() }.kind(), "not_found");
    }
}
