//! Resilient HTTP fetch client.
//!
//! Wraps reqwest with:
//! - Per-attempt deadlines raced against an optional cancellation token
//! - Retries with exponential backoff for retryable statuses and transport errors
//! - Failure classification into [`HttpError`]
//! - Derived helpers for text, JSON, HEAD probes and byte streams

use crate::cancel::CancellationToken;
use crate::config::{NetworkConfig, ResolverSettings};
use crate::error::HttpError;
use crate::network::retry::{retry_async, RetryConfig};
use crate::{ArtworkError, Result};
use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use reqwest::{header, Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tracing::{debug, warn};

/// Message fragments that mark a transport failure as transient.
const RETRYABLE_TRANSPORT_PATTERNS: &[&str] = &[
    "connection reset",
    "econnreset",
    "connection refused",
    "econnrefused",
    "timed out",
    "etimedout",
    "socket hang up",
    "network",
    "fetch failed",
];

/// Upper bound on the buffer reserved up front from `Content-Length`.
const MAX_PREALLOCATION: usize = 1024 * 1024;

/// Per-call request options.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Deadline for a single attempt.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub retries: u32,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Optional caller cancellation.
    pub cancel: Option<CancellationToken>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: NetworkConfig::REQUEST_TIMEOUT,
            retries: NetworkConfig::MAX_RETRIES,
            user_agent: NetworkConfig::USER_AGENT.to_string(),
            cancel: None,
        }
    }
}

impl FetchOptions {
    pub fn from_settings(settings: &ResolverSettings) -> Self {
        Self {
            timeout: settings.timeout(),
            retries: settings.retries,
            user_agent: settings.user_agent.clone(),
            cancel: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// A response body exposed as a stream of chunks.
pub struct ByteStream {
    /// Parsed `Content-Length` header, when present.
    pub content_length: Option<u64>,
    pub status: StatusCode,
    inner: BoxStream<'static, std::result::Result<Bytes, HttpError>>,
}

impl ByteStream {
    /// Read the whole stream into memory.
    pub async fn collect_bytes(mut self) -> std::result::Result<Vec<u8>, HttpError> {
        let reserve = self
            .content_length
            .map_or(0, |len| len.min(MAX_PREALLOCATION as u64) as usize);
        let mut buf = Vec::with_capacity(reserve);
        while let Some(chunk) = self.inner.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }
}

impl Stream for ByteStream {
    type Item = std::result::Result<Bytes, HttpError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteStream")
            .field("content_length", &self.content_length)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// HTTP client with retry, backoff and deadline handling.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    /// Backoff shape; the retry count comes from each call's [`FetchOptions`].
    retry: RetryConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the default backoff.
    pub fn new() -> Result<Self> {
        Self::with_retry_config(RetryConfig::default())
    }

    /// Create a new HTTP client with a custom backoff shape.
    pub fn with_retry_config(retry: RetryConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(NetworkConfig::USER_AGENT)
            .build()
            .map_err(|e| ArtworkError::Config {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, retry })
    }

    /// Get a reference to the underlying reqwest client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// GET `url` through the retry loop.
    ///
    /// Returns the final response, which may carry a non-retryable error
    /// status such as 404; the derived helpers turn those into errors.
    pub async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> std::result::Result<Response, HttpError> {
        self.send(Method::GET, url, options).await
    }

    /// HEAD `url` through the retry loop and return the final status.
    pub async fn head(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> std::result::Result<StatusCode, HttpError> {
        let response = self.send(Method::HEAD, url, options).await?;
        Ok(response.status())
    }

    /// GET `url` and decode the body as text. Fails on non-2xx.
    pub async fn fetch_text(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> std::result::Result<String, HttpError> {
        let response = ensure_success(url, self.fetch(url, options).await?)?;
        match tokio::time::timeout(options.timeout, response.text()).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(transport_error(&Method::GET, url, &e)),
            Err(_) => Err(HttpError::timeout(format!(
                "GET {} body not received within {:?}",
                url, options.timeout
            ))),
        }
    }

    /// GET `url` and deserialize the JSON body.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<T> {
        let text = self.fetch_text(url, options).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// GET `url` and expose the body as a byte stream. Fails on non-2xx.
    pub async fn fetch_stream(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> std::result::Result<ByteStream, HttpError> {
        let response = ensure_success(url, self.fetch(url, options).await?)?;
        let status = response.status();
        let content_length = parse_content_length(&response);
        let owned_url = url.to_string();
        let inner = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| transport_error(&Method::GET, &owned_url, &e)))
            .boxed();

        Ok(ByteStream {
            content_length,
            status,
            inner,
        })
    }

    /// Check if an HTTP status code indicates a retryable server condition.
    pub fn is_retryable_status(status: StatusCode) -> bool {
        NetworkConfig::RETRYABLE_STATUSES.contains(&status.as_u16())
    }

    // Internal methods

    async fn send(
        &self,
        method: Method,
        url: &str,
        options: &FetchOptions,
    ) -> std::result::Result<Response, HttpError> {
        let retry = self.retry.clone().with_retries(options.retries);
        let (result, stats) = retry_async(&retry, options.cancel.as_ref(), |attempt| {
            let method = method.clone();
            async move {
                debug!("{} {} (attempt {})", method, url, attempt + 1);
                self.attempt(method, url, options).await
            }
        })
        .await;

        if stats.attempts > 1 {
            debug!(
                "{} {} finished after {} attempts ({:?} backoff)",
                method,
                extract_domain(url),
                stats.attempts,
                stats.total_delay
            );
        }
        result
    }

    async fn attempt(
        &self,
        method: Method,
        url: &str,
        options: &FetchOptions,
    ) -> std::result::Result<Response, HttpError> {
        let request = self
            .client
            .request(method.clone(), url)
            .header(header::USER_AGENT, options.user_agent.as_str())
            .send();

        // Dropping the losing request future releases its connection.
        let outcome = tokio::select! {
            outcome = request => outcome,
            _ = tokio::time::sleep(options.timeout) => {
                return Err(HttpError::timeout(format!(
                    "{} {} timed out after {:?}",
                    method, url, options.timeout
                )));
            }
            _ = wait_for_cancel(options.cancel.as_ref()) => {
                return Err(HttpError::network(format!("{} {} cancelled", method, url), false));
            }
        };

        let response = outcome.map_err(|e| transport_error(&method, url, &e))?;
        let status = response.status();
        if Self::is_retryable_status(status) {
            // Drain so the connection can be reused; the content is irrelevant.
            tokio::select! {
                _ = tokio::time::timeout(options.timeout, response.bytes()) => {}
                _ = wait_for_cancel(options.cancel.as_ref()) => {
                    return Err(HttpError::network(format!("{} {} cancelled", method, url), false));
                }
            }
            warn!(
                "{} {} returned retryable status {}",
                method,
                extract_domain(url),
                status
            );
            return Err(HttpError::status(
                status.as_u16(),
                format!("{} {} returned {}", method, url, status),
                true,
            ));
        }

        Ok(response)
    }
}

/// Returns true when a transport failure message describes a transient condition.
pub fn is_retryable_transport_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    RETRYABLE_TRANSPORT_PATTERNS
        .iter()
        .any(|pattern| lower.contains(pattern))
}

/// Extract domain from a URL.
pub fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.host_str().unwrap_or("unknown").to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

fn transport_error(method: &Method, url: &str, err: &reqwest::Error) -> HttpError {
    let detail = error_chain(err);
    if err.is_timeout() {
        return HttpError::timeout(format!("{} {} timed out: {}", method, url, detail));
    }
    let retryable = is_retryable_transport_message(&detail);
    HttpError::network(format!("{} {} failed: {}", method, url, detail), retryable)
}

/// Flatten an error and its sources into one message.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn ensure_success(url: &str, response: Response) -> std::result::Result<Response, HttpError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(HttpError::status(
        status.as_u16(),
        format!("GET {} returned {}", url, status),
        HttpClient::is_retryable_status(status),
    ))
}

fn parse_content_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

async fn wait_for_cancel(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_status_codes() {
        for code in [408u16, 429, 500, 502, 503, 504] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(HttpClient::is_retryable_status(status), "{}", code);
        }

        assert!(!HttpClient::is_retryable_status(StatusCode::OK));
        assert!(!HttpClient::is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!HttpClient::is_retryable_status(StatusCode::FORBIDDEN));
        assert!(!HttpClient::is_retryable_status(StatusCode::NOT_IMPLEMENTED));
    }

    #[test]
    fn test_transport_message_classification() {
        assert!(is_retryable_transport_message(
            "error sending request: tcp connect error: Connection refused (os error 111)"
        ));
        assert!(is_retryable_transport_message("read ECONNRESET"));
        assert!(is_retryable_transport_message("Connection reset by peer"));
        assert!(is_retryable_transport_message("operation timed out"));
        assert!(is_retryable_transport_message("socket hang up"));
        assert!(is_retryable_transport_message("TypeError: fetch failed"));
        assert!(is_retryable_transport_message("network unreachable"));

        assert!(!is_retryable_transport_message("invalid certificate"));
        assert!(!is_retryable_transport_message("builder error: relative URL without a base"));
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("https://thumbnails.libretro.com/Nintendo/"),
            "thumbnails.libretro.com"
        );
        assert_eq!(extract_domain("invalid-url"), "unknown");
    }

    #[test]
    fn test_fetch_options_from_settings() {
        let settings = ResolverSettings {
            user_agent: "agent/2".into(),
            timeout_ms: 2500,
            retries: 1,
            sources: Vec::new(),
        };
        let options = FetchOptions::from_settings(&settings);
        assert_eq!(options.timeout, Duration::from_millis(2500));
        assert_eq!(options.retries, 1);
        assert_eq!(options.user_agent, "agent/2");
        assert!(options.cancel.is_none());
    }

    #[tokio::test]
    async fn test_invalid_url_is_not_retried() {
        let client = HttpClient::new().unwrap();
        let options = FetchOptions::default().with_retries(3);

        let started = std::time::Instant::now();
        let err = client.fetch("not a url", &options).await.unwrap_err();
        assert!(!err.retryable);
        assert!(started.elapsed() < Duration::from_millis(900));
    }
}
