//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests, including:
//! - Building the HTTP client with the configured timeouts
//! - The default browser-like header set and per-call overrides
//! - Retry with exponential backoff for transport errors and non-2xx responses
//! - Error classification

use crate::config::{FetcherConfig, UserAgentConfig};
use crate::FetchError;
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION,
    CONTENT_TYPE, UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use reqwest::{Client, Method};
use std::collections::BTreeMap;
use std::time::Duration;

const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";
const DEFAULT_ACCEPT_ENCODING: &str = "gzip, deflate";

/// A successful response
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value (empty if absent)
    pub content_type: String,
    /// Raw response body
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Decodes the body as text
    ///
    /// The `charset` parameter of the Content-Type header picks the encoding.
    /// A byte order mark overrides it, and UTF-8 is used when neither names a
    /// known encoding. Malformed sequences become U+FFFD.
    pub fn text(&self) -> String {
        let encoding = charset(&self.content_type)
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);
        let (text, used, had_errors) = encoding.decode(&self.body);
        if had_errors {
            tracing::debug!(
                "Body of {} has bytes that are not valid {}",
                self.final_url,
                used.name()
            );
        }
        text.into_owned()
    }
}

/// Returns the `charset` parameter of a Content-Type value
fn charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Retrying HTTP fetcher
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    headers: HeaderMap,
    max_retries: u32,
    backoff_base: Duration,
}

/// Builds the default request header set
///
/// The set is `User-Agent`, `Accept`, `Accept-Language`,
/// `Accept-Encoding: gzip, deflate`, `Connection: keep-alive` and
/// `Upgrade-Insecure-Requests: 1`.
pub fn default_headers(user_agent: &UserAgentConfig) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, header_value("User-Agent", &user_agent.header_value())?);
    headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(DEFAULT_ACCEPT_ENCODING));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    Ok(headers)
}

/// Merges `overrides` into `base`; an override replaces the base value
pub fn merge_headers(
    base: &HeaderMap,
    overrides: &BTreeMap<String, String>,
) -> Result<HeaderMap, FetchError> {
    let mut merged = base.clone();
    for (name, value) in overrides {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| FetchError::InvalidHeader {
                name: name.clone(),
                message: e.to_string(),
            })?;
        merged.insert(header_name, header_value(name, value)?);
    }
    Ok(merged)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value).map_err(|e| FetchError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// Builds an HTTP client with the configured timeouts
///
/// Headers are not baked into the client; every request carries the merged
/// header set explicitly so per-call overrides always win.
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
        .map_err(FetchError::Client)
}

/// Backoff before retrying after attempt `attempt` (0-based): `base * 2^attempt`
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

fn classify(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

impl Fetcher {
    /// Creates a fetcher from configuration
    ///
    /// Header overrides from `[fetcher.headers]` are folded into the default
    /// header set here, once.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use gleaner::config::Config;
    /// use gleaner::crawler::Fetcher;
    ///
    /// let config = Config::default();
    /// let fetcher = Fetcher::new(&config.fetcher, &config.user_agent).unwrap();
    /// ```
    pub fn new(config: &FetcherConfig, user_agent: &UserAgentConfig) -> Result<Self, FetchError> {
        let client = build_http_client(config)?;
        let headers = merge_headers(&default_headers(user_agent)?, &config.headers)?;

        Ok(Self {
            client,
            headers,
            max_retries: config.max_retries.max(1),
            backoff_base: config.backoff_base(),
        })
    }

    /// Returns the header set sent with every request
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Fetches a URL with the default headers
    pub async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.fetch_with_headers(url, &BTreeMap::new()).await
    }

    /// Fetches a URL, retrying on failure
    ///
    /// # Retry Logic
    ///
    /// Any transport error or non-2xx status counts as a failed attempt. Up to
    /// `max_retries` attempts are made in total; after failed attempt `n`
    /// (0-based) the fetcher sleeps `backoff_base * 2^n`. The error of the
    /// last attempt is returned and no further request is made.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch
    /// * `overrides` - Headers replacing the defaults for this call only
    pub async fn fetch_with_headers(
        &self,
        url: &str,
        overrides: &BTreeMap<String, String>,
    ) -> Result<FetchResponse, FetchError> {
        let headers = merge_headers(&self.headers, overrides)?;

        let mut attempt = 0;
        loop {
            match self.attempt(url, headers.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt + 1 >= self.max_retries => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        "Retry {}/{} for {}: {}",
                        attempt + 1,
                        self.max_retries,
                        url,
                        e
                    );
                    tokio::time::sleep(backoff_delay(self.backoff_base, attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Performs a single GET request
    async fn attempt(&self, url: &str, headers: HeaderMap) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        read_response(url, response).await
    }

    /// Sends a single request with an optional JSON body, without retries
    ///
    /// Used for non-GET API calls, which are not assumed to be idempotent.
    pub async fn send_once(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
        overrides: &BTreeMap<String, String>,
    ) -> Result<FetchResponse, FetchError> {
        let headers = merge_headers(&self.headers, overrides)?;

        let mut request = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| classify(url, e))?;
        read_response(url, response).await
    }
}

/// Turns a response into a `FetchResponse`, treating non-2xx as an error
async fn read_response(url: &str, response: reqwest::Response) -> Result<FetchResponse, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = response.bytes().await.map_err(|e| classify(url, e))?;

    Ok(FetchResponse {
        final_url,
        status: status.as_u16(),
        content_type,
        body: body.to_vec(),
    })
}
