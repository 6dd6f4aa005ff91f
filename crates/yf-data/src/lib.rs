//! HTTP client utilities for the YF storefront.
//!
//! Provides a small builder API over `reqwest` with automatic JSON handling,
//! per-client timeouts and an opt-in retry policy for idempotent requests.
//!
//! # Example
//!
//! ```rust,ignore
//! use yf_data::FetchClient;
//!
//! let client = FetchClient::new()?.with_base_url("http://localhost:8080");
//!
//! let lines: Vec<CartRow> = client
//!     .get("/api/cart/42")
//!     .bearer_auth(token)
//!     .send()
//!     .await?
//!     .error_for_status()?
//!     .json()?;
//! ```

mod error;
mod policy;
mod request;
mod response;

pub use error::FetchError;
pub use policy::{BackoffStrategy, RetryPolicy, TimeoutConfig};
pub use request::{Method, RequestBuilder};
pub use response::Response;

use std::collections::HashMap;

/// HTTP client for making outbound requests.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    base_url: Option<String>,
    default_headers: HashMap<String, String>,
    timeout: TimeoutConfig,
    retry: RetryPolicy,
}

impl FetchClient {
    /// Create a new HTTP client with default timeouts and no retries.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_policy(TimeoutConfig::default(), RetryPolicy::none())
    }

    /// Create a client with explicit timeout and retry policy.
    pub fn with_policy(timeout: TimeoutConfig, retry: RetryPolicy) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout.connect)
            .timeout(timeout.total)
            .build()
            .map_err(|e| FetchError::RequestError(e.to_string()))?;
        Ok(Self {
            http,
            base_url: None,
            default_headers: HashMap::new(),
            timeout,
            retry,
        })
    }

    /// Create a client with a base URL that will be prepended to all requests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a default header that will be included in all requests.
    pub fn with_default_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// The configured base URL, if any.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Create a GET request.
    pub fn get(&self, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request(Method::Get, url)
    }

    /// Create a POST request.
    pub fn post(&self, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request(Method::Post, url)
    }

    /// Create a PUT request.
    pub fn put(&self, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request(Method::Put, url)
    }

    /// Create a PATCH request.
    pub fn patch(&self, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request(Method::Patch, url)
    }

    /// Create a DELETE request.
    pub fn delete(&self, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request(Method::Delete, url)
    }

    /// Create a request with a custom method.
    pub fn request(&self, method: Method, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        let url = url.into();
        let full_url = match &self.base_url {
            Some(base) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                format!("{}{}", base.trim_end_matches('/'), url)
            }
            _ => url,
        };

        let mut builder = RequestBuilder::new(method, full_url);
        for (key, value) in &self.default_headers {
            builder = builder.header(key.clone(), value.clone());
        }

        ClientRequestBuilder {
            client: self,
            builder,
        }
    }

    async fn execute(&self, req: &RequestBuilder) -> Result<Response, FetchError> {
        let url = reqwest::Url::parse(&req.url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let mut attempt = 0u32;
        loop {
            let mut outgoing = self.http.request(req.method.to_reqwest(), url.clone());
            for (key, value) in &req.headers {
                outgoing = outgoing.header(key.as_str(), value.as_str());
            }
            if !req.query.is_empty() {
                outgoing = outgoing.query(&req.query);
            }
            if let Some(body) = &req.body {
                outgoing = outgoing.body(body.clone());
            }

            let retryable = req.method.is_idempotent();
            match outgoing.send().await {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if retryable && self.retry.should_retry_status(status, attempt) {
                        tracing::debug!(method = %req.method, url = %req.url, status, attempt, "retrying");
                        self.backoff(attempt).await;
                        attempt += 1;
                        continue;
                    }
                    let headers = resp
                        .headers()
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
                        .collect();
                    let body = resp
                        .bytes()
                        .await
                        .map_err(|e| self.classify(e))?
                        .to_vec();
                    return Ok(Response::new(status, headers, body));
                }
                Err(e) => {
                    let err = self.classify(e);
                    if retryable && self.retry.should_retry_transport(attempt) {
                        tracing::debug!(method = %req.method, url = %req.url, error = %err, attempt, "retrying");
                        self.backoff(attempt).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }

    async fn backoff(&self, attempt: u32) {
        let delay = self.retry.backoff.delay_for_attempt(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout.total)
        } else if e.is_connect() {
            FetchError::Connection(e.to_string())
        } else {
            FetchError::RequestError(e.to_string())
        }
    }
}

/// A request builder bound to a client.
pub struct ClientRequestBuilder<'a> {
    client: &'a FetchClient,
    builder: RequestBuilder,
}

impl<'a> ClientRequestBuilder<'a> {
    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.header(key, value);
        self
    }

    /// Append a query-string parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.query(key, value);
        self
    }

    /// Set the request body as JSON.
    pub fn json<T: serde::Serialize + ?Sized>(mut self, value: &T) -> Result<Self, FetchError> {
        self.builder = self.builder.json(value)?;
        Ok(self)
    }

    /// Add a bearer token authorization header.
    pub fn bearer_auth(mut self, token: impl AsRef<str>) -> Self {
        self.builder = self.builder.bearer_auth(token);
        self
    }

    /// Send the request and return the response.
    pub async fn send(self) -> Result<Response, FetchError> {
        let started = std::time::Instant::now();
        let result = self.client.execute(&self.builder).await;
        match &result {
            Ok(resp) => tracing::debug!(
                method = %self.builder.method,
                url = %self.builder.url,
                status = resp.status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "fetch complete"
            ),
            Err(err) => tracing::debug!(
                method = %self.builder.method,
                url = %self.builder.url,
                error = %err,
                "fetch failed"
            ),
        }
        result
    }

    /// Send the request, fail on non-2xx, and decode the JSON body.
    pub async fn send_json<T: serde::de::DeserializeOwned>(self) -> Result<T, FetchError> {
        self.send().await?.error_for_status()?.json()
    }

    /// Send the request and fail on non-2xx, ignoring the body.
    pub async fn send_empty(self) -> Result<(), FetchError> {
        self.send().await?.error_for_status().map(|_| ())
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{FetchClient, FetchError, Method, Response, RetryPolicy, TimeoutConfig};
}
