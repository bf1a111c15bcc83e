//! # HTTP Retrieval Utilities
//!
//! This module provides an asynchronous API client wrapper around `reqwest`.
//! It includes middleware support for exponential backoff retries, an optional
//! request timeout and standardized JSON response handling.

use std::time::Duration;

use reqwest::{
    header::{HeaderMap, AUTHORIZATION},
    Method, Url,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors raised while building or executing a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The base URL could not be parsed as an absolute URL.
    #[error("Invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// The underlying parse failure.
        #[source]
        source: url::ParseError,
    },
    /// A relative path could not be joined onto the base URL.
    #[error("Invalid request path '{path}': {source}")]
    InvalidPath {
        /// The rejected path.
        path: String,
        /// The underlying parse failure.
        #[source]
        source: url::ParseError,
    },
    /// Client construction or response body decoding failed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    /// The request could not be sent (connection refused, DNS, retries exhausted...).
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest_middleware::Error),
    /// The server answered with a non-2xx status.
    #[error("Unexpected HTTP status {status}: {body}")]
    Status {
        /// Numeric HTTP status.
        status: u16,
        /// Raw response body, empty if unreadable.
        body: String,
    },
}

/// A standardized container for API responses.
///
/// This struct wraps the deserialized data along with metadata about the
/// HTTP transaction, such as status codes and headers.
#[derive(Debug)]
pub struct ApiResponse<T> {
    /// The successfully deserialized response body, if any.
    pub data: Option<T>,
    /// The raw error body returned by the server if the request failed.
    pub error_body: Option<String>,
    /// The numeric HTTP status code.
    pub status: u16,
    /// Indicates if the status code was in the 2xx range.
    pub success: bool,
    /// The headers returned by the server.
    pub headers: HeaderMap,
}

/// Tuning knobs for [`ApiClient`].
#[derive(Debug, Clone, Default)]
pub struct ApiClientOptions {
    /// Retries for transient failures. `0` disables the retry middleware.
    pub max_retries: u32,
    /// Whole-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Value for the `User-Agent` header.
    pub user_agent: Option<String>,
}

/// A flexible asynchronous HTTP client.
///
/// Built on top of `reqwest_middleware`, it handles base URLs,
/// authentication tokens, and automatic retries.
#[derive(Clone)]
pub struct ApiClient {
    /// The underlying middleware-enabled client.
    inner: ClientWithMiddleware,
    /// The base URL to which all relative paths are joined. Always ends with `/`.
    base_url: Url,
    /// An optional Bearer token used for authorization.
    auth_token: Option<String>,
}

impl ApiClient {
    /// Creates a new `ApiClient` with default options (no retries, no timeout).
    ///
    /// # Errors
    /// Returns [`ApiError::InvalidBaseUrl`] if `base_url` is not an absolute URL.
    pub fn new(base_url: &str, auth_token: Option<String>) -> Result<Self, ApiError> {
        Self::with_options(base_url, auth_token, ApiClientOptions::default())
    }

    /// Creates a new `ApiClient` with explicit retry/timeout options.
    ///
    /// # Arguments
    /// * `base_url` - The absolute base URL for the API (e.g., "https://api.example.com/v1").
    ///   A trailing `/` is added when missing so relative paths extend it.
    /// * `auth_token` - An optional string for the Authorization header.
    /// * `options` - Retry, timeout and user agent settings.
    pub fn with_options(
        base_url: &str,
        auth_token: Option<String>,
        options: ApiClientOptions,
    ) -> Result<Self, ApiError> {
        let mut url = Url::parse(base_url).map_err(|source| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let mut http = reqwest::Client::builder();
        if let Some(timeout) = options.timeout {
            http = http.timeout(timeout);
        }
        if let Some(agent) = &options.user_agent {
            http = http.user_agent(agent.as_str());
        }

        let mut builder = ClientBuilder::new(http.build()?);
        if options.max_retries > 0 {
            let retry_policy =
                ExponentialBackoff::builder().build_with_max_retries(options.max_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
        }

        Ok(Self {
            inner: builder.build(),
            base_url: url,
            auth_token,
        })
    }

    /// The normalized base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Performs a generic HTTP request and handles the response.
    ///
    /// Non-2xx statuses are not errors here: they come back as an
    /// `ApiResponse` with `success == false` and the raw body captured.
    ///
    /// # Arguments
    /// * `method` - The HTTP verb (GET, HEAD, etc.).
    /// * `path` - The relative path to append to the base URL.
    pub async fn request<T>(&self, method: Method, path: &str) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let full_url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| ApiError::InvalidPath {
                path: path.to_string(),
                source,
            })?;
        let mut req = self.inner.request(method, full_url);

        if let Some(token) = &self.auth_token {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response: reqwest::Response = req.send().await?;
        let status = response.status();
        let resp_headers = response.headers().clone();

        if status.is_success() {
            let data = response.json::<T>().await?;
            Ok(ApiResponse {
                data: Some(data),
                error_body: None,
                status: status.as_u16(),
                success: true,
                headers: resp_headers,
            })
        } else {
            let error_text = response.text().await.ok();
            Ok(ApiResponse {
                data: None,
                error_body: error_text,
                status: status.as_u16(),
                success: false,
                headers: resp_headers,
            })
        }
    }

    /// GETs `path` and decodes the body as `T`, treating any non-2xx status
    /// as [`ApiError::Status`].
    pub async fn get_json<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = self.request::<T>(Method::GET, path).await?;
        match response.data {
            Some(data) if response.success => Ok(data),
            _ => Err(ApiError::Status {
                status: response.status,
                body: response.error_body.unwrap_or_default(),
            }),
        }
    }
}
