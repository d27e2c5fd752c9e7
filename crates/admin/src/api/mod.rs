//! HTTP client for the store backend.
//!
//! The backend is a plain JSON API with one resource per concern (customers,
//! prescriptions, products, services, sales, payments, expenses). Every
//! request carries `Content-Type: application/json` and is bounded by the
//! configured timeout. Non-2xx responses become [`ApiError::Status`] with the
//! status code and its canonical reason.
//!
//! # API Reference
//!
//! - Base URL: `OPTIC_API_BASE_URL` (default `http://127.0.0.1:5000`)
//! - Authentication: none, the backend is only reachable on the store network

mod cashbook;
mod catalog;
mod customers;
mod prescriptions;
mod sales;
mod types;

pub use cashbook::*;
pub use sales::*;
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::ApiConfig;
use crate::error::FailureKind;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    /// Includes client-side timeouts.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("API Error: {status} {status_text}")]
    Status { status: u16, status_text: String },

    /// The response body was not the expected JSON.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No answer within the allotted time.
    #[error("Timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl ApiError {
    /// Classify for the caller: unreachable, refused, or other.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Network(_) | Self::Timeout(_) => FailureKind::Network,
            Self::Status {
                status: 400 | 409 | 422,
                ..
            } => FailureKind::Validation,
            Self::Status { .. } | Self::Decode(_) | Self::InvalidUrl(_) => FailureKind::Unknown,
        }
    }

    /// HTTP status, if the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Store backend API client.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                timeout: config.timeout,
            }),
        })
    }

    /// The base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Build an endpoint URL from path segments, each percent-encoded.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Execute a GET request.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.inner.client.get(url).send().await?;
        Self::handle_response(response).await
    }

    /// Execute a GET request for a collection.
    ///
    /// See [`read_rows`] for how the body is read.
    pub(crate) async fn get_list<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, ApiError> {
        let value: Value = self.get(url).await?;
        Ok(read_rows(value))
    }

    /// Execute a POST request.
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.inner.client.post(url).json(body).send().await?;
        Self::handle_response(response).await
    }

    /// Execute a PUT request.
    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.inner.client.put(url).json(body).send().await?;
        Self::handle_response(response).await
    }

    /// Execute a DELETE request, ignoring any body.
    pub(crate) async fn delete(&self, url: Url) -> Result<(), ApiError> {
        let response = self.inner.client.delete(url).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        Err(Self::status_error(status))
    }

    /// Handle API response and parse JSON.
    ///
    /// An empty body is read as JSON `null`.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status));
        }

        let bytes = response.bytes().await?;
        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &bytes
        };
        serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn status_error(status: reqwest::StatusCode) -> ApiError {
        ApiError::Status {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}

/// Read a collection body row by row.
///
/// A `null` or non-array body is an empty list. Rows that cannot be read are
/// skipped and logged at warn; the rest are kept.
fn read_rows<T: DeserializeOwned>(value: Value) -> Vec<T> {
    let Value::Array(rows) = value else {
        tracing::debug!(body = %value, "Expected a JSON array, treating as empty");
        return Vec::new();
    };
    rows.into_iter()
        .filter_map(|row| match T::deserialize(&row) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(error = %e, row = %row, "Skipping unreadable row");
                None
            }
        })
        .collect()
}
