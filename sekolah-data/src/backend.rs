//! Port between the proxy routes and whatever answers them upstream.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// HTTP method forwarded upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamMethod {
    /// Read.
    Get,
    /// Create.
    Post,
    /// Replace.
    Put,
    /// Delete.
    Delete,
}

/// Resource addressed upstream, relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamPath {
    /// The school collection (`{base}`).
    Collection,
    /// The filter endpoint (`{base}/filter?{query}`) with a raw query string.
    Filter(String),
    /// One school (`{base}/{npsn}`).
    School(String),
}

/// A request to forward upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    /// Method to use.
    pub method: UpstreamMethod,
    /// Target resource.
    pub path: UpstreamPath,
    /// JSON body for `POST`/`PUT`.
    pub body: Option<Value>,
    /// Caller's `Authorization` header, forwarded verbatim.
    pub authorization: Option<String>,
}

impl UpstreamRequest {
    /// A body-less request.
    #[must_use]
    pub const fn new(method: UpstreamMethod, path: UpstreamPath) -> Self {
        Self {
            method,
            path,
            body: None,
            authorization: None,
        }
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Forward the caller's `Authorization` header.
    #[must_use]
    pub fn with_authorization(mut self, authorization: Option<String>) -> Self {
        self.authorization = authorization;
        self
    }
}

/// Upstream answer: status plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed body, or `None` when the body was not JSON.
    pub body: Option<Value>,
}

impl BackendResponse {
    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Failures talking to the upstream API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// Connection or transfer failure.
    #[error("network error calling {url}: {message}")]
    Network {
        /// Request URL.
        url: String,
        /// Transport description.
        message: String,
    },
    /// A body could not be decoded.
    #[error("failed to parse response: {message}")]
    Parse {
        /// Decoder description.
        message: String,
    },
    /// The upstream answered with a non-2xx status.
    #[error("API error: {status}")]
    Status {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The request URL could not be built.
    #[error("invalid upstream URL {url}: {message}")]
    InvalidUrl {
        /// Offending URL.
        url: String,
        /// Parser description.
        message: String,
    },
}

/// Forwards requests to the external schools API.
#[async_trait]
pub trait SchoolsBackend: Send + Sync {
    /// Send `request` upstream and return its status and body.
    ///
    /// Non-2xx answers are successful forwards; only transport failures are
    /// errors.
    async fn forward(&self, request: UpstreamRequest) -> Result<BackendResponse, BackendError>;
}
