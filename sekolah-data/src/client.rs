//! HTTP client for the external schools REST API.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use sekolah_data::{SchoolsClient, SchoolsClientConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SchoolsClientConfig::new("https://intero-rest-api.vercel.app/api/sekolah")
//!     .with_timeout(Duration::from_secs(10))
//!     .with_user_agent("dashboard/1.0");
//! let client = SchoolsClient::with_config(config)?;
//! let page = client.fetch_schools().await?;
//! println!("{} schools", page.total);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method};
use sekolah_core::{SchoolPage, SchoolRecord};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::backend::{
    BackendError, BackendResponse, SchoolsBackend, UpstreamMethod, UpstreamPath, UpstreamRequest,
};

/// Public endpoint of the schools API.
pub const DEFAULT_UPSTREAM_URL: &str = "https://intero-rest-api.vercel.app/api/sekolah";

/// Default user agent for upstream requests.
pub const DEFAULT_USER_AGENT: &str = "sekolah-atlas/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors building a [`SchoolsClient`].
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// The base URL does not parse or cannot carry path segments.
    #[error("invalid upstream URL {url}: {message}")]
    InvalidUrl {
        /// Offending URL.
        url: String,
        /// Parser description.
        message: String,
    },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Configuration for [`SchoolsClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchoolsClientConfig {
    /// Base URL of the schools collection.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Token sent as `Bearer` when the caller supplies no `Authorization`.
    pub bearer_token: Option<String>,
}

impl Default for SchoolsClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            bearer_token: None,
        }
    }
}

impl SchoolsClientConfig {
    /// Configuration for `base_url` with default timeout and user agent.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the fallback bearer token. Blank tokens are ignored.
    #[must_use]
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|t| !t.trim().is_empty());
        self
    }
}

/// Client for the schools REST API.
#[derive(Debug, Clone)]
pub struct SchoolsClient {
    client: Client,
    base: Url,
    config: SchoolsClientConfig,
}

impl SchoolsClient {
    /// Client for `base_url` with default configuration.
    ///
    /// # Errors
    ///
    /// See [`SchoolsClient::with_config`].
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientBuildError> {
        Self::with_config(SchoolsClientConfig::new(base_url))
    }

    /// Client with explicit configuration.
    ///
    /// # Errors
    ///
    /// [`ClientBuildError::InvalidUrl`] if the base URL is unusable, or
    /// [`ClientBuildError::HttpClient`] if the HTTP client fails to build.
    pub fn with_config(config: SchoolsClientConfig) -> Result<Self, ClientBuildError> {
        let invalid = |message: String| ClientBuildError::InvalidUrl {
            url: config.base_url.clone(),
            message,
        };
        let base = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|err| invalid(err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("URL cannot carry a path".to_owned()));
        }
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ClientBuildError::HttpClient)?;
        Ok(Self {
            client,
            base,
            config,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SchoolsClientConfig {
        &self.config
    }

    /// Fetch every school.
    ///
    /// # Errors
    ///
    /// Transport failures, [`BackendError::Status`] for non-2xx answers and
    /// [`BackendError::Parse`] for unexpected bodies.
    pub async fn fetch_schools(&self) -> Result<SchoolPage, BackendError> {
        self.fetch(UpstreamPath::Collection).await
    }

    /// Fetch one school by NPSN.
    ///
    /// # Errors
    ///
    /// As for [`SchoolsClient::fetch_schools`].
    pub async fn fetch_school(&self, npsn: &str) -> Result<SchoolRecord, BackendError> {
        self.fetch(UpstreamPath::School(npsn.to_owned())).await
    }

    /// Fetch schools of one education level through the filter endpoint.
    ///
    /// # Errors
    ///
    /// As for [`SchoolsClient::fetch_schools`].
    pub async fn filter_by_level(&self, level: &str) -> Result<SchoolPage, BackendError> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("bentukPendidikan", level)
            .finish();
        self.fetch(UpstreamPath::Filter(query)).await
    }

    async fn fetch<T: DeserializeOwned>(&self, path: UpstreamPath) -> Result<T, BackendError> {
        let url = self.url_for(&path)?;
        let response = self
            .forward(UpstreamRequest::new(UpstreamMethod::Get, path))
            .await?;
        if !response.is_success() {
            return Err(BackendError::Status {
                url: url.into(),
                status: response.status,
            });
        }
        let body = response.body.ok_or_else(|| BackendError::Parse {
            message: format!("{url} returned a non-JSON body"),
        })?;
        serde_json::from_value(body).map_err(|err| BackendError::Parse {
            message: err.to_string(),
        })
    }

    /// Absolute URL of `path` below the base URL.
    fn url_for(&self, path: &UpstreamPath) -> Result<Url, BackendError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| BackendError::InvalidUrl {
                    url: self.base.to_string(),
                    message: "URL cannot carry a path".to_owned(),
                })?;
            segments.pop_if_empty();
            match path {
                UpstreamPath::Collection => {}
                UpstreamPath::Filter(_) => {
                    segments.push("filter");
                }
                UpstreamPath::School(npsn) => {
                    segments.push(npsn);
                }
            }
        }
        if let UpstreamPath::Filter(query) = path {
            url.set_query(Some(query).filter(|q| !q.is_empty()).map(String::as_str));
        }
        Ok(url)
    }

    fn authorization(&self, request: &UpstreamRequest) -> Option<String> {
        request.authorization.clone().or_else(|| {
            self.config
                .bearer_token
                .as_ref()
                .map(|token| format!("Bearer {token}"))
        })
    }

    /// Convert a reqwest error to a [`BackendError`].
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &Url) -> BackendError {
        if error.is_timeout() {
            return BackendError::Timeout {
                url: url.to_string(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }
        BackendError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

fn method(method: UpstreamMethod) -> Method {
    match method {
        UpstreamMethod::Get => Method::GET,
        UpstreamMethod::Post => Method::POST,
        UpstreamMethod::Put => Method::PUT,
        UpstreamMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl SchoolsBackend for SchoolsClient {
    async fn forward(&self, request: UpstreamRequest) -> Result<BackendResponse, BackendError> {
        let url = self.url_for(&request.path)?;
        debug!("forwarding {:?} {url}", request.method);
        let mut builder = self.client.request(method(request.method), url.clone());
        if let Some(authorization) = self.authorization(&request) {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        Ok(BackendResponse {
            status,
            body: serde_json::from_slice(&bytes).ok(),
        })
    }
}
