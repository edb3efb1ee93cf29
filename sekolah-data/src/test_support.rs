//! Test utilities for the proxy.
//!
//! [`StubSchoolsBackend`] answers every forwarded request with a canned
//! response or error and records what it was asked, so proxy behaviour can be
//! checked without an upstream server.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::backend::{BackendError, BackendResponse, SchoolsBackend, UpstreamRequest};

/// Stub [`SchoolsBackend`] for testing.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use serde_json::json;
/// use sekolah_data::router;
/// use sekolah_data::test_support::StubSchoolsBackend;
///
/// let backend = StubSchoolsBackend::with_response(200, json!({ "total": 0, "data": [] }));
/// let app = router(Arc::new(backend.clone()));
/// # let _ = app;
/// assert!(backend.requests().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct StubSchoolsBackend {
    response: StubResponse,
    requests: Arc<Mutex<Vec<UpstreamRequest>>>,
}

#[derive(Debug, Clone)]
enum StubResponse {
    Reply(BackendResponse),
    Error(BackendError),
}

impl StubSchoolsBackend {
    fn new(response: StubResponse) -> Self {
        Self {
            response,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer with `status` and a JSON `body`.
    #[must_use]
    pub fn with_response(status: u16, body: Value) -> Self {
        Self::new(StubResponse::Reply(BackendResponse {
            status,
            body: Some(body),
        }))
    }

    /// Answer with `status` and a body that is not JSON.
    #[must_use]
    pub fn with_unparseable_body(status: u16) -> Self {
        Self::new(StubResponse::Reply(BackendResponse { status, body: None }))
    }

    /// Fail every forward with `error`.
    #[must_use]
    pub fn with_error(error: BackendError) -> Self {
        Self::new(StubResponse::Error(error))
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SchoolsBackend for StubSchoolsBackend {
    async fn forward(&self, request: UpstreamRequest) -> Result<BackendResponse, BackendError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        match &self.response {
            StubResponse::Reply(response) => Ok(response.clone()),
            StubResponse::Error(error) => Err(error.clone()),
        }
    }
}
