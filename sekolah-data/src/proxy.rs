//! REST proxy in front of the schools API.
//!
//! | Route                            | Methods          |
//! |----------------------------------|------------------|
//! | `/api/proxy/schools`             | GET, POST        |
//! | `/api/proxy/schools/filter`      | GET (raw query)  |
//! | `/api/proxy/schools/{npsn}`      | GET, PUT, DELETE |
//!
//! Reads return the upstream JSON on 2xx and `{ "error": "API error: <status>" }`
//! with the upstream status otherwise. Writes forward the upstream status and
//! body verbatim. Transport failures and undecodable bodies become HTTP 500
//! with a message naming the operation.

use std::fmt;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::error;
use serde_json::{Value, json};
use thiserror::Error;

use crate::backend::{
    BackendError, BackendResponse, SchoolsBackend, UpstreamMethod, UpstreamPath, UpstreamRequest,
};

/// Proxy operation, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `GET /schools`.
    FetchSchools,
    /// `POST /schools`.
    AddSchool,
    /// `GET /schools/{npsn}`.
    FetchSchool,
    /// `PUT /schools/{npsn}`.
    UpdateSchool,
    /// `DELETE /schools/{npsn}`.
    DeleteSchool,
    /// `GET /schools/filter`.
    FilterSchools,
}

impl Operation {
    /// Client-facing failure message.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::FetchSchools => "Failed to fetch schools",
            Self::AddSchool => "Failed to add school",
            Self::FetchSchool => "Failed to fetch school data",
            Self::UpdateSchool => "Failed to update school",
            Self::DeleteSchool => "Failed to delete school",
            Self::FilterSchools => "Failed to fetch filtered schools",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.failure_message())
    }
}

/// Failures answered by the proxy with a JSON `{ "error": ... }` body.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The upstream rejected a read.
    #[error("API error: {status}")]
    Upstream {
        /// Upstream status, passed through.
        status: u16,
    },
    /// The upstream could not be reached or answered garbage.
    #[error("{operation}")]
    Backend {
        /// Operation that failed.
        operation: Operation,
        /// Underlying failure.
        #[source]
        source: BackendError,
    },
    /// The incoming request body was not JSON.
    #[error("{operation}")]
    InvalidBody {
        /// Operation that failed.
        operation: Operation,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
}

impl ProxyError {
    /// HTTP status answered for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Upstream { status } => status_code(*status),
            Self::Backend { .. } | Self::InvalidBody { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match &self {
            Self::Backend { source, .. } => error!("API proxy error: {source}"),
            Self::InvalidBody { source, .. } => error!("API proxy error: {source}"),
            Self::Upstream { .. } => {}
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
}

#[derive(Clone)]
struct ProxyState {
    backend: Arc<dyn SchoolsBackend>,
}

/// Router serving the proxy routes against `backend`.
pub fn router(backend: Arc<dyn SchoolsBackend>) -> Router {
    Router::new()
        .route("/api/proxy/schools", get(list_schools).post(add_school))
        .route("/api/proxy/schools/filter", get(filter_schools))
        .route(
            "/api/proxy/schools/{npsn}",
            get(fetch_school).put(update_school).delete(delete_school),
        )
        .with_state(ProxyState { backend })
}

async fn list_schools(
    State(state): State<ProxyState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ProxyError> {
    let request = UpstreamRequest::new(UpstreamMethod::Get, UpstreamPath::Collection);
    state.read(request, &headers, Operation::FetchSchools).await
}

async fn add_school(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ProxyError> {
    let operation = Operation::AddSchool;
    let request = UpstreamRequest::new(UpstreamMethod::Post, UpstreamPath::Collection)
        .with_body(parse_body(&body, operation)?);
    state.write(request, &headers, operation).await
}

async fn filter_schools(
    State(state): State<ProxyState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Json<Value>, ProxyError> {
    let path = UpstreamPath::Filter(query.unwrap_or_default());
    let request = UpstreamRequest::new(UpstreamMethod::Get, path);
    state.read(request, &headers, Operation::FilterSchools).await
}

async fn fetch_school(
    State(state): State<ProxyState>,
    Path(npsn): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ProxyError> {
    let request = UpstreamRequest::new(UpstreamMethod::Get, UpstreamPath::School(npsn));
    state.read(request, &headers, Operation::FetchSchool).await
}

async fn update_school(
    State(state): State<ProxyState>,
    Path(npsn): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ProxyError> {
    let operation = Operation::UpdateSchool;
    let request = UpstreamRequest::new(UpstreamMethod::Put, UpstreamPath::School(npsn))
        .with_body(parse_body(&body, operation)?);
    state.write(request, &headers, operation).await
}

async fn delete_school(
    State(state): State<ProxyState>,
    Path(npsn): Path<String>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Value>), ProxyError> {
    let request = UpstreamRequest::new(UpstreamMethod::Delete, UpstreamPath::School(npsn));
    state.write(request, &headers, Operation::DeleteSchool).await
}

fn parse_body(body: &Bytes, operation: Operation) -> Result<Value, ProxyError> {
    serde_json::from_slice(body).map_err(|source| ProxyError::InvalidBody { operation, source })
}

fn caller_authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

impl ProxyState {
    async fn forward(
        &self,
        request: UpstreamRequest,
        headers: &HeaderMap,
        operation: Operation,
    ) -> Result<BackendResponse, ProxyError> {
        let request = request.with_authorization(caller_authorization(headers));
        self.backend
            .forward(request)
            .await
            .map_err(|source| ProxyError::Backend { operation, source })
    }

    async fn read(
        &self,
        request: UpstreamRequest,
        headers: &HeaderMap,
        operation: Operation,
    ) -> Result<Json<Value>, ProxyError> {
        let response = self.forward(request, headers, operation).await?;
        if !response.is_success() {
            return Err(ProxyError::Upstream {
                status: response.status,
            });
        }
        response.body.map(Json).ok_or_else(|| undecodable(operation))
    }

    async fn write(
        &self,
        request: UpstreamRequest,
        headers: &HeaderMap,
        operation: Operation,
    ) -> Result<(StatusCode, Json<Value>), ProxyError> {
        let response = self.forward(request, headers, operation).await?;
        let status = status_code(response.status);
        let body = response.body.ok_or_else(|| undecodable(operation))?;
        Ok((status, Json(body)))
    }
}

fn undecodable(operation: Operation) -> ProxyError {
    ProxyError::Backend {
        operation,
        source: BackendError::Parse {
            message: "upstream body is not JSON".to_owned(),
        },
    }
}
