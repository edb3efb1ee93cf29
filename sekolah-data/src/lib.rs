//! Backend collaborator for the school dashboard.
//!
//! Responsibilities:
//! - Talk to the external schools REST API ([`SchoolsClient`]).
//! - Serve the `/api/proxy/schools` routes the dashboard calls ([`proxy`]).
//!
//! Boundaries:
//! - No persistence: the external API owns the data.
//! - No retry or backoff; failures surface to the caller as errors.
//!
//! Invariants:
//! - Upstream statuses pass through unchanged; transport failures become
//!   HTTP 500 with an operation-specific message.

pub mod backend;
pub mod client;
pub mod proxy;
pub mod server;

#[doc(hidden)]
pub mod test_support;

pub use backend::{
    BackendError, BackendResponse, SchoolsBackend, UpstreamMethod, UpstreamPath, UpstreamRequest,
};
pub use client::{
    ClientBuildError, DEFAULT_UPSTREAM_URL, DEFAULT_USER_AGENT, SchoolsClient, SchoolsClientConfig,
};
pub use proxy::{Operation, ProxyError, router};
pub use server::{ServeError, serve, serve_with_shutdown, shutdown_signal};
