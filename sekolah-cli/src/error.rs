//! Error types emitted by the `sekolah` CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use sekolah_data::{ClientBuildError, ServeError};
use thiserror::Error;

/// Errors emitted by the `sekolah` CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The configured listening address could not be parsed.
    #[error("invalid {field} {value:?}: {source}")]
    InvalidBindAddress {
        field: &'static str,
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    /// A zero upstream timeout would fail every request.
    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },
    /// Constructing the upstream HTTP client failed.
    #[error("failed to build schools client for {upstream_url:?}: {source}")]
    BuildClient {
        upstream_url: String,
        #[source]
        source: ClientBuildError,
    },
    /// The async runtime could not be started.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The proxy server stopped with an error.
    #[error(transparent)]
    Serve(#[from] ServeError),
    /// Opening the schools payload failed.
    #[error("failed to open schools payload at {path:?}: {source}")]
    OpenInput {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The schools payload was not valid JSON of the expected shape.
    #[error("failed to parse schools payload at {path:?}: {source}")]
    ParseInput {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Serializing the feature collection failed.
    #[error("failed to serialize feature collection: {0}")]
    SerializeFeatures(#[source] serde_json::Error),
    /// Writing the command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
