//! Serve command implementation: runs the schools REST proxy.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use sekolah_data::{
    DEFAULT_UPSTREAM_URL, SchoolsBackend, SchoolsClient, SchoolsClientConfig, serve,
};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_BEARER_TOKEN, ARG_BIND, ARG_TIMEOUT_SECS, ARG_UPSTREAM_URL, CliError, DEFAULT_BIND,
    DEFAULT_TIMEOUT_SECS,
};

/// CLI arguments for the `serve` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Expose /api/proxy/schools and forward every request to the \
                 upstream schools API. Options can come from CLI flags, \
                 configuration files, or environment variables.",
    about = "Run the schools REST proxy"
)]
#[ortho_config(prefix = "SEKOLAH")]
pub(crate) struct ServeArgs {
    /// Socket address to listen on (defaults to 0.0.0.0:3000).
    #[arg(long = ARG_BIND, value_name = "addr")]
    #[serde(default)]
    pub(crate) bind: Option<String>,
    /// Base URL of the upstream schools API.
    #[arg(long = ARG_UPSTREAM_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) upstream_url: Option<String>,
    /// Upstream request timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// Static bearer token attached when callers send no Authorization header.
    #[arg(long = ARG_BEARER_TOKEN, value_name = "token")]
    #[serde(default)]
    pub(crate) bearer_token: Option<String>,
}

impl ServeArgs {
    pub(crate) fn into_config(self) -> Result<ServeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ServeConfig::try_from(merged)
    }
}

/// Resolved `serve` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ServeConfig {
    pub(crate) bind: SocketAddr,
    pub(crate) upstream_url: String,
    pub(crate) timeout: Duration,
    pub(crate) bearer_token: Option<String>,
}

impl ServeConfig {
    pub(crate) fn client_config(&self) -> SchoolsClientConfig {
        SchoolsClientConfig::new(self.upstream_url.clone())
            .with_timeout(self.timeout)
            .with_bearer_token(self.bearer_token.clone())
    }

    pub(crate) fn build_backend(&self) -> Result<Arc<dyn SchoolsBackend>, CliError> {
        let client = SchoolsClient::with_config(self.client_config()).map_err(|source| {
            CliError::BuildClient {
                upstream_url: self.upstream_url.clone(),
                source,
            }
        })?;
        Ok(Arc::new(client))
    }
}

impl TryFrom<ServeArgs> for ServeConfig {
    type Error = CliError;

    fn try_from(args: ServeArgs) -> Result<Self, Self::Error> {
        let raw_bind = args.bind.unwrap_or_else(|| DEFAULT_BIND.to_owned());
        let bind = raw_bind
            .parse()
            .map_err(|source| CliError::InvalidBindAddress {
                field: ARG_BIND,
                value: raw_bind.clone(),
                source,
            })?;

        let timeout_secs = args.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(CliError::ZeroTimeout {
                field: ARG_TIMEOUT_SECS,
            });
        }

        let upstream_url = args
            .upstream_url
            .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_owned());

        Ok(Self {
            bind,
            upstream_url,
            timeout: Duration::from_secs(timeout_secs),
            bearer_token: args.bearer_token.filter(|token| !token.trim().is_empty()),
        })
    }
}

pub(super) fn run_serve(args: ServeArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    let backend = config.build_backend()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    info!("forwarding {} to {}", config.bind, config.upstream_url);
    runtime.block_on(serve(config.bind, backend))?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ServeConfig, CliError> {
    let merged = ServeArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ServeConfig::try_from(merged)
}
