//! Command-line interface for the school map dashboard.
//!
//! `sekolah serve` runs the REST proxy in front of the schools API and
//! `sekolah features` turns a saved API payload into the GeoJSON collection
//! the map renders.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod features;
mod serve;

pub use error::CliError;

use features::{FeaturesArgs, run_features};
use serve::{ServeArgs, run_serve};

pub(crate) const ARG_BIND: &str = "bind";
pub(crate) const ARG_UPSTREAM_URL: &str = "upstream-url";
pub(crate) const ARG_TIMEOUT_SECS: &str = "timeout-secs";
pub(crate) const ARG_BEARER_TOKEN: &str = "bearer-token";
pub(crate) const ARG_FEATURES_INPUT: &str = "input";
pub(crate) const ARG_PRETTY: &str = "pretty";
pub(crate) const ARG_LEVEL: &str = "level";
pub(crate) const ARG_REGENCY: &str = "regency";
pub(crate) const ARG_DISTRICT: &str = "district";
pub(crate) const ARG_SEARCH: &str = "search";
pub(crate) const ENV_FEATURES_INPUT: &str = "SEKOLAH_CMDS_FEATURES_INPUT";

/// Default listening address for `serve`.
pub(crate) const DEFAULT_BIND: &str = "0.0.0.0:3000";
/// Default upstream timeout for `serve`, in seconds.
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Run the CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when argument parsing, configuration layering, or
/// the selected command fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Serve(args) => run_serve(args),
        Command::Features(args) => run_features(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "sekolah",
    about = "Serve and prepare school data for the map dashboard",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the REST proxy in front of the schools API.
    Serve(ServeArgs),
    /// Convert a saved schools payload into a GeoJSON feature collection.
    Features(FeaturesArgs),
}

#[cfg(test)]
mod tests;
