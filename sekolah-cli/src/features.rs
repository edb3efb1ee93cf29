//! Features command: converts a saved schools payload to GeoJSON.

use std::io::{BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use sekolah_core::{
    FeatureCollection, SchoolFilter, SchoolPage, SchoolRecord, build_feature_collection,
};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DISTRICT, ARG_FEATURES_INPUT, ARG_LEVEL, ARG_PRETTY, ARG_REGENCY, ARG_SEARCH, CliError,
    ENV_FEATURES_INPUT,
};

/// CLI arguments for the `features` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Read a schools payload saved from the API (either the \
                 { total, data } envelope or a bare array of records), \
                 optionally narrow it, and print the GeoJSON point collection \
                 the map renders. Schools without coordinates are skipped.",
    about = "Convert a schools payload into GeoJSON"
)]
#[ortho_config(prefix = "SEKOLAH")]
pub(crate) struct FeaturesArgs {
    /// Path to a JSON file holding the schools payload.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Pretty-print the output.
    #[arg(long = ARG_PRETTY)]
    #[serde(default)]
    pub(crate) pretty: bool,
    /// Keep only schools of this education level (e.g. SD, SMP).
    #[arg(long = ARG_LEVEL, value_name = "level")]
    #[serde(default)]
    pub(crate) level: Option<String>,
    /// Keep only schools in this regency.
    #[arg(long = ARG_REGENCY, value_name = "name")]
    #[serde(default)]
    pub(crate) regency: Option<String>,
    /// Keep only schools in this district.
    #[arg(long = ARG_DISTRICT, value_name = "name")]
    #[serde(default)]
    pub(crate) district: Option<String>,
    /// Keep only schools whose name or NPSN contains this term.
    #[arg(long = ARG_SEARCH, value_name = "term")]
    #[serde(default)]
    pub(crate) search: Option<String>,
}

impl FeaturesArgs {
    pub(crate) fn into_config(self) -> Result<FeaturesConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        FeaturesConfig::try_from(merged)
    }
}

/// Resolved `features` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FeaturesConfig {
    pub(crate) input: Utf8PathBuf,
    pub(crate) pretty: bool,
    pub(crate) filter: SchoolFilter,
}

impl TryFrom<FeaturesArgs> for FeaturesConfig {
    type Error = CliError;

    fn try_from(args: FeaturesArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_FEATURES_INPUT,
            env: ENV_FEATURES_INPUT,
        })?;

        let mut filter = SchoolFilter::default();
        if let Some(level) = args.level.as_deref() {
            filter = filter.with_level(level);
        }
        if let Some(regency) = args.regency.as_deref() {
            filter = filter.with_regency(regency);
        }
        if let Some(district) = args.district.as_deref() {
            filter = filter.with_district(district);
        }
        if let Some(term) = args.search.as_deref() {
            filter = filter.with_search(term);
        }

        Ok(Self {
            input,
            pretty: args.pretty,
            filter,
        })
    }
}

/// Either shape the schools API hands out.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SchoolsPayload {
    Records(Vec<SchoolRecord>),
    Page(SchoolPage),
}

impl SchoolsPayload {
    fn into_records(self) -> Vec<SchoolRecord> {
        match self {
            Self::Records(records) => records,
            Self::Page(page) => page.data,
        }
    }
}

pub(super) fn run_features(args: FeaturesArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_features_with(args, &mut stdout)
}

pub(super) fn run_features_with(
    args: FeaturesArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let collection = execute_features(&config)?;
    write_collection(writer, &collection, config.pretty)
}

fn execute_features(config: &FeaturesConfig) -> Result<FeatureCollection, CliError> {
    let records = load_records(&config.input)?;
    let total = records.len();
    let collection = if config.filter.is_empty() {
        build_feature_collection(&records)
    } else {
        build_feature_collection(&config.filter.apply(&records))
    };
    info!(
        "built {} features from {total} schools in {}",
        collection.len(),
        config.input
    );
    Ok(collection)
}

/// Loads school records from a saved API payload.
pub(super) fn load_records(path: &Utf8Path) -> Result<Vec<SchoolRecord>, CliError> {
    let file = fs_utf8::File::open_ambient(path, ambient_authority()).map_err(|source| {
        CliError::OpenInput {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader::<_, SchoolsPayload>(reader)
        .map(SchoolsPayload::into_records)
        .map_err(|source| CliError::ParseInput {
            path: path.to_path_buf(),
            source,
        })
}

fn write_collection(
    writer: &mut dyn Write,
    collection: &FeatureCollection,
    pretty: bool,
) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(collection)
    } else {
        serde_json::to_string(collection)
    }
    .map_err(CliError::SerializeFeatures)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<FeaturesConfig, CliError> {
    let merged = FeaturesArgs::merge_from_layers(layers).map_err(CliError::from)?;
    FeaturesConfig::try_from(merged)
}
