//! Facade crate for the school map dashboard.
//!
//! This crate re-exports the core domain types and the map layer adapter,
//! and exposes the schools REST client and proxy behind the `proxy` feature.

#![forbid(unsafe_code)]

pub use sekolah_core::{
    EducationLevel, EngineError, EngineFactory, FeatureCollection, MapEngine, MapEvent,
    MapSettings, MapSettingsError, MapStyle, MarkerScale, PointFeature, SchoolFilter, SchoolPage,
    SchoolRecord, build_feature_collection, feature_bounds,
};

pub use sekolah_map::{ClusterInteractionHandler, Lifecycle, MapConfig, MapEngineAdapter, MapProps};

#[cfg(feature = "proxy")]
pub use sekolah_data::{
    BackendError, ClientBuildError, SchoolsBackend, SchoolsClient, SchoolsClientConfig,
    ServeError, router, serve,
};
