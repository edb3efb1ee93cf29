//! Core domain types for the school map dashboard.
//!
//! This crate holds the school record model, the pure transform from records
//! to a GeoJSON point collection, the declarative map settings, and the
//! [`MapEngine`] trait behind which the external mapping engine sits. It does
//! no I/O of its own.

#![forbid(unsafe_code)]

pub mod bounds;
pub mod engine;
pub mod feature;
pub mod filter;
pub mod level;
pub mod school;
pub mod settings;

#[doc(hidden)]
pub mod test_support;

pub use bounds::{FIT_BOUNDS_PADDING, MAX_BOUNDS_POINTS, feature_bounds};
pub use engine::{
    ClusterOptions, Controls, Cursor, EngineError, EngineFactory, EngineOptions, IconImage,
    LayerKind, LayerSpec, MapEngine, MapEvent, PointerEvent, PointerInput, RenderedFeature,
    SourceSpec, StyleLayer, TimerId,
};
pub use feature::{
    FeatureCollection, FeatureProperties, PointFeature, PointGeometry, build_feature_collection,
};
pub use filter::{SchoolFilter, unique_districts, unique_regencies};
pub use level::EducationLevel;
pub use school::{Address, Contact, Location, SchoolPage, SchoolRecord};
pub use settings::{MapSettings, MapSettingsError, MapStyle, MarkerScale};
