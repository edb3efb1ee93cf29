//! Abstraction over the external GIS mapping engine.
//!
//! The engine is an imperative, single-threaded resource: sources, layers and
//! images are registered by id, adding a duplicate id fails, and a style swap
//! discards every registration. [`MapEngine`] captures exactly the calls the
//! map adapter needs so that a browser binding, a native renderer or the
//! in-memory [`crate::test_support::RecordingEngine`] can sit behind it.
//!
//! Asynchronous engine notifications (load, style data, pointer input, timer
//! expiry) are delivered back to the adapter as [`MapEvent`] values by
//! whatever glue owns the event loop.

use std::time::Duration;

use geo::{Coord, Rect};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{FeatureCollection, MapStyle};

/// Errors reported by a [`MapEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// No access credential was configured.
    #[error("map engine access token is required")]
    MissingAccessToken,
    /// The engine could not be constructed.
    #[error("failed to create map engine: {message}")]
    Creation {
        /// Engine-provided description.
        message: String,
    },
    /// A source with this id already exists.
    #[error("source {id:?} already exists")]
    DuplicateSource {
        /// Offending source id.
        id: String,
    },
    /// A layer with this id already exists.
    #[error("layer {id:?} already exists")]
    DuplicateLayer {
        /// Offending layer id.
        id: String,
    },
    /// The referenced source does not exist.
    #[error("source {id:?} does not exist")]
    MissingSource {
        /// Missing source id.
        id: String,
    },
    /// The referenced layer does not exist.
    #[error("layer {id:?} does not exist")]
    MissingLayer {
        /// Missing layer id.
        id: String,
    },
    /// A cluster expansion query failed.
    #[error("cluster {cluster_id} expansion zoom query failed: {message}")]
    ClusterQuery {
        /// Cluster being expanded.
        cluster_id: u64,
        /// Engine-provided description.
        message: String,
    },
}

/// Identifier of a timer scheduled through [`MapEngine::schedule_timer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Map controls to mount alongside the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    /// Zoom and rotation buttons.
    pub navigation: bool,
    /// "Locate me" button tracking the user's heading.
    pub geolocate: bool,
    /// Fullscreen toggle.
    pub fullscreen: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            navigation: true,
            geolocate: true,
            fullscreen: true,
        }
    }
}

/// Construction options for a new engine instance.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Identifier of the host container element.
    pub container: String,
    /// Initial style.
    pub style: MapStyle,
    /// Initial camera centre (`x = longitude`, `y = latitude`).
    pub center: Coord<f64>,
    /// Initial zoom level.
    pub zoom: f64,
    /// Controls to mount.
    pub controls: Controls,
}

/// Clustering parameters for a GeoJSON source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterOptions {
    /// Highest zoom at which points are still clustered.
    pub max_zoom: u8,
    /// Cluster radius in pixels.
    pub radius: u16,
}

/// Data source registered with the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    /// Inline GeoJSON, optionally clustered.
    GeoJson {
        /// Initial data.
        data: FeatureCollection,
        /// Clustering, if enabled.
        cluster: Option<ClusterOptions>,
    },
    /// Remote vector tiles.
    Vector {
        /// Tileset URL.
        url: String,
    },
}

/// Rendering type of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Solid background.
    Background,
    /// Filled polygons.
    Fill,
    /// Lines.
    Line,
    /// Icons and text.
    Symbol,
    /// Circles.
    Circle,
    /// Extruded polygons.
    FillExtrusion,
    /// Raster imagery.
    Raster,
}

/// Definition of a layer to add.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    /// Unique layer id.
    pub id: String,
    /// Rendering type.
    pub kind: LayerKind,
    /// Source id.
    pub source: String,
    /// Layer inside a vector source.
    pub source_layer: Option<String>,
    /// Filter expression.
    pub filter: Option<Value>,
    /// Minimum zoom at which the layer renders.
    pub min_zoom: Option<f64>,
    /// Layout properties.
    pub layout: Map<String, Value>,
    /// Paint properties.
    pub paint: Map<String, Value>,
}

impl LayerSpec {
    /// A layer with no filter, zoom limit or properties.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: LayerKind, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            source: source.into(),
            source_layer: None,
            filter: None,
            min_zoom: None,
            layout: Map::new(),
            paint: Map::new(),
        }
    }

    /// Set the vector source layer.
    #[must_use]
    pub fn with_source_layer(mut self, source_layer: impl Into<String>) -> Self {
        self.source_layer = Some(source_layer.into());
        self
    }

    /// Set the filter expression.
    #[must_use]
    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the minimum zoom.
    #[must_use]
    pub const fn with_min_zoom(mut self, zoom: f64) -> Self {
        self.min_zoom = Some(zoom);
        self
    }

    /// Add a layout property.
    #[must_use]
    pub fn with_layout(mut self, name: &str, value: Value) -> Self {
        self.layout.insert(name.to_owned(), value);
        self
    }

    /// Add a paint property.
    #[must_use]
    pub fn with_paint(mut self, name: &str, value: Value) -> Self {
        self.paint.insert(name.to_owned(), value);
        self
    }
}

/// A layer as reported by the current style, in draw order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleLayer {
    /// Layer id.
    pub id: String,
    /// Rendering type.
    pub kind: LayerKind,
}

/// A marker icon to decode and register under [`IconImage::name`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    /// Image name referenced from `icon-image`.
    pub name: String,
    /// Fill colour as a CSS hex string.
    pub colour: String,
}

/// Mouse cursor shown over the map canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    /// The engine's default cursor.
    #[default]
    Default,
    /// Pointer affordance over interactive features.
    Pointer,
}

/// Pointer event kinds the adapter subscribes to per layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PointerEvent {
    /// Pointer entered a feature of the layer.
    Enter,
    /// Pointer left the layer's features.
    Leave,
    /// A feature of the layer was clicked.
    Click,
}

/// A rendered feature under the pointer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedFeature {
    /// Feature position (`x = longitude`, `y = latitude`).
    pub coordinate: Coord<f64>,
    /// Feature properties, including `cluster_id` and `point_count` for
    /// clusters.
    pub properties: Map<String, Value>,
}

/// Pointer input delivered from a layer listener.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerInput {
    /// Layer the listener was bound to.
    pub layer: String,
    /// What happened.
    pub event: PointerEvent,
    /// Topmost feature under the pointer, absent for `Leave`.
    pub feature: Option<RenderedFeature>,
}

/// Asynchronous notification from the engine or its host.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The engine finished its initial load.
    Load,
    /// Style data finished loading after a style change.
    StyleData,
    /// Loading a style failed.
    StyleError {
        /// Engine-provided description.
        message: String,
    },
    /// A timer scheduled with [`MapEngine::schedule_timer`] expired.
    Timer(TimerId),
    /// Pointer input on a layer with a bound listener.
    Pointer(PointerInput),
}

/// Imperative operations of a live mapping-engine instance.
///
/// Methods that add a duplicate or touch a missing id return an
/// [`EngineError`]; callers are expected to check existence first.
pub trait MapEngine {
    /// Whether a source with `id` exists.
    fn has_source(&self, id: &str) -> bool;
    /// Register a source.
    ///
    /// # Errors
    ///
    /// [`EngineError::DuplicateSource`] if `id` is taken.
    fn add_source(&mut self, id: &str, source: SourceSpec) -> Result<(), EngineError>;
    /// Remove a source.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingSource`] if `id` is unknown.
    fn remove_source(&mut self, id: &str) -> Result<(), EngineError>;
    /// Replace the data of a GeoJSON source.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingSource`] if `id` is unknown.
    fn set_source_data(&mut self, id: &str, data: &FeatureCollection) -> Result<(), EngineError>;

    /// Whether a layer with `id` exists.
    fn has_layer(&self, id: &str) -> bool;
    /// Add a layer, before `before` when given and present, otherwise on top.
    ///
    /// # Errors
    ///
    /// [`EngineError::DuplicateLayer`] if the id is taken.
    fn add_layer(&mut self, layer: LayerSpec, before: Option<&str>) -> Result<(), EngineError>;
    /// Remove a layer.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingLayer`] if `id` is unknown.
    fn remove_layer(&mut self, id: &str) -> Result<(), EngineError>;
    /// Layers of the current style in draw order.
    fn style_layers(&self) -> Vec<StyleLayer>;
    /// Set one layout property on a layer.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingLayer`] if `layer` is unknown.
    fn set_layout_property(&mut self, layer: &str, name: &str, value: Value)
    -> Result<(), EngineError>;

    /// Whether an image named `name` is registered.
    fn has_image(&self, name: &str) -> bool;
    /// Decode and register an icon. Decoding is asynchronous and the engine
    /// gives no completion signal.
    fn load_image(&mut self, icon: &IconImage);

    /// Swap the base style. Every source, layer and image is discarded; a
    /// [`MapEvent::StyleData`] follows once the new style is ready.
    fn set_style(&mut self, style: MapStyle);
    /// Fit the camera to `bounds` with `padding` pixels on every side.
    fn fit_bounds(&mut self, bounds: Rect<f64>, padding: u32);
    /// Animate the camera to `center` at `zoom`.
    fn ease_to(&mut self, center: Coord<f64>, zoom: f64);
    /// Zoom at which `cluster_id` of `source` splits into its members.
    ///
    /// # Errors
    ///
    /// [`EngineError::ClusterQuery`] when the engine cannot answer.
    fn cluster_expansion_zoom(&self, source: &str, cluster_id: u64) -> Result<f64, EngineError>;

    /// Set the canvas cursor.
    fn set_cursor(&mut self, cursor: Cursor);
    /// Show the single popup at `at` with `html` content, moving it if open.
    fn show_popup(&mut self, at: Coord<f64>, html: &str);
    /// Remove the popup if open.
    fn hide_popup(&mut self);
    /// Deliver [`MapEvent::Pointer`] for `event` on `layer` from now on.
    fn listen(&mut self, layer: &str, event: PointerEvent);

    /// Deliver [`MapEvent::Timer`] with `id` after `delay`.
    fn schedule_timer(&mut self, id: TimerId, delay: Duration);
    /// Cancel a pending timer; unknown ids are ignored.
    fn cancel_timer(&mut self, id: TimerId);

    /// Tear the instance down, releasing listeners, sources and layers.
    fn remove(&mut self);
}

/// Creates engine instances bound to a container.
pub trait EngineFactory {
    /// Engine type produced.
    type Engine: MapEngine;

    /// Construct an engine using `access_token`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Creation`] when the engine cannot start.
    fn create(&self, access_token: &str, options: &EngineOptions)
    -> Result<Self::Engine, EngineError>;
}
