//! In-memory `MapEngine` used by unit and behaviour tests.
//!
//! [`RecordingEngine`] keeps real registries for sources, layers and images
//! and enforces the same duplicate/missing-id rules as the browser engine, so
//! idempotency bugs surface as errors rather than silently passing.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use geo::{Coord, Rect};
use serde_json::Value;

use crate::{
    Cursor, EngineError, EngineFactory, EngineOptions, FeatureCollection, IconImage, LayerKind,
    LayerSpec, MapEngine, MapEvent, MapStyle, PointerEvent, SourceSpec, StyleLayer, TimerId,
};

/// Layers every base style ships with before the adapter adds its own.
fn base_style_layers() -> Vec<StyleLayer> {
    [
        ("background", LayerKind::Background),
        ("water", LayerKind::Fill),
        ("road", LayerKind::Line),
        ("building", LayerKind::Fill),
        ("road-label", LayerKind::Symbol),
        ("place-label", LayerKind::Symbol),
    ]
    .into_iter()
    .map(|(id, kind)| StyleLayer {
        id: id.to_owned(),
        kind,
    })
    .collect()
}

/// Sources provided by every base style.
const BASE_SOURCES: [&str; 1] = ["composite"];

/// A mutating call observed by [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    /// `add_source(id)`.
    AddSource(String),
    /// `remove_source(id)`.
    RemoveSource(String),
    /// `set_source_data(id, len)`.
    SetData(String, usize),
    /// `add_layer(id, before)`.
    AddLayer(String, Option<String>),
    /// `remove_layer(id)`.
    RemoveLayer(String),
    /// `set_layout_property(layer, name, value)`.
    SetLayout(String, String, Value),
    /// `load_image(name)`.
    LoadImage(String),
    /// `set_style(style)`.
    SetStyle(MapStyle),
    /// `fit_bounds(bounds, padding)`.
    FitBounds(Rect<f64>, u32),
    /// `ease_to(center, zoom)`.
    EaseTo(Coord<f64>, f64),
    /// `listen(layer, event)`.
    Listen(String, PointerEvent),
    /// `show_popup(at)`.
    ShowPopup(Coord<f64>),
    /// `hide_popup()`.
    HidePopup,
    /// `remove()`.
    Remove,
}

/// Recording, rule-enforcing stand-in for the browser map engine.
#[derive(Debug, Clone)]
pub struct RecordingEngine {
    /// Options the engine was created with.
    pub options: EngineOptions,
    /// Current style.
    pub style: MapStyle,
    /// Registered sources.
    pub sources: BTreeMap<String, SourceSpec>,
    /// Layers in draw order.
    pub layers: Vec<StyleLayer>,
    /// Layout properties set per `(layer, property)`.
    pub layout: BTreeMap<(String, String), Value>,
    /// Registered images.
    pub images: BTreeSet<String>,
    /// Images still decoding.
    pub decoding: BTreeSet<String>,
    /// Active layer listeners.
    pub listeners: Vec<(String, PointerEvent)>,
    /// Pending timers.
    pub timers: BTreeMap<TimerId, Duration>,
    /// Current cursor.
    pub cursor: Cursor,
    /// Open popup position and content.
    pub popup: Option<(Coord<f64>, String)>,
    /// Last camera target from `ease_to`.
    pub camera: Option<(Coord<f64>, f64)>,
    /// Last fitted bounds.
    pub fitted: Option<Rect<f64>>,
    /// Answer for cluster expansion queries.
    pub cluster_zoom: Result<f64, String>,
    /// When set, `set_style` is recorded but the current style and its
    /// registrations stay in force, as when the requested style fails to load.
    pub reject_styles: bool,
    /// Whether `remove` was called.
    pub removed: bool,
    /// Every mutating call in order.
    pub calls: Vec<EngineCall>,
}

impl RecordingEngine {
    /// A freshly constructed engine showing `options.style`.
    #[must_use]
    pub fn new(options: EngineOptions) -> Self {
        let style = options.style;
        Self {
            options,
            style,
            sources: BTreeMap::new(),
            layers: base_style_layers(),
            layout: BTreeMap::new(),
            images: BTreeSet::new(),
            decoding: BTreeSet::new(),
            listeners: Vec::new(),
            timers: BTreeMap::new(),
            cursor: Cursor::Default,
            popup: None,
            camera: None,
            fitted: None,
            cluster_zoom: Ok(12.0),
            reject_styles: false,
            removed: false,
            calls: Vec::new(),
        }
    }

    /// Finish decoding every pending image.
    pub fn finish_decoding(&mut self) {
        self.images.append(&mut self.decoding);
    }

    /// Ids of the layers the style did not ship with, in draw order.
    #[must_use]
    pub fn added_layer_ids(&self) -> Vec<String> {
        let base: BTreeSet<_> = base_style_layers().into_iter().map(|l| l.id).collect();
        self.layers
            .iter()
            .filter(|l| !base.contains(&l.id))
            .map(|l| l.id.clone())
            .collect()
    }

    /// Position of `id` in draw order.
    #[must_use]
    pub fn layer_index(&self, id: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    /// The only pending timer, if exactly one is scheduled.
    #[must_use]
    pub fn single_timer(&self) -> Option<TimerId> {
        let mut ids = self.timers.keys().copied();
        match (ids.next(), ids.next()) {
            (Some(id), None) => Some(id),
            _ => None,
        }
    }

    /// Expire the pending timer `id`, returning the event the host would
    /// deliver. Unknown or already fired timers yield `None`.
    pub fn fire_timer(&mut self, id: TimerId) -> Option<MapEvent> {
        self.timers.remove(&id).map(|_| MapEvent::Timer(id))
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(*call)).count()
    }
}

impl MapEngine for RecordingEngine {
    fn has_source(&self, id: &str) -> bool {
        BASE_SOURCES.contains(&id) || self.sources.contains_key(id)
    }

    fn add_source(&mut self, id: &str, source: SourceSpec) -> Result<(), EngineError> {
        if self.has_source(id) {
            return Err(EngineError::DuplicateSource { id: id.to_owned() });
        }
        self.calls.push(EngineCall::AddSource(id.to_owned()));
        self.sources.insert(id.to_owned(), source);
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), EngineError> {
        self.sources
            .remove(id)
            .ok_or_else(|| EngineError::MissingSource { id: id.to_owned() })?;
        self.calls.push(EngineCall::RemoveSource(id.to_owned()));
        Ok(())
    }

    fn set_source_data(&mut self, id: &str, data: &FeatureCollection) -> Result<(), EngineError> {
        match self.sources.get_mut(id) {
            Some(SourceSpec::GeoJson { data: current, .. }) => {
                current.clone_from(data);
                self.calls.push(EngineCall::SetData(id.to_owned(), data.len()));
                Ok(())
            }
            _ => Err(EngineError::MissingSource { id: id.to_owned() }),
        }
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layer_index(id).is_some()
    }

    fn add_layer(&mut self, layer: LayerSpec, before: Option<&str>) -> Result<(), EngineError> {
        if self.has_layer(&layer.id) {
            return Err(EngineError::DuplicateLayer { id: layer.id });
        }
        if !self.has_source(&layer.source) {
            return Err(EngineError::MissingSource { id: layer.source });
        }
        self.calls.push(EngineCall::AddLayer(
            layer.id.clone(),
            before.map(str::to_owned),
        ));
        for (name, value) in &layer.layout {
            self.layout
                .insert((layer.id.clone(), name.clone()), value.clone());
        }
        let entry = StyleLayer {
            id: layer.id,
            kind: layer.kind,
        };
        match before.and_then(|id| self.layer_index(id)) {
            Some(index) => self.layers.insert(index, entry),
            None => self.layers.push(entry),
        }
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), EngineError> {
        let index = self
            .layer_index(id)
            .ok_or_else(|| EngineError::MissingLayer { id: id.to_owned() })?;
        self.layers.remove(index);
        self.layout.retain(|(layer, _), _| layer != id);
        self.listeners.retain(|(layer, _)| layer != id);
        self.calls.push(EngineCall::RemoveLayer(id.to_owned()));
        Ok(())
    }

    fn style_layers(&self) -> Vec<StyleLayer> {
        self.layers.clone()
    }

    fn set_layout_property(
        &mut self,
        layer: &str,
        name: &str,
        value: Value,
    ) -> Result<(), EngineError> {
        if !self.has_layer(layer) {
            return Err(EngineError::MissingLayer {
                id: layer.to_owned(),
            });
        }
        self.calls.push(EngineCall::SetLayout(
            layer.to_owned(),
            name.to_owned(),
            value.clone(),
        ));
        self.layout.insert((layer.to_owned(), name.to_owned()), value);
        Ok(())
    }

    fn has_image(&self, name: &str) -> bool {
        self.images.contains(name)
    }

    fn load_image(&mut self, icon: &IconImage) {
        self.calls.push(EngineCall::LoadImage(icon.name.clone()));
        self.decoding.insert(icon.name.clone());
    }

    fn set_style(&mut self, style: MapStyle) {
        self.calls.push(EngineCall::SetStyle(style));
        if self.reject_styles {
            return;
        }
        self.style = style;
        self.sources.clear();
        self.layers = base_style_layers();
        self.layout.clear();
        self.images.clear();
        self.decoding.clear();
        self.listeners.clear();
    }

    fn fit_bounds(&mut self, bounds: Rect<f64>, padding: u32) {
        self.calls.push(EngineCall::FitBounds(bounds, padding));
        self.fitted = Some(bounds);
    }

    fn ease_to(&mut self, center: Coord<f64>, zoom: f64) {
        self.calls.push(EngineCall::EaseTo(center, zoom));
        self.camera = Some((center, zoom));
    }

    fn cluster_expansion_zoom(&self, source: &str, cluster_id: u64) -> Result<f64, EngineError> {
        if !self.sources.contains_key(source) {
            return Err(EngineError::MissingSource {
                id: source.to_owned(),
            });
        }
        self.cluster_zoom
            .clone()
            .map_err(|message| EngineError::ClusterQuery {
                cluster_id,
                message,
            })
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn show_popup(&mut self, at: Coord<f64>, html: &str) {
        self.calls.push(EngineCall::ShowPopup(at));
        self.popup = Some((at, html.to_owned()));
    }

    fn hide_popup(&mut self) {
        if self.popup.take().is_some() {
            self.calls.push(EngineCall::HidePopup);
        }
    }

    fn listen(&mut self, layer: &str, event: PointerEvent) {
        self.calls.push(EngineCall::Listen(layer.to_owned(), event));
        self.listeners.push((layer.to_owned(), event));
    }

    fn schedule_timer(&mut self, id: TimerId, delay: Duration) {
        self.timers.insert(id, delay);
    }

    fn cancel_timer(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }

    fn remove(&mut self) {
        self.calls.push(EngineCall::Remove);
        self.removed = true;
        self.sources.clear();
        self.layers.clear();
        self.listeners.clear();
        self.timers.clear();
        self.popup = None;
    }
}

/// Factory producing [`RecordingEngine`]s, or failing on demand.
#[derive(Debug, Clone, Default)]
pub struct RecordingEngineFactory {
    /// When set, `create` fails with this message.
    pub failure: Option<String>,
}

impl RecordingEngineFactory {
    /// A factory whose engines fail to start.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
        }
    }
}

impl EngineFactory for RecordingEngineFactory {
    type Engine = RecordingEngine;

    fn create(
        &self,
        _access_token: &str,
        options: &EngineOptions,
    ) -> Result<Self::Engine, EngineError> {
        match &self.failure {
            Some(message) => Err(EngineError::Creation {
                message: message.clone(),
            }),
            None => Ok(RecordingEngine::new(options.clone())),
        }
    }
}
