//! Lifecycle of one mapping-engine instance.
//!
//! ```text
//! Uninitialized --mount--> Initializing --Load--> IconsLoading --Timer--> LayersReady
//!                                                      ^                       |
//!                                                      |                  style change
//!                                                 StyleData                    v
//!                                                      +------------------ StyleReloading
//! any state --unmount--> Destroyed
//! ```
//!
//! Registration on entry into [`Lifecycle::LayersReady`] checks existence
//! before every add, so re-entering after a style swap never trips the
//! engine's duplicate-id errors. Engine errors raised while handling events
//! are logged and swallowed; they never escape [`MapEngineAdapter::handle_event`].

use std::mem;
use std::sync::Arc;
use std::time::Duration;

use geo::Coord;
use log::{debug, error, info, warn};
use sekolah_core::{
    Controls, EngineError, EngineFactory, EngineOptions, FIT_BOUNDS_PADDING, FeatureCollection,
    MapEngine, MapEvent, MapSettings, MapStyle, SchoolRecord, TimerId, build_feature_collection,
    feature_bounds,
};
use serde_json::json;

use crate::config::MapConfig;
use crate::interaction::ClusterInteractionHandler;
use crate::layers::{
    BUILDINGS_LAYER, SCHOOLS_SOURCE, TRAFFIC_LAYER, TRAFFIC_SOURCE, UNCLUSTERED_LAYER,
    buildings_layer, first_style_symbol, label_layers, level_icons, school_layers,
    schools_source, traffic_layer, traffic_source, visibility,
};

/// Initial camera centre over Yogyakarta (`x = longitude`, `y = latitude`).
pub const INITIAL_CENTER: Coord<f64> = Coord {
    x: 110.3695,
    y: -7.7956,
};

/// Initial zoom level.
pub const INITIAL_ZOOM: f64 = 10.0;

/// Grace period between requesting icon decodes and using the icons.
///
/// The engine gives no completion signal for image decoding, so this is a
/// heuristic: a slow decode can still lose the race and leave points without
/// icons until the next style swap.
pub const ICON_SETTLE_DELAY: Duration = Duration::from_millis(250);

/// Where the adapter is in the engine lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No engine exists yet, or construction was refused.
    Uninitialized,
    /// The engine was constructed and has not reported `load`.
    Initializing,
    /// Icons were requested; waiting for the settle timer.
    IconsLoading {
        /// Timer whose expiry completes this state.
        timer: TimerId,
    },
    /// Source, layers and listeners are registered.
    LayersReady,
    /// A new style was requested; waiting for style data.
    StyleReloading,
    /// The engine was removed. Terminal.
    Destroyed,
}

/// Declarative inputs from the host, passed on every render.
#[derive(Debug, Clone)]
pub struct MapProps {
    /// Schools to plot. Identity, not content, decides whether the feature
    /// collection is rebuilt.
    pub records: Arc<[SchoolRecord]>,
    /// Style, toggles and marker scale.
    pub settings: MapSettings,
}

impl MapProps {
    /// Props for `records` with default settings.
    #[must_use]
    pub fn new(records: impl Into<Arc<[SchoolRecord]>>) -> Self {
        Self {
            records: records.into(),
            settings: MapSettings::default(),
        }
    }

    /// Replace the settings.
    #[must_use]
    pub const fn with_settings(mut self, settings: MapSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl Default for MapProps {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// The single live engine instance with an explicit liveness flag.
///
/// Deferred work checks [`EngineHandle::live_mut`] before touching the
/// engine, so callbacks that fire after teardown become no-ops.
#[derive(Debug)]
pub struct EngineHandle<E> {
    engine: E,
    live: bool,
}

impl<E: MapEngine> EngineHandle<E> {
    const fn new(engine: E) -> Self {
        Self { engine, live: true }
    }

    /// Whether the engine has not been removed.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.live
    }

    /// The engine, live or not.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable access while the engine is live.
    pub const fn live_mut(&mut self) -> Option<&mut E> {
        if self.live {
            Some(&mut self.engine)
        } else {
            None
        }
    }

    /// Remove the engine once. Later calls do nothing.
    fn release(&mut self) {
        if self.live {
            self.live = false;
            self.engine.remove();
        }
    }
}

/// Keeps one mapping engine in step with the host's [`MapProps`].
///
/// The host drives the adapter with three calls: [`mount`](Self::mount) once
/// a container exists, [`set_props`](Self::set_props) on every render and
/// [`unmount`](Self::unmount) on teardown. Engine notifications arrive
/// through [`handle_event`](Self::handle_event).
#[derive(Debug)]
pub struct MapEngineAdapter<E: MapEngine> {
    state: Lifecycle,
    handle: Option<EngineHandle<E>>,
    props: MapProps,
    features: FeatureCollection,
    interaction: ClusterInteractionHandler,
    icon_delay: Duration,
    next_timer: u64,
    style_epoch: u64,
}

impl<E: MapEngine> MapEngineAdapter<E> {
    /// Adapter for `props` reporting clicked schools to `on_select`.
    pub fn new(props: MapProps, on_select: impl FnMut(&SchoolRecord) + 'static) -> Self {
        let features = build_feature_collection(&props.records);
        Self {
            state: Lifecycle::Uninitialized,
            handle: None,
            props,
            features,
            interaction: ClusterInteractionHandler::new(on_select),
            icon_delay: ICON_SETTLE_DELAY,
            next_timer: 0,
            style_epoch: 0,
        }
    }

    /// Override [`ICON_SETTLE_DELAY`].
    #[must_use]
    pub const fn with_icon_settle_delay(mut self, delay: Duration) -> Self {
        self.icon_delay = delay;
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> Lifecycle {
        self.state
    }

    /// Props last passed by the host.
    #[must_use]
    pub const fn props(&self) -> &MapProps {
        &self.props
    }

    /// Features derived from the current records.
    #[must_use]
    pub const fn features(&self) -> &FeatureCollection {
        &self.features
    }

    /// Engine handle, if one was ever created.
    #[must_use]
    pub const fn handle(&self) -> Option<&EngineHandle<E>> {
        self.handle.as_ref()
    }

    /// The engine, if one was ever created.
    #[must_use]
    pub fn engine(&self) -> Option<&E> {
        self.handle.as_ref().map(EngineHandle::engine)
    }

    /// Mutable engine access while live, for host glue and tests.
    #[doc(hidden)]
    pub fn engine_mut(&mut self) -> Option<&mut E> {
        self.handle.as_mut().and_then(EngineHandle::live_mut)
    }

    /// Construct the engine in `container`.
    ///
    /// Only acts from [`Lifecycle::Uninitialized`]; later calls are ignored.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingAccessToken`] when `config` has no usable token,
    /// or the factory's error. Either way the adapter stays uninitialised and
    /// nothing is retried.
    pub fn mount<F>(
        &mut self,
        factory: &F,
        config: &MapConfig,
        container: &str,
    ) -> Result<(), EngineError>
    where
        F: EngineFactory<Engine = E>,
    {
        if self.state != Lifecycle::Uninitialized {
            debug!("ignoring mount in state {:?}", self.state);
            return Ok(());
        }
        let Some(token) = config.access_token() else {
            error!("map access token is not configured; the map will not render");
            return Err(EngineError::MissingAccessToken);
        };
        let options = EngineOptions {
            container: container.to_owned(),
            style: self.props.settings.style,
            center: INITIAL_CENTER,
            zoom: INITIAL_ZOOM,
            controls: Controls::default(),
        };
        let engine = factory.create(token, &options).inspect_err(|err| error!("{err}"))?;
        info!("map engine created in #{container}");
        self.handle = Some(EngineHandle::new(engine));
        self.state = Lifecycle::Initializing;
        Ok(())
    }

    /// React to an engine notification.
    pub fn handle_event(&mut self, event: MapEvent) {
        if !self.handle.as_ref().is_some_and(EngineHandle::is_live) {
            debug!("dropping {event:?}: no live engine");
            return;
        }
        match (self.state, event) {
            (Lifecycle::Initializing, MapEvent::Load)
            | (Lifecycle::StyleReloading, MapEvent::StyleData) => self.enter_icons_loading(),
            (Lifecycle::IconsLoading { timer }, MapEvent::Timer(fired)) if timer == fired => {
                self.enter_layers_ready();
            }
            (_, MapEvent::Timer(fired)) => debug!("ignoring stale timer {fired:?}"),
            (state, MapEvent::StyleError { message }) => {
                warn!("map style failed to load: {message}");
                if state == Lifecycle::StyleReloading && self.has_schools_source() {
                    // The previous style stayed in force, listeners included.
                    self.interaction.carry_over(self.style_epoch);
                    self.state = Lifecycle::LayersReady;
                }
            }
            (Lifecycle::LayersReady, MapEvent::Pointer(input)) => {
                if let Some(engine) = self.handle.as_mut().and_then(EngineHandle::live_mut) {
                    self.interaction.handle(engine, &self.props.records, &input);
                }
            }
            (state, other) => debug!("ignoring {other:?} in state {state:?}"),
        }
    }

    /// Apply new props, issuing only the engine calls the difference needs.
    pub fn set_props(&mut self, props: MapProps) {
        let previous = mem::replace(&mut self.props, props);
        let records_changed = !Arc::ptr_eq(&previous.records, &self.props.records);
        if records_changed {
            self.features = build_feature_collection(&self.props.records);
        }
        let settings = self.props.settings;
        let old = previous.settings;
        if settings.style != old.style {
            self.request_style(settings.style);
        }

        let state = self.state;
        let Some(engine) = self.handle.as_mut().and_then(EngineHandle::live_mut) else {
            return;
        };
        if settings.marker_scale != old.marker_scale && engine.has_layer(UNCLUSTERED_LAYER) {
            log_failure("marker scale", set_icon_size(engine, settings));
        }
        if state != Lifecycle::LayersReady {
            return;
        }
        if records_changed {
            log_failure("school data", push_features(engine, &self.features));
        }
        if settings.show_traffic != old.show_traffic {
            log_failure("traffic layer", sync_traffic(engine, settings.show_traffic));
        }
        if settings.show_3d != old.show_3d {
            log_failure("3D buildings", sync_buildings(engine, settings.show_3d));
        }
        if settings.show_labels != old.show_labels {
            log_failure("labels", sync_labels(engine, settings.show_labels));
        }
    }

    /// Remove the engine. Safe to call repeatedly and before mounting.
    pub fn unmount(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            if let Some(engine) = handle.live_mut() {
                if let Lifecycle::IconsLoading { timer } = self.state {
                    engine.cancel_timer(timer);
                }
                self.interaction.dismiss(engine);
            }
            handle.release();
        }
        self.interaction.reset();
        if self.state != Lifecycle::Destroyed {
            info!("map engine destroyed");
        }
        self.state = Lifecycle::Destroyed;
    }

    fn has_schools_source(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| handle.is_live() && handle.engine().has_source(SCHOOLS_SOURCE))
    }

    fn request_style(&mut self, style: MapStyle) {
        let state = self.state;
        let Some(engine) = self.handle.as_mut().and_then(EngineHandle::live_mut) else {
            return;
        };
        match state {
            Lifecycle::Initializing => engine.set_style(style),
            Lifecycle::IconsLoading { .. } | Lifecycle::LayersReady | Lifecycle::StyleReloading => {
                if let Lifecycle::IconsLoading { timer } = state {
                    engine.cancel_timer(timer);
                }
                self.interaction.dismiss(engine);
                engine.set_style(style);
                self.style_epoch = self.style_epoch.wrapping_add(1);
                self.state = Lifecycle::StyleReloading;
                debug!("style reload requested: {style}");
            }
            Lifecycle::Uninitialized | Lifecycle::Destroyed => {}
        }
    }

    fn enter_icons_loading(&mut self) {
        let Some(engine) = self.handle.as_mut().and_then(EngineHandle::live_mut) else {
            return;
        };
        let mut requested = 0_usize;
        for icon in level_icons() {
            if !engine.has_image(&icon.name) {
                engine.load_image(&icon);
                requested += 1;
            }
        }
        if requested == 0 {
            self.enter_layers_ready();
            return;
        }
        let timer = TimerId(self.next_timer);
        self.next_timer = self.next_timer.wrapping_add(1);
        engine.schedule_timer(timer, self.icon_delay);
        debug!("requested {requested} marker icons; settling for {:?}", self.icon_delay);
        self.state = Lifecycle::IconsLoading { timer };
    }

    fn enter_layers_ready(&mut self) {
        let Some(engine) = self.handle.as_mut().and_then(EngineHandle::live_mut) else {
            return;
        };
        let settings = self.props.settings;
        log_failure(
            "school layers",
            register_school_layers(engine, &self.features, settings),
        );
        log_failure("traffic layer", sync_traffic(engine, settings.show_traffic));
        log_failure("3D buildings", sync_buildings(engine, settings.show_3d));
        log_failure("labels", sync_labels(engine, settings.show_labels));
        fit_to(engine, &self.features);
        if self.interaction.bind(engine, self.style_epoch) {
            debug!("pointer listeners bound for style epoch {}", self.style_epoch);
        }
        self.state = Lifecycle::LayersReady;
    }
}

fn log_failure(what: &str, result: Result<(), EngineError>) {
    if let Err(err) = result {
        warn!("failed to update {what}: {err}");
    }
}

fn register_school_layers<E: MapEngine>(
    engine: &mut E,
    features: &FeatureCollection,
    settings: MapSettings,
) -> Result<(), EngineError> {
    if engine.has_source(SCHOOLS_SOURCE) {
        engine.set_source_data(SCHOOLS_SOURCE, features)?;
    } else {
        engine.add_source(SCHOOLS_SOURCE, schools_source(features))?;
    }
    for layer in school_layers(settings.marker_scale) {
        if engine.has_layer(&layer.id) {
            continue;
        }
        engine.add_layer(layer, None)?;
    }
    set_icon_size(engine, settings)
}

fn set_icon_size<E: MapEngine>(engine: &mut E, settings: MapSettings) -> Result<(), EngineError> {
    engine.set_layout_property(
        UNCLUSTERED_LAYER,
        "icon-size",
        json!(settings.marker_scale.get()),
    )
}

fn push_features<E: MapEngine>(
    engine: &mut E,
    features: &FeatureCollection,
) -> Result<(), EngineError> {
    if !engine.has_source(SCHOOLS_SOURCE) {
        return Ok(());
    }
    engine.set_source_data(SCHOOLS_SOURCE, features)?;
    fit_to(engine, features);
    Ok(())
}

fn fit_to<E: MapEngine>(engine: &mut E, features: &FeatureCollection) {
    if let Some(bounds) = feature_bounds(features) {
        engine.fit_bounds(bounds, FIT_BOUNDS_PADDING);
    }
}

fn sync_traffic<E: MapEngine>(engine: &mut E, show: bool) -> Result<(), EngineError> {
    if show {
        if !engine.has_source(TRAFFIC_SOURCE) {
            engine.add_source(TRAFFIC_SOURCE, traffic_source())?;
        }
        if !engine.has_layer(TRAFFIC_LAYER) {
            engine.add_layer(traffic_layer(), None)?;
        }
    } else {
        if engine.has_layer(TRAFFIC_LAYER) {
            engine.remove_layer(TRAFFIC_LAYER)?;
        }
        if engine.has_source(TRAFFIC_SOURCE) {
            engine.remove_source(TRAFFIC_SOURCE)?;
        }
    }
    Ok(())
}

fn sync_buildings<E: MapEngine>(engine: &mut E, show: bool) -> Result<(), EngineError> {
    match (show, engine.has_layer(BUILDINGS_LAYER)) {
        (true, false) => {
            let layers = engine.style_layers();
            let before = first_style_symbol(&layers).map(str::to_owned);
            engine.add_layer(buildings_layer(), before.as_deref())
        }
        (false, true) => engine.remove_layer(BUILDINGS_LAYER),
        _ => Ok(()),
    }
}

fn sync_labels<E: MapEngine>(engine: &mut E, show: bool) -> Result<(), EngineError> {
    let layers = engine.style_layers();
    for id in label_layers(&layers) {
        engine.set_layout_property(id, "visibility", visibility(show))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{CLUSTERS_LAYER, CLUSTER_COUNT_LAYER, SCHOOL_LAYERS};
    use rstest::{fixture, rstest};
    use sekolah_core::test_support::{EngineCall, RecordingEngine, RecordingEngineFactory};
    use sekolah_core::{Location, MarkerScale, PointerEvent, PointerInput, RenderedFeature};

    type Adapter = MapEngineAdapter<RecordingEngine>;

    fn school(npsn: &str, longitude: f64, latitude: f64) -> SchoolRecord {
        SchoolRecord {
            npsn: npsn.to_owned(),
            name: format!("Sekolah {npsn}"),
            level: "SMP".to_owned(),
            locations: vec![Location::at(longitude, latitude)],
            ..SchoolRecord::default()
        }
    }

    fn props() -> MapProps {
        MapProps::new(vec![school("A", 110.37, -7.80), school("B", 110.40, -7.75)])
    }

    fn token() -> MapConfig {
        MapConfig::with_access_token("pk.test")
    }

    fn engine(adapter: &Adapter) -> &RecordingEngine {
        adapter.engine().unwrap_or_else(|| panic!("engine was not created"))
    }

    fn settle_icons(adapter: &mut Adapter) {
        let fired = adapter.engine_mut().and_then(|engine| {
            engine.finish_decoding();
            engine.single_timer().and_then(|timer| engine.fire_timer(timer))
        });
        if let Some(event) = fired {
            adapter.handle_event(event);
        }
    }

    fn point_input(event: PointerEvent, npsn: &str) -> MapEvent {
        let properties = json!({ "id": npsn, "name": format!("Sekolah {npsn}") });
        MapEvent::Pointer(PointerInput {
            layer: UNCLUSTERED_LAYER.to_owned(),
            event,
            feature: Some(RenderedFeature {
                coordinate: Coord { x: 110.37, y: -7.80 },
                properties: properties.as_object().cloned().unwrap_or_default(),
            }),
        })
    }

    fn restyle(adapter: &mut Adapter, style: MapStyle) {
        let settings = adapter.props().settings.with_style(style);
        adapter.set_props(adapter.props().clone().with_settings(settings));
    }

    #[fixture]
    fn ready() -> Adapter {
        let mut adapter = Adapter::new(props(), |_| {});
        assert!(
            adapter
                .mount(&RecordingEngineFactory::default(), &token(), "map")
                .is_ok()
        );
        adapter.handle_event(MapEvent::Load);
        settle_icons(&mut adapter);
        assert_eq!(adapter.state(), Lifecycle::LayersReady);
        adapter
    }

    #[rstest]
    #[case(MapConfig::default())]
    #[case(MapConfig::with_access_token("  "))]
    fn missing_token_keeps_adapter_uninitialised(#[case] config: MapConfig) {
        let mut adapter = Adapter::new(props(), |_| {});
        let result = adapter.mount(&RecordingEngineFactory::default(), &config, "map");
        assert_eq!(result, Err(EngineError::MissingAccessToken));
        assert_eq!(adapter.state(), Lifecycle::Uninitialized);
        assert!(adapter.engine().is_none());
    }

    #[rstest]
    fn factory_failure_keeps_adapter_uninitialised() {
        let mut adapter = Adapter::new(props(), |_| {});
        let result = adapter.mount(&RecordingEngineFactory::failing("no WebGL"), &token(), "map");
        assert!(matches!(result, Err(EngineError::Creation { .. })));
        assert_eq!(adapter.state(), Lifecycle::Uninitialized);
    }

    #[rstest]
    fn mount_uses_initial_camera_and_style() {
        let settings = MapSettings::default().with_style(MapStyle::Dark);
        let mut adapter = Adapter::new(props().with_settings(settings), |_| {});
        assert!(adapter.mount(&RecordingEngineFactory::default(), &token(), "map").is_ok());
        let options = &engine(&adapter).options;
        assert_eq!(options.style, MapStyle::Dark);
        assert_eq!(options.center, INITIAL_CENTER);
        assert!(options.controls.geolocate);
        assert_eq!(adapter.state(), Lifecycle::Initializing);
    }

    #[rstest]
    fn load_requests_every_icon_and_schedules_settle_timer() {
        let mut adapter = Adapter::new(props(), |_| {});
        assert!(adapter.mount(&RecordingEngineFactory::default(), &token(), "map").is_ok());
        adapter.handle_event(MapEvent::Load);
        let engine = engine(&adapter);
        assert_eq!(engine.decoding.len(), 5);
        let timer = engine.single_timer();
        assert!(timer.is_some());
        assert_eq!(engine.timers.values().next(), Some(&ICON_SETTLE_DELAY));
        assert!(matches!(adapter.state(), Lifecycle::IconsLoading { timer: t } if Some(t) == timer));
        assert!(engine.added_layer_ids().is_empty());
    }

    #[rstest]
    fn ready_registers_layers_fits_bounds_and_binds_listeners(ready: Adapter) {
        let engine = engine(&ready);
        assert_eq!(engine.added_layer_ids(), SCHOOL_LAYERS.map(str::to_owned).to_vec());
        assert!(engine.fitted.is_some());
        assert!(
            engine
                .calls
                .iter()
                .any(|call| matches!(call, EngineCall::FitBounds(_, 50)))
        );
        assert_eq!(engine.listeners.len(), 6);
        assert_eq!(
            engine.layout.get(&(UNCLUSTERED_LAYER.to_owned(), "icon-size".to_owned())),
            Some(&json!(0.8))
        );
    }

    #[rstest]
    fn stale_timer_is_ignored() {
        let mut adapter = Adapter::new(props(), |_| {});
        assert!(adapter.mount(&RecordingEngineFactory::default(), &token(), "map").is_ok());
        adapter.handle_event(MapEvent::Load);
        let before = adapter.state();
        adapter.handle_event(MapEvent::Timer(TimerId(99)));
        assert_eq!(adapter.state(), before);
        assert!(engine(&adapter).added_layer_ids().is_empty());
    }

    #[rstest]
    fn style_change_reregisters_same_layers(mut ready: Adapter) {
        let first = engine(&ready).added_layer_ids();
        let settings = ready.props().settings.with_style(MapStyle::Satellite);
        ready.set_props(ready.props().clone().with_settings(settings));
        assert_eq!(ready.state(), Lifecycle::StyleReloading);

        ready.handle_event(MapEvent::StyleData);
        assert!(matches!(ready.state(), Lifecycle::IconsLoading { .. }));
        settle_icons(&mut ready);

        assert_eq!(ready.state(), Lifecycle::LayersReady);
        let engine = engine(&ready);
        assert_eq!(engine.style, MapStyle::Satellite);
        assert_eq!(engine.added_layer_ids(), first);
        assert_eq!(engine.listeners.len(), 6);
    }

    #[rstest]
    fn marker_scale_before_ready_is_a_no_op() {
        let mut adapter = Adapter::new(props(), |_| {});
        assert!(adapter.mount(&RecordingEngineFactory::default(), &token(), "map").is_ok());
        let settings = MapSettings::default().with_marker_scale(MarkerScale::clamped(1.5));
        adapter.set_props(adapter.props().clone().with_settings(settings));
        assert_eq!(
            engine(&adapter).count_calls(|call| matches!(call, EngineCall::SetLayout(..))),
            0
        );

        adapter.handle_event(MapEvent::Load);
        settle_icons(&mut adapter);
        assert_eq!(
            engine(&adapter)
                .layout
                .get(&(UNCLUSTERED_LAYER.to_owned(), "icon-size".to_owned())),
            Some(&json!(1.5))
        );
    }

    #[rstest]
    fn marker_scale_updates_point_layer_in_place(mut ready: Adapter) {
        let settings = ready.props().settings.with_marker_scale(MarkerScale::clamped(2.0));
        ready.set_props(ready.props().clone().with_settings(settings));
        let engine = engine(&ready);
        assert_eq!(
            engine.layout.get(&(UNCLUSTERED_LAYER.to_owned(), "icon-size".to_owned())),
            Some(&json!(2.0))
        );
        assert_eq!(engine.count_calls(|call| matches!(call, EngineCall::AddLayer(..))), 3);
    }

    #[rstest]
    fn new_records_replace_source_data(mut ready: Adapter) {
        let records: Vec<_> = vec![school("C", 106.8, -6.2)];
        ready.set_props(MapProps::new(records).with_settings(ready.props().settings));
        assert_eq!(ready.features().len(), 1);
        let engine = engine(&ready);
        assert_eq!(
            engine.calls.last(),
            Some(&EngineCall::FitBounds(
                geo::Rect::new(Coord { x: 106.8, y: -6.2 }, Coord { x: 106.8, y: -6.2 }),
                FIT_BOUNDS_PADDING
            ))
        );
        assert!(engine.calls.contains(&EngineCall::SetData(SCHOOLS_SOURCE.to_owned(), 1)));
    }

    #[rstest]
    fn same_record_list_is_not_pushed_again(mut ready: Adapter) {
        let props = ready.props().clone();
        ready.set_props(props);
        assert_eq!(
            engine(&ready).count_calls(|call| matches!(call, EngineCall::SetData(..))),
            0
        );
    }

    #[rstest]
    fn traffic_toggle_adds_and_removes_layer(mut ready: Adapter) {
        let on = ready.props().settings.with_traffic(true);
        ready.set_props(ready.props().clone().with_settings(on));
        assert!(engine(&ready).sources.contains_key(TRAFFIC_SOURCE));
        assert!(engine(&ready).has_layer(TRAFFIC_LAYER));

        ready.set_props(ready.props().clone().with_settings(on.with_traffic(false)));
        assert!(!engine(&ready).sources.contains_key(TRAFFIC_SOURCE));
        assert!(!engine(&ready).has_layer(TRAFFIC_LAYER));
    }

    #[rstest]
    fn buildings_go_below_first_style_symbol(mut ready: Adapter) {
        let on = ready.props().settings.with_3d(true);
        ready.set_props(ready.props().clone().with_settings(on));
        let engine = engine(&ready);
        let buildings = engine.layer_index(BUILDINGS_LAYER);
        assert!(buildings.is_some());
        assert_eq!(buildings.map(|index| index + 1), engine.layer_index("road-label"));
    }

    #[rstest]
    fn labels_toggle_only_touches_style_symbols(mut ready: Adapter) {
        let off = ready.props().settings.with_labels(false);
        ready.set_props(ready.props().clone().with_settings(off));
        let engine = engine(&ready);
        let visibility_of = |layer: &str| {
            engine
                .layout
                .get(&(layer.to_owned(), "visibility".to_owned()))
                .cloned()
        };
        assert_eq!(visibility_of("road-label"), Some(json!("none")));
        assert_eq!(visibility_of("place-label"), Some(json!("none")));
        assert_eq!(visibility_of(CLUSTER_COUNT_LAYER), None);
        assert_eq!(visibility_of(UNCLUSTERED_LAYER), None);
    }

    #[rstest]
    fn unmount_is_idempotent(mut ready: Adapter) {
        ready.unmount();
        ready.unmount();
        assert_eq!(ready.state(), Lifecycle::Destroyed);
        let engine = engine(&ready);
        assert!(engine.removed);
        assert_eq!(engine.count_calls(|call| *call == EngineCall::Remove), 1);
        assert!(!ready.handle().is_some_and(EngineHandle::is_live));
    }

    #[rstest]
    fn callbacks_after_unmount_are_ignored() {
        let mut adapter = Adapter::new(props(), |_| {});
        assert!(adapter.mount(&RecordingEngineFactory::default(), &token(), "map").is_ok());
        adapter.handle_event(MapEvent::Load);
        let timer = engine(&adapter).single_timer();
        adapter.unmount();
        if let Some(timer) = timer {
            adapter.handle_event(MapEvent::Timer(timer));
        }
        assert_eq!(adapter.state(), Lifecycle::Destroyed);
        assert!(engine(&adapter).timers.is_empty());
        assert!(engine(&adapter).added_layer_ids().is_empty());
    }

    #[rstest]
    fn unmount_before_mount_is_safe() {
        let mut adapter = Adapter::new(props(), |_| {});
        adapter.unmount();
        assert_eq!(adapter.state(), Lifecycle::Destroyed);
        let result = adapter.mount(&RecordingEngineFactory::default(), &token(), "map");
        assert!(result.is_ok());
        assert!(adapter.engine().is_none());
    }

    #[rstest]
    fn failed_style_load_keeps_waiting_without_source(mut ready: Adapter) {
        let settings = ready.props().settings.with_style(MapStyle::Light);
        ready.set_props(ready.props().clone().with_settings(settings));
        ready.handle_event(MapEvent::StyleError {
            message: "404".to_owned(),
        });
        assert_eq!(ready.state(), Lifecycle::StyleReloading);
    }

    #[rstest]
    fn pointer_input_outside_ready_state_is_ignored() {
        let mut adapter = Adapter::new(props(), |_| {});
        assert!(adapter.mount(&RecordingEngineFactory::default(), &token(), "map").is_ok());
        adapter.handle_event(MapEvent::Pointer(PointerInput {
            layer: CLUSTERS_LAYER.to_owned(),
            event: PointerEvent::Enter,
            feature: None,
        }));
        assert_eq!(engine(&adapter).cursor, sekolah_core::Cursor::Default);
    }

    #[rstest]
    fn style_swap_closes_open_popup(mut ready: Adapter) {
        ready.handle_event(point_input(PointerEvent::Enter, "A"));
        assert!(engine(&ready).popup.is_some());

        restyle(&mut ready, MapStyle::Dark);
        assert!(engine(&ready).popup.is_none());
        ready.handle_event(MapEvent::StyleData);
        settle_icons(&mut ready);
        assert_eq!(ready.state(), Lifecycle::LayersReady);

        ready.handle_event(point_input(PointerEvent::Leave, "A"));
        assert!(engine(&ready).popup.is_none());

        ready.handle_event(point_input(PointerEvent::Enter, "B"));
        ready.handle_event(point_input(PointerEvent::Leave, "B"));
        assert!(engine(&ready).popup.is_none());
    }

    #[rstest]
    fn unmount_closes_open_popup(mut ready: Adapter) {
        ready.handle_event(point_input(PointerEvent::Enter, "A"));
        ready.unmount();
        let engine = engine(&ready);
        assert!(engine.popup.is_none());
        assert_eq!(engine.count_calls(|call| *call == EngineCall::HidePopup), 1);
    }

    #[rstest]
    fn failed_style_load_keeps_last_good_state(mut ready: Adapter) {
        ready.handle_event(point_input(PointerEvent::Enter, "A"));
        let (layers, listeners, layout) = {
            let engine = engine(&ready);
            (engine.added_layer_ids(), engine.listeners.clone(), engine.layout.clone())
        };
        if let Some(engine) = ready.engine_mut() {
            engine.reject_styles = true;
        }

        restyle(&mut ready, MapStyle::Light);
        ready.handle_event(MapEvent::StyleError {
            message: "404".to_owned(),
        });

        assert_eq!(ready.state(), Lifecycle::LayersReady);
        let current = engine(&ready);
        assert_eq!(current.style, MapStyle::Streets);
        assert_eq!(current.added_layer_ids(), layers);
        assert_eq!(current.listeners, listeners);
        assert_eq!(current.layout, layout);
        assert!(current.popup.is_none());

        ready.handle_event(point_input(PointerEvent::Enter, "B"));
        assert!(engine(&ready).popup.is_some());
        ready.handle_event(point_input(PointerEvent::Leave, "B"));
        assert!(engine(&ready).popup.is_none());
    }

    #[rstest]
    fn reload_after_failed_style_rebinds_listeners(mut ready: Adapter) {
        if let Some(engine) = ready.engine_mut() {
            engine.reject_styles = true;
        }
        restyle(&mut ready, MapStyle::Light);
        ready.handle_event(MapEvent::StyleError {
            message: "404".to_owned(),
        });
        if let Some(engine) = ready.engine_mut() {
            engine.reject_styles = false;
        }

        restyle(&mut ready, MapStyle::Satellite);
        ready.handle_event(MapEvent::StyleData);
        settle_icons(&mut ready);

        assert_eq!(ready.state(), Lifecycle::LayersReady);
        let engine = engine(&ready);
        assert_eq!(engine.style, MapStyle::Satellite);
        assert_eq!(engine.listeners.len(), 6);
        assert!(engine.timers.is_empty());
    }
}
