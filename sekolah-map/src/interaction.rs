//! Pointer handling on the cluster and point layers.

use std::fmt;

use log::{debug, warn};
use sekolah_core::{Cursor, MapEngine, PointerEvent, PointerInput, RenderedFeature, SchoolRecord};
use serde_json::Value;

use crate::layers::{CLUSTERS_LAYER, SCHOOLS_SOURCE, UNCLUSTERED_LAYER};
use crate::popup::render_popup;

/// Host callback invoked with the school behind a clicked point.
pub type SelectCallback = Box<dyn FnMut(&SchoolRecord)>;

/// Layers and events the handler listens to.
const BINDINGS: [(&str, PointerEvent); 6] = [
    (CLUSTERS_LAYER, PointerEvent::Enter),
    (CLUSTERS_LAYER, PointerEvent::Leave),
    (CLUSTERS_LAYER, PointerEvent::Click),
    (UNCLUSTERED_LAYER, PointerEvent::Enter),
    (UNCLUSTERED_LAYER, PointerEvent::Leave),
    (UNCLUSTERED_LAYER, PointerEvent::Click),
];

/// Translates pointer input on the `clusters` and `unclustered-point` layers
/// into cursor changes, cluster expansion, a single reused popup and the
/// host's selection callback.
///
/// Listeners are bound once per style epoch; a style swap discards them
/// along with the layers, so the adapter bumps the epoch and rebinds on the
/// next entry into the ready state. Input for layers that no longer exist is
/// ignored.
pub struct ClusterInteractionHandler {
    on_select: SelectCallback,
    popup_open: bool,
    bound_epoch: Option<u64>,
}

impl fmt::Debug for ClusterInteractionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterInteractionHandler")
            .field("popup_open", &self.popup_open)
            .field("bound_epoch", &self.bound_epoch)
            .finish_non_exhaustive()
    }
}

impl ClusterInteractionHandler {
    /// Handler reporting point clicks to `on_select`.
    pub fn new(on_select: impl FnMut(&SchoolRecord) + 'static) -> Self {
        Self {
            on_select: Box::new(on_select),
            popup_open: false,
            bound_epoch: None,
        }
    }

    /// Whether the point popup is currently shown.
    #[must_use]
    pub const fn popup_open(&self) -> bool {
        self.popup_open
    }

    /// Style epoch the listeners were last bound for.
    #[must_use]
    pub const fn bound_epoch(&self) -> Option<u64> {
        self.bound_epoch
    }

    /// Bind listeners for `epoch` unless already bound. Returns whether
    /// listeners were attached.
    pub fn bind<E: MapEngine>(&mut self, engine: &mut E, epoch: u64) -> bool {
        if self.bound_epoch == Some(epoch) {
            return false;
        }
        for (layer, event) in BINDINGS {
            engine.listen(layer, event);
        }
        self.bound_epoch = Some(epoch);
        true
    }

    /// Mark listeners bound for an earlier epoch as serving `epoch`.
    ///
    /// Used when a style swap failed and the previous style, with its layers
    /// and listeners, stayed in force.
    pub const fn carry_over(&mut self, epoch: u64) {
        if self.bound_epoch.is_some() {
            self.bound_epoch = Some(epoch);
        }
    }

    /// Close the popup if open. The popup is not part of the style, so a
    /// style swap leaves it on screen unless it is hidden here.
    pub fn dismiss<E: MapEngine>(&mut self, engine: &mut E) {
        if self.popup_open {
            engine.hide_popup();
        }
        self.popup_open = false;
    }

    /// Forget popup state once the engine is gone.
    pub const fn reset(&mut self) {
        self.popup_open = false;
    }

    /// React to one pointer input. Never fails: engine errors are logged and
    /// the input is dropped.
    pub fn handle<E: MapEngine>(
        &mut self,
        engine: &mut E,
        records: &[SchoolRecord],
        input: &PointerInput,
    ) {
        if !engine.has_layer(&input.layer) {
            debug!("ignoring {:?} on missing layer {}", input.event, input.layer);
            return;
        }
        match (input.layer.as_str(), input.event) {
            (CLUSTERS_LAYER, PointerEvent::Enter) => engine.set_cursor(Cursor::Pointer),
            (CLUSTERS_LAYER, PointerEvent::Leave) => engine.set_cursor(Cursor::Default),
            (CLUSTERS_LAYER, PointerEvent::Click) => {
                if let Some(feature) = &input.feature {
                    expand_cluster(engine, feature);
                }
            }
            (UNCLUSTERED_LAYER, PointerEvent::Enter) => {
                engine.set_cursor(Cursor::Pointer);
                if let Some(feature) = &input.feature {
                    engine.show_popup(feature.coordinate, &render_popup(&feature.properties));
                    self.popup_open = true;
                }
            }
            (UNCLUSTERED_LAYER, PointerEvent::Leave) => {
                engine.set_cursor(Cursor::Default);
                if self.popup_open {
                    engine.hide_popup();
                    self.popup_open = false;
                }
            }
            (UNCLUSTERED_LAYER, PointerEvent::Click) => {
                if let Some(feature) = &input.feature {
                    self.select(records, feature);
                }
            }
            (layer, event) => debug!("no handler for {event:?} on {layer}"),
        }
    }

    fn select(&mut self, records: &[SchoolRecord], feature: &RenderedFeature) {
        let Some(id) = feature.properties.get("id").and_then(Value::as_str) else {
            debug!("clicked point has no id");
            return;
        };
        match records.iter().find(|record| record.npsn == id) {
            Some(record) => (self.on_select)(record),
            None => debug!("clicked school {id} is no longer in the record list"),
        }
    }
}

fn expand_cluster<E: MapEngine>(engine: &mut E, feature: &RenderedFeature) {
    let Some(cluster_id) = feature.properties.get("cluster_id").and_then(Value::as_u64) else {
        debug!("clicked cluster has no cluster_id");
        return;
    };
    match engine.cluster_expansion_zoom(SCHOOLS_SOURCE, cluster_id) {
        Ok(zoom) => engine.ease_to(feature.coordinate, zoom),
        Err(err) => warn!("ignoring cluster click: {err}"),
    }
}
