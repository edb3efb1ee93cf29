//! Map layer synchronisation for the school dashboard.
//!
//! [`MapEngineAdapter`] owns one mapping-engine instance and keeps its
//! sources, layers and icons in step with the declarative [`MapProps`] the
//! host passes on every render. [`ClusterInteractionHandler`] turns pointer
//! input on the cluster and point layers into cursor feedback, camera moves,
//! popups and selection callbacks.

#![forbid(unsafe_code)]

pub mod adapter;
pub mod config;
pub mod interaction;
pub mod layers;
pub mod popup;

pub use adapter::{
    EngineHandle, ICON_SETTLE_DELAY, INITIAL_CENTER, INITIAL_ZOOM, Lifecycle, MapEngineAdapter,
    MapProps,
};
pub use config::{ACCESS_TOKEN_ENV, MapConfig};
pub use interaction::ClusterInteractionHandler;
pub use popup::render_popup;
