//! Declarative map settings owned by the host application.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the supported base map styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MapStyle {
    /// Standard street map.
    #[default]
    #[serde(rename = "mapbox://styles/mapbox/streets-v12")]
    Streets,
    /// Satellite imagery.
    #[serde(rename = "mapbox://styles/mapbox/satellite-v9")]
    Satellite,
    /// Dark theme.
    #[serde(rename = "mapbox://styles/mapbox/dark-v11")]
    Dark,
    /// Light, high-contrast theme.
    #[serde(rename = "mapbox://styles/mapbox/light-v11")]
    Light,
    /// Outdoor map with terrain contours.
    #[serde(rename = "mapbox://styles/mapbox/outdoors-v12")]
    Outdoors,
}

impl MapStyle {
    /// Every supported style.
    pub const ALL: [Self; 5] = [
        Self::Streets,
        Self::Satellite,
        Self::Dark,
        Self::Light,
        Self::Outdoors,
    ];

    /// Style URL understood by the map engine.
    #[must_use]
    pub const fn url(self) -> &'static str {
        match self {
            Self::Streets => "mapbox://styles/mapbox/streets-v12",
            Self::Satellite => "mapbox://styles/mapbox/satellite-v9",
            Self::Dark => "mapbox://styles/mapbox/dark-v11",
            Self::Light => "mapbox://styles/mapbox/light-v11",
            Self::Outdoors => "mapbox://styles/mapbox/outdoors-v12",
        }
    }

    /// Short human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Streets => "Streets",
            Self::Satellite => "Satellite",
            Self::Dark => "Dark",
            Self::Light => "Light",
            Self::Outdoors => "Outdoors",
        }
    }
}

impl fmt::Display for MapStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url())
    }
}

impl FromStr for MapStyle {
    type Err = MapSettingsError;

    /// Accepts either the style URL or its name, ignoring case for names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.url() == s || style.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| MapSettingsError::UnknownStyle { style: s.to_owned() })
    }
}

/// Errors raised while validating [`MapSettings`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapSettingsError {
    /// The style is not one of [`MapStyle::ALL`].
    #[error("unknown map style {style:?}")]
    UnknownStyle {
        /// Rejected style identifier.
        style: String,
    },
    /// The marker scale lies outside `[0.5, 2.0]`.
    #[error("marker scale {value} must be between {min} and {max}")]
    MarkerScaleOutOfRange {
        /// Rejected value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
}

/// Icon scale factor for individual school markers, bounded to `[0.5, 2.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct MarkerScale(f64);

impl MarkerScale {
    /// Smallest accepted scale.
    pub const MIN: f64 = 0.5;
    /// Largest accepted scale.
    pub const MAX: f64 = 2.0;
    /// Scale used when the host does not pick one.
    pub const DEFAULT: Self = Self(0.8);

    /// Validate a scale factor.
    ///
    /// # Errors
    ///
    /// Returns [`MapSettingsError::MarkerScaleOutOfRange`] for values outside
    /// `[0.5, 2.0]` or NaN.
    pub fn new(value: f64) -> Result<Self, MapSettingsError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(MapSettingsError::MarkerScaleOutOfRange {
                value,
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    /// Clamp any value into range; NaN maps to the default.
    #[must_use]
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            Self::DEFAULT
        } else {
            Self(value.clamp(Self::MIN, Self::MAX))
        }
    }

    /// The raw factor.
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl Default for MarkerScale {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for MarkerScale {
    type Error = MapSettingsError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MarkerScale> for f64 {
    fn from(scale: MarkerScale) -> Self {
        scale.0
    }
}

/// Declarative settings passed down to the map adapter on every render.
///
/// # Examples
///
/// ```
/// use sekolah_core::{MapSettings, MapStyle};
///
/// let settings = MapSettings::default().with_style(MapStyle::Dark).with_traffic(true);
/// assert_eq!(settings.style.url(), "mapbox://styles/mapbox/dark-v11");
/// assert!(settings.show_labels);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    /// Base map style.
    pub style: MapStyle,
    /// Show the live traffic overlay.
    pub show_traffic: bool,
    /// Show extruded 3D buildings.
    pub show_3d: bool,
    /// Show the style's text labels.
    pub show_labels: bool,
    /// Icon scale for individual school markers.
    pub marker_scale: MarkerScale,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            style: MapStyle::Streets,
            show_traffic: false,
            show_3d: false,
            show_labels: true,
            marker_scale: MarkerScale::DEFAULT,
        }
    }
}

impl MapSettings {
    /// Set the base style.
    #[must_use]
    pub const fn with_style(mut self, style: MapStyle) -> Self {
        self.style = style;
        self
    }

    /// Toggle the traffic overlay.
    #[must_use]
    pub const fn with_traffic(mut self, show: bool) -> Self {
        self.show_traffic = show;
        self
    }

    /// Toggle 3D buildings.
    #[must_use]
    pub const fn with_3d(mut self, show: bool) -> Self {
        self.show_3d = show;
        self
    }

    /// Toggle style labels.
    #[must_use]
    pub const fn with_labels(mut self, show: bool) -> Self {
        self.show_labels = show;
        self
    }

    /// Set the marker scale.
    #[must_use]
    pub const fn with_marker_scale(mut self, scale: MarkerScale) -> Self {
        self.marker_scale = scale;
        self
    }

    /// Whether any of the overlay toggles differ from `other`.
    #[must_use]
    pub const fn toggles_differ(&self, other: &Self) -> bool {
        self.show_traffic != other.show_traffic
            || self.show_3d != other.show_3d
            || self.show_labels != other.show_labels
    }
}
