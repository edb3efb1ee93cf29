//! Camera bounds for a feature collection.

use geo::{BoundingRect, MultiPoint, Point, Rect};

use crate::FeatureCollection;

/// Only this many leading features are considered when fitting bounds.
pub const MAX_BOUNDS_POINTS: usize = 10_000;

/// Padding, in pixels, applied when the camera is fitted to data.
pub const FIT_BOUNDS_PADDING: u32 = 50;

/// Bounding rectangle of the first [`MAX_BOUNDS_POINTS`] features.
///
/// Returns `None` for an empty collection. A single feature yields a
/// degenerate rectangle whose corners coincide.
///
/// # Examples
///
/// ```
/// use sekolah_core::{Location, SchoolRecord, build_feature_collection, feature_bounds};
///
/// let records: Vec<_> = [(110.0, -8.0), (111.0, -7.0)]
///     .into_iter()
///     .map(|(x, y)| SchoolRecord {
///         locations: vec![Location::at(x, y)],
///         ..SchoolRecord::default()
///     })
///     .collect();
///
/// let bounds = feature_bounds(&build_feature_collection(&records)).expect("non-empty");
/// assert_eq!(bounds.min().x, 110.0);
/// assert_eq!(bounds.max().y, -7.0);
/// ```
#[must_use]
pub fn feature_bounds(collection: &FeatureCollection) -> Option<Rect<f64>> {
    let points: MultiPoint<f64> = collection
        .iter()
        .take(MAX_BOUNDS_POINTS)
        .map(|feature| Point::from(feature.coordinate()))
        .collect();
    points.bounding_rect()
}
