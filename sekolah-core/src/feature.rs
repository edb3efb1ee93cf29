//! Convert school records into a GeoJSON point feature collection.
//!
//! The collection is derived data: it is rebuilt wholesale whenever the
//! record list changes and never patched in place. Records without a usable
//! coordinate are dropped silently.

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::SchoolRecord;

/// Denormalised property bag attached to every point feature.
///
/// Missing address data yields empty strings rather than absent keys so that
/// map expressions such as `["get", "level"]` always resolve.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureProperties {
    /// NPSN of the source record.
    pub id: String,
    /// School name.
    pub name: String,
    /// Education level label.
    pub level: String,
    /// Accreditation grade.
    pub accreditation: String,
    /// Public/private status.
    pub status: String,
    /// Street line of the first address.
    pub street: String,
    /// District (kecamatan) of the first address.
    pub district: String,
    /// Regency (kabupaten) of the first address.
    pub regency: String,
}

/// GeoJSON `Point` geometry; coordinates are `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Point")]
pub struct PointGeometry {
    /// `[longitude, latitude]`.
    pub coordinates: [f64; 2],
}

/// A GeoJSON `Feature` with point geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct PointFeature {
    /// Feature geometry.
    pub geometry: PointGeometry,
    /// Property bag.
    pub properties: FeatureProperties,
}

impl PointFeature {
    /// Derive a feature from a record, or `None` when it has no coordinate.
    #[must_use]
    pub fn from_record(record: &SchoolRecord) -> Option<Self> {
        let coordinate = record.coordinate()?;
        let (street, district, regency) = record.address().map_or_else(Default::default, |a| {
            (a.street.clone(), a.district.clone(), a.regency.clone())
        });
        Some(Self {
            geometry: PointGeometry {
                coordinates: [coordinate.x, coordinate.y],
            },
            properties: FeatureProperties {
                id: record.npsn.clone(),
                name: record.name.clone(),
                level: record.level.clone(),
                accreditation: record.accreditation.clone(),
                status: record.status.clone(),
                street,
                district,
                regency,
            },
        })
    }

    /// Position as `x = longitude`, `y = latitude`.
    #[must_use]
    pub const fn coordinate(&self) -> Coord<f64> {
        let [x, y] = self.geometry.coordinates;
        Coord { x, y }
    }
}

/// A GeoJSON `FeatureCollection` of school points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    /// Features in input order.
    pub features: Vec<PointFeature>,
}

impl FeatureCollection {
    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection holds no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate over the features in order.
    pub fn iter(&self) -> std::slice::Iter<'_, PointFeature> {
        self.features.iter()
    }
}

impl FromIterator<PointFeature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = PointFeature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a PointFeature;
    type IntoIter = std::slice::Iter<'a, PointFeature>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Build the feature collection for `records`.
///
/// A record is included iff its first geolocation entry carries both
/// coordinate components. Order is preserved and records sharing a position
/// stay separate features.
///
/// # Examples
///
/// ```
/// use sekolah_core::{Location, SchoolRecord, build_feature_collection};
///
/// let records = vec![
///     SchoolRecord {
///         npsn: "A".into(),
///         locations: vec![Location::at(110.37, -7.80)],
///         ..SchoolRecord::default()
///     },
///     SchoolRecord {
///         npsn: "B".into(),
///         locations: vec![Location::default()],
///         ..SchoolRecord::default()
///     },
/// ];
///
/// let collection = build_feature_collection(&records);
/// assert_eq!(collection.len(), 1);
/// assert_eq!(collection.features[0].properties.id, "A");
/// ```
#[must_use]
pub fn build_feature_collection(records: &[SchoolRecord]) -> FeatureCollection {
    let collection: FeatureCollection = records.iter().filter_map(PointFeature::from_record).collect();
    let dropped = records.len().saturating_sub(collection.len());
    if dropped > 0 {
        log::debug!(
            "dropped {dropped} of {} school records without coordinates",
            records.len()
        );
    }
    collection
}
