//! School records as served by the external schools REST API.
//!
//! Field names follow the upstream JSON payload (`nama`, `bentuk_pendidikan`,
//! `lokasi`, ...) on the wire while exposing English names in Rust. Every
//! field tolerates `null` or omission, and a coordinate that is not a JSON
//! number decodes as absent, so a record with a broken location still loads
//! and is dropped later when features are built.

use geo::Coord;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept any JSON value for a coordinate component; only numbers count.
fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_f64))
}

/// A school in the national dataset, keyed by its NPSN.
///
/// # Examples
///
/// ```
/// use sekolah_core::SchoolRecord;
///
/// let record: SchoolRecord = serde_json::from_str(
///     r#"{"npsn": "20403322", "nama": "SMA Negeri 1", "lokasi": [{"bujur": 110.37, "lintang": -7.8}]}"#,
/// )?;
/// assert_eq!(record.name, "SMA Negeri 1");
/// assert!(record.coordinate().is_some());
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchoolRecord {
    /// National school identification number; unique per record.
    #[serde(default, deserialize_with = "null_as_default")]
    pub npsn: String,
    /// Display name.
    #[serde(rename = "nama", default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Education level (`SD`, `SMP`, `SMA`, `SMK`, ...).
    #[serde(
        rename = "bentuk_pendidikan",
        default,
        deserialize_with = "null_as_default"
    )]
    pub level: String,
    /// Formal or non-formal education pathway.
    #[serde(
        rename = "jalur_pendidikan",
        default,
        deserialize_with = "null_as_default"
    )]
    pub pathway: String,
    /// Education stage (`Dikdas`, `Dikmen`, ...).
    #[serde(
        rename = "jenjang_pendidikan",
        default,
        deserialize_with = "null_as_default"
    )]
    pub stage: String,
    /// Supervising ministry.
    #[serde(
        rename = "kementerian_pembina",
        default,
        deserialize_with = "null_as_default"
    )]
    pub ministry: String,
    /// Public or private status (`NEGERI` / `SWASTA`).
    #[serde(
        rename = "status_satuan_pendidikan",
        default,
        deserialize_with = "null_as_default"
    )]
    pub status: String,
    /// Accreditation grade.
    #[serde(rename = "akreditasi", default, deserialize_with = "null_as_default")]
    pub accreditation: String,
    /// Education type (general, vocational, ...).
    #[serde(
        rename = "jenis_pendidikan",
        default,
        deserialize_with = "null_as_default"
    )]
    pub kind: String,
    /// Address entries; the first one is authoritative.
    #[serde(rename = "alamat", default, deserialize_with = "null_as_default")]
    pub addresses: Vec<Address>,
    /// Contact entries; the first one is authoritative.
    #[serde(rename = "kontak", default, deserialize_with = "null_as_default")]
    pub contacts: Vec<Contact>,
    /// Geolocation entries; the first one is authoritative.
    #[serde(rename = "lokasi", default, deserialize_with = "null_as_default")]
    pub locations: Vec<Location>,
}

impl SchoolRecord {
    /// The first address entry, if any.
    #[must_use]
    pub fn address(&self) -> Option<&Address> {
        self.addresses.first()
    }

    /// The first contact entry, if any.
    #[must_use]
    pub fn contact(&self) -> Option<&Contact> {
        self.contacts.first()
    }

    /// Position of the school as `x = longitude`, `y = latitude`.
    ///
    /// Returns `None` when the first location entry is missing or lacks either
    /// component. `(0, 0)` is a valid position.
    #[must_use]
    pub fn coordinate(&self) -> Option<Coord<f64>> {
        self.locations.first().and_then(Location::coordinate)
    }
}

/// Postal and administrative address of a school.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Address {
    /// Neighbourhood unit (RT).
    #[serde(default)]
    pub rt: Option<i64>,
    /// Community unit (RW).
    #[serde(default)]
    pub rw: Option<i64>,
    /// Owning school's NPSN.
    #[serde(default, deserialize_with = "null_as_default")]
    pub npsn: String,
    /// Street line.
    #[serde(rename = "jalan", default, deserialize_with = "null_as_default")]
    pub street: String,
    /// Village name.
    #[serde(rename = "nama_desa", default, deserialize_with = "null_as_default")]
    pub village: String,
    /// Hamlet name.
    #[serde(rename = "nama_dusun", default, deserialize_with = "null_as_default")]
    pub hamlet: String,
    /// Country name.
    #[serde(rename = "nama_negara", default, deserialize_with = "null_as_default")]
    pub country: String,
    /// Administrative region code.
    #[serde(rename = "kode_wilayah", default, deserialize_with = "null_as_default")]
    pub region_code: String,
    /// Province code.
    #[serde(rename = "kode_provinsi", default, deserialize_with = "null_as_default")]
    pub province_code: String,
    /// Province name.
    #[serde(rename = "nama_provinsi", default, deserialize_with = "null_as_default")]
    pub province: String,
    /// Regency (kabupaten) code.
    #[serde(rename = "kode_kabupaten", default, deserialize_with = "null_as_default")]
    pub regency_code: String,
    /// District (kecamatan) code.
    #[serde(rename = "kode_kecamatan", default, deserialize_with = "null_as_default")]
    pub district_code: String,
    /// Regency (kabupaten) name.
    #[serde(rename = "nama_kabupaten", default, deserialize_with = "null_as_default")]
    pub regency: String,
    /// District (kecamatan) name.
    #[serde(rename = "nama_kecamatan", default, deserialize_with = "null_as_default")]
    pub district: String,
}

/// Contact details of a school.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contact {
    /// Owning school's NPSN.
    #[serde(default, deserialize_with = "null_as_default")]
    pub npsn: String,
    /// Email address.
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    /// Website URL.
    #[serde(default, deserialize_with = "null_as_default")]
    pub website: String,
    /// Fax number.
    #[serde(rename = "nomor_fax", default, deserialize_with = "null_as_default")]
    pub fax: String,
    /// Telephone number.
    #[serde(rename = "nomor_telepon", default, deserialize_with = "null_as_default")]
    pub phone: String,
}

/// A geolocation entry. Either component may be absent in upstream data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    /// Owning school's NPSN.
    #[serde(default, deserialize_with = "null_as_default")]
    pub npsn: String,
    /// Longitude (`bujur`).
    #[serde(rename = "bujur", default, deserialize_with = "lenient_coordinate")]
    pub longitude: Option<f64>,
    /// Latitude (`lintang`).
    #[serde(rename = "lintang", default, deserialize_with = "lenient_coordinate")]
    pub latitude: Option<f64>,
}

impl Location {
    /// Build a location with both components present.
    #[must_use]
    pub fn at(longitude: f64, latitude: f64) -> Self {
        Self {
            npsn: String::new(),
            longitude: Some(longitude),
            latitude: Some(latitude),
        }
    }

    /// Both components as a coordinate, or `None` if either is missing.
    #[must_use]
    pub const fn coordinate(&self) -> Option<Coord<f64>> {
        match (self.longitude, self.latitude) {
            (Some(x), Some(y)) => Some(Coord { x, y }),
            _ => None,
        }
    }
}

/// Envelope returned by the list and filter endpoints: `{ total, data }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchoolPage {
    /// Total number of matching schools reported by the backend.
    #[serde(default)]
    pub total: u64,
    /// The schools in this page.
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<SchoolRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn decodes_upstream_field_names() {
        let json = r#"{
            "npsn": "20400001",
            "nama": "SD Negeri Demangan",
            "bentuk_pendidikan": "SD",
            "status_satuan_pendidikan": "NEGERI",
            "akreditasi": "A",
            "alamat": [{"jalan": "Jl. Gayam", "nama_kecamatan": "Gondokusuman", "nama_kabupaten": "Kota Yogyakarta", "rt": 3}],
            "kontak": [{"email": "sd@example.id", "nomor_telepon": "0274"}],
            "lokasi": [{"npsn": "20400001", "bujur": 110.38, "lintang": -7.79}]
        }"#;

        let record: SchoolRecord = serde_json::from_str(json).expect("should decode");

        assert_eq!(record.level, "SD");
        assert_eq!(record.accreditation, "A");
        let address = record.address().expect("address present");
        assert_eq!(address.district, "Gondokusuman");
        assert_eq!(address.rt, Some(3));
        assert_eq!(record.contact().map(|c| c.phone.as_str()), Some("0274"));
        assert_eq!(record.coordinate(), Some(Coord { x: 110.38, y: -7.79 }));
    }

    #[rstest]
    fn tolerates_nulls_and_missing_fields() {
        let json = r#"{"npsn": "B", "nama": null, "alamat": null, "lokasi": [{}]}"#;

        let record: SchoolRecord = serde_json::from_str(json).expect("should decode");

        assert!(record.name.is_empty());
        assert!(record.addresses.is_empty());
        assert_eq!(record.locations.len(), 1);
        assert_eq!(record.coordinate(), None);
    }

    #[rstest]
    #[case(Some(110.0), None)]
    #[case(None, Some(-7.0))]
    #[case(None, None)]
    fn partial_locations_have_no_coordinate(
        #[case] longitude: Option<f64>,
        #[case] latitude: Option<f64>,
    ) {
        let location = Location {
            longitude,
            latitude,
            ..Location::default()
        };
        assert_eq!(location.coordinate(), None);
    }

    #[rstest]
    fn zero_is_a_valid_coordinate() {
        assert_eq!(Location::at(0.0, 0.0).coordinate(), Some(Coord { x: 0.0, y: 0.0 }));
    }

    #[rstest]
    fn decodes_page_envelope() {
        let page: SchoolPage =
            serde_json::from_str(r#"{"total": 2, "data": [{"npsn": "A"}, {"npsn": "B"}]}"#)
                .expect("should decode");
        assert_eq!(page.total, 2);
        assert_eq!(page.data.len(), 2);
    }

    #[rstest]
    #[case::string(r#""110.4""#)]
    #[case::boolean("true")]
    #[case::object(r#"{"deg": 110}"#)]
    fn mistyped_coordinate_keeps_the_page(#[case] longitude: &str) {
        let json = format!(
            r#"{{"total": 2, "data": [
                {{"npsn": "A", "lokasi": [{{"bujur": 110.37, "lintang": -7.8}}]}},
                {{"npsn": "B", "lokasi": [{{"bujur": {longitude}, "lintang": -7.7}}]}}
            ]}}"#
        );

        let page: SchoolPage = serde_json::from_str(&json).expect("page should decode");

        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].coordinate(), Some(Coord { x: 110.37, y: -7.8 }));
        assert_eq!(page.data[1].coordinate(), None);
        assert_eq!(page.data[1].locations[0].latitude, Some(-7.7));
        let collection = crate::build_feature_collection(&page.data);
        assert_eq!(collection.len(), 1);
    }
}
