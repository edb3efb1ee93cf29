//! Test helpers for writing schools payloads to a scratch directory.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write fixture file");
}

pub(super) fn scratch_dir() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

/// A raw API record; `coordinate` of `None` leaves `lokasi` empty.
pub(super) fn school_json(
    npsn: &str,
    name: &str,
    level: &str,
    regency: &str,
    coordinate: Option<(f64, f64)>,
) -> Value {
    let lokasi = coordinate.map_or_else(Vec::new, |(lon, lat)| {
        vec![json!({ "npsn": npsn, "bujur": lon, "lintang": lat })]
    });
    json!({
        "npsn": npsn,
        "nama": name,
        "bentuk_pendidikan": level,
        "status_satuan_pendidikan": "NEGERI",
        "akreditasi": "A",
        "alamat": [{ "jalan": "Jl. Malioboro", "nama_kecamatan": "Gondomanan", "nama_kabupaten": regency }],
        "lokasi": lokasi,
    })
}

pub(super) fn sample_records() -> Vec<Value> {
    vec![
        school_json(
            "20400001",
            "SD Negeri Demangan",
            "SD",
            "Kota Yogyakarta",
            Some((110.38, -7.79)),
        ),
        school_json(
            "20400002",
            "SMP Negeri 5 Yogyakarta",
            "SMP",
            "Kota Yogyakarta",
            Some((110.37, -7.78)),
        ),
        school_json("20400003", "SMA Negeri 1 Sleman", "SMA", "Sleman", Some((110.35, -7.71))),
        school_json("20400004", "SD Tanpa Lokasi", "SD", "Bantul", None),
    ]
}
