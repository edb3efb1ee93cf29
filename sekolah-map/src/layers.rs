//! Source and layer definitions the adapter registers with the engine.

use sekolah_core::{
    ClusterOptions, EducationLevel, FeatureCollection, IconImage, LayerKind, LayerSpec,
    MarkerScale, SourceSpec, StyleLayer,
};
use serde_json::{Value, json};

/// GeoJSON source holding the school features.
pub const SCHOOLS_SOURCE: &str = "schools";
/// Circle layer drawing clusters.
pub const CLUSTERS_LAYER: &str = "clusters";
/// Symbol layer printing cluster sizes.
pub const CLUSTER_COUNT_LAYER: &str = "cluster-count";
/// Symbol layer drawing individual schools.
pub const UNCLUSTERED_LAYER: &str = "unclustered-point";
/// Vector source and line layer for live traffic.
pub const TRAFFIC_SOURCE: &str = "traffic";
/// Line layer coloured by congestion.
pub const TRAFFIC_LAYER: &str = "traffic";
/// Tileset backing [`TRAFFIC_SOURCE`].
pub const TRAFFIC_TILESET_URL: &str = "mapbox://mapbox.mapbox-traffic-v1";
/// Extruded building layer.
pub const BUILDINGS_LAYER: &str = "3d-buildings";
/// Style source carrying building footprints.
pub const BUILDINGS_SOURCE: &str = "composite";
/// Highest zoom at which schools are clustered.
pub const CLUSTER_MAX_ZOOM: u8 = 14;
/// Cluster radius in pixels.
pub const CLUSTER_RADIUS: u16 = 50;

/// Layers drawn from the schools source, in registration order.
pub const SCHOOL_LAYERS: [&str; 3] = [CLUSTERS_LAYER, CLUSTER_COUNT_LAYER, UNCLUSTERED_LAYER];

/// Whether `id` names a layer the adapter owns rather than the base style.
#[must_use]
pub fn is_own_layer(id: &str) -> bool {
    SCHOOL_LAYERS.contains(&id) || id == TRAFFIC_LAYER || id == BUILDINGS_LAYER
}

/// Clustered GeoJSON source seeded with `data`.
#[must_use]
pub fn schools_source(data: &FeatureCollection) -> SourceSpec {
    SourceSpec::GeoJson {
        data: data.clone(),
        cluster: Some(ClusterOptions {
            max_zoom: CLUSTER_MAX_ZOOM,
            radius: CLUSTER_RADIUS,
        }),
    }
}

/// Definitions of the three school layers using `scale` for point icons.
#[must_use]
pub fn school_layers(scale: MarkerScale) -> [LayerSpec; 3] {
    [cluster_layer(), cluster_count_layer(), unclustered_layer(scale)]
}

fn cluster_layer() -> LayerSpec {
    LayerSpec::new(CLUSTERS_LAYER, LayerKind::Circle, SCHOOLS_SOURCE)
        .with_filter(json!(["has", "point_count"]))
        .with_paint(
            "circle-color",
            json!(["step", ["get", "point_count"], "#51bbd6", 100, "#f1f075", 750, "#f28cb1"]),
        )
        .with_paint(
            "circle-radius",
            json!(["step", ["get", "point_count"], 20, 100, 30, 750, 40]),
        )
}

fn cluster_count_layer() -> LayerSpec {
    LayerSpec::new(CLUSTER_COUNT_LAYER, LayerKind::Symbol, SCHOOLS_SOURCE)
        .with_filter(json!(["has", "point_count"]))
        .with_layout("text-field", json!(["get", "point_count_abbreviated"]))
        .with_layout(
            "text-font",
            json!(["DIN Offc Pro Medium", "Arial Unicode MS Bold"]),
        )
        .with_layout("text-size", json!(12))
}

fn unclustered_layer(scale: MarkerScale) -> LayerSpec {
    LayerSpec::new(UNCLUSTERED_LAYER, LayerKind::Symbol, SCHOOLS_SOURCE)
        .with_filter(json!(["!", ["has", "point_count"]]))
        .with_layout("icon-image", icon_expression())
        .with_layout("icon-size", json!(scale.get()))
        .with_layout("icon-allow-overlap", json!(true))
}

/// `match` expression picking the icon for a feature's `level` property.
fn icon_expression() -> Value {
    let mut expression = vec![json!("match"), json!(["upcase", ["get", "level"]])];
    for level in EducationLevel::ALL {
        if level != EducationLevel::Other {
            expression.push(json!(level.label()));
            expression.push(json!(level.icon_name()));
        }
    }
    expression.push(json!(EducationLevel::Other.icon_name()));
    Value::Array(expression)
}

/// One icon per education-level category, the default last.
#[must_use]
pub fn level_icons() -> Vec<IconImage> {
    EducationLevel::ALL
        .into_iter()
        .map(|level| IconImage {
            name: level.icon_name().to_owned(),
            colour: level.colour().to_owned(),
        })
        .collect()
}

/// Vector source for [`TRAFFIC_LAYER`].
#[must_use]
pub fn traffic_source() -> SourceSpec {
    SourceSpec::Vector {
        url: TRAFFIC_TILESET_URL.to_owned(),
    }
}

/// Line layer coloured by the `congestion` property.
#[must_use]
pub fn traffic_layer() -> LayerSpec {
    LayerSpec::new(TRAFFIC_LAYER, LayerKind::Line, TRAFFIC_SOURCE)
        .with_source_layer("traffic")
        .with_paint("line-width", json!(2))
        .with_paint(
            "line-color",
            json!([
                "match",
                ["get", "congestion"],
                "low",
                "#4CC24A",
                "moderate",
                "#FFAD33",
                "heavy",
                "#E63946",
                "severe",
                "#801A26",
                "#000000"
            ]),
        )
}

/// Extruded buildings from the style's `composite` source, shown from zoom
/// 15.
#[must_use]
pub fn buildings_layer() -> LayerSpec {
    let ramp = |property: &str| {
        json!(["interpolate", ["linear"], ["zoom"], 15, 0, 15.05, ["get", property]])
    };
    LayerSpec::new(BUILDINGS_LAYER, LayerKind::FillExtrusion, BUILDINGS_SOURCE)
        .with_source_layer("building")
        .with_filter(json!(["==", "extrude", "true"]))
        .with_min_zoom(15.0)
        .with_paint("fill-extrusion-color", json!("#aaa"))
        .with_paint("fill-extrusion-height", ramp("height"))
        .with_paint("fill-extrusion-base", ramp("min_height"))
        .with_paint("fill-extrusion-opacity", json!(0.6))
}

/// First symbol layer of the base style, below which 3D buildings go.
#[must_use]
pub fn first_style_symbol(layers: &[StyleLayer]) -> Option<&str> {
    layers
        .iter()
        .find(|layer| layer.kind == LayerKind::Symbol && !is_own_layer(&layer.id))
        .map(|layer| layer.id.as_str())
}

/// Base-style symbol layers whose visibility follows the labels toggle.
pub fn label_layers(layers: &[StyleLayer]) -> impl Iterator<Item = &str> {
    layers
        .iter()
        .filter(|layer| layer.kind == LayerKind::Symbol && !is_own_layer(&layer.id))
        .map(|layer| layer.id.as_str())
}

/// Layout value for the `visibility` property.
#[must_use]
pub fn visibility(visible: bool) -> Value {
    json!(if visible { "visible" } else { "none" })
}
