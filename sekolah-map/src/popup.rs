//! Popup markup for a hovered school.

use serde_json::{Map, Value};

/// Placeholder shown for missing values.
const MISSING: &str = "-";

/// Render the popup for a point feature's property bag.
///
/// Shows level, accreditation, name, NPSN, street and district. Missing or
/// empty values render as `-`; everything is HTML-escaped.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use sekolah_map::render_popup;
///
/// let properties = json!({ "id": "20400001", "name": "SD <Satu>" });
/// let html = render_popup(properties.as_object().unwrap_or(&Default::default()));
/// assert!(html.contains("SD &lt;Satu&gt;"));
/// assert!(html.contains("20400001"));
/// ```
#[must_use]
pub fn render_popup(properties: &Map<String, Value>) -> String {
    let field = |key: &str| escape_html(text(properties, key));
    format!(
        concat!(
            "<div class=\"school-popup\">",
            "<div class=\"school-popup__tags\"><span>{level}</span><span>{accreditation}</span></div>",
            "<h3>{name}</h3>",
            "<dl>",
            "<dt>NPSN:</dt><dd>{npsn}</dd>",
            "<dt>Alamat:</dt><dd>{street}</dd>",
            "<dt>Kec:</dt><dd>{district}</dd>",
            "</dl>",
            "</div>"
        ),
        level = field("level"),
        accreditation = field("accreditation"),
        name = field("name"),
        npsn = field("id"),
        street = field("street"),
        district = field("district"),
    )
}

fn text<'a>(properties: &'a Map<String, Value>, key: &str) -> &'a str {
    properties
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(MISSING)
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
