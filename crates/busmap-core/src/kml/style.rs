// ── KML style resolution ──
//
// Shared `<Style id>` and `<StyleMap id>` definitions are indexed once per
// document, then each placemark's `styleUrl` (and any inline `<Style>`) is
// folded into GeoJSON simplestyle properties.

use std::collections::HashMap;

use roxmltree::Node;
use serde_json::{Map, Value};

use super::{child, child_text};

/// Style properties keyed the way simplestyle consumers expect
/// (`stroke`, `stroke-opacity`, `stroke-width`, `fill`, `fill-opacity`, `icon`).
pub(crate) type StyleProps = Map<String, Value>;

#[derive(Debug, Default)]
pub(crate) struct StyleIndex {
    styles: HashMap<String, StyleProps>,
    /// StyleMap id → id of its `normal` style.
    maps: HashMap<String, String>,
}

impl StyleIndex {
    pub(crate) fn build(doc: &roxmltree::Document<'_>) -> Self {
        let mut index = Self::default();
        for node in doc.descendants().filter(Node::is_element) {
            let Some(id) = node.attribute("id") else {
                continue;
            };
            match node.tag_name().name() {
                "Style" => {
                    index.styles.insert(id.to_owned(), style_props(node));
                }
                "StyleMap" => {
                    let normal = node
                        .children()
                        .filter(|n| n.has_tag_name_local("Pair"))
                        .find(|pair| child_text(*pair, "key") == Some("normal"))
                        .and_then(|pair| child_text(pair, "styleUrl"));
                    if let Some(url) = normal {
                        index
                            .maps
                            .insert(id.to_owned(), url.trim_start_matches('#').to_owned());
                    }
                }
                _ => {}
            }
        }
        index
    }

    /// Resolve a `styleUrl` to `(style id, properties)`.
    pub(crate) fn resolve(&self, url: &str) -> Option<(&str, &StyleProps)> {
        let id = url.trim().rsplit('#').next()?;
        if let Some((key, props)) = self.styles.get_key_value(id) {
            return Some((key.as_str(), props));
        }
        let target = self.maps.get(id)?;
        self.styles
            .get_key_value(target.as_str())
            .map(|(key, props)| (key.as_str(), props))
    }
}

/// Simplestyle properties from a single `<Style>` element.
pub(crate) fn style_props(style: Node<'_, '_>) -> StyleProps {
    let mut props = StyleProps::new();

    if let Some(line) = child(style, "LineStyle") {
        if let Some((hex, opacity)) = child_text(line, "color").and_then(kml_color) {
            props.insert("stroke".into(), Value::String(hex));
            props.insert("stroke-opacity".into(), number(opacity));
        }
        if let Some(width) = child_text(line, "width").and_then(|w| w.trim().parse::<f64>().ok()) {
            props.insert("stroke-width".into(), number(width));
        }
    }

    if let Some(poly) = child(style, "PolyStyle") {
        if let Some((hex, opacity)) = child_text(poly, "color").and_then(kml_color) {
            props.insert("fill".into(), Value::String(hex));
            props.insert("fill-opacity".into(), number(opacity));
        }
    }

    if let Some(href) = child(style, "IconStyle")
        .and_then(|icon_style| child(icon_style, "Icon"))
        .and_then(|icon| child_text(icon, "href"))
    {
        props.insert("icon".into(), Value::String(href.trim().to_owned()));
    }

    props
}

/// KML colors are `aabbggrr`. Returns `("#rrggbb", alpha / 255)`.
/// Six-digit values are read as `bbggrr` with full opacity.
pub(crate) fn kml_color(raw: &str) -> Option<(String, f64)> {
    let raw = raw.trim().trim_start_matches('#');
    if !raw.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let (alpha, bgr) = match raw.len() {
        8 => (u8::from_str_radix(raw.get(0..2)?, 16).ok()?, raw.get(2..8)?),
        6 => (u8::MAX, raw),
        _ => return None,
    };
    let (b, g, r) = (bgr.get(0..2)?, bgr.get(2..4)?, bgr.get(4..6)?);
    let hex = format!("#{r}{g}{b}").to_ascii_lowercase();
    let opacity = (f64::from(alpha) / 255.0 * 100.0).round() / 100.0;
    Some((hex, opacity))
}

fn number(n: f64) -> Value {
    serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
}

/// Local-name matching that ignores namespace prefixes (`gx:Track` → `Track`).
pub(crate) trait LocalName {
    fn has_tag_name_local(&self, name: &str) -> bool;
}

impl LocalName for Node<'_, '_> {
    fn has_tag_name_local(&self, name: &str) -> bool {
        self.is_element() && self.tag_name().name() == name
    }
}
