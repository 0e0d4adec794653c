// ── KML → GeoJSON conversion ──
//
// InfoPoint publishes route traces as KML. Each `<Placemark>` becomes one
// GeoJSON `Feature`, with geometry, name/description/ExtendedData
// properties, and simplestyle properties resolved from `<Style>` elements.

mod style;

use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use roxmltree::{Document, Node};
use serde_json::Value as JsonValue;
use thiserror::Error;

use self::style::{LocalName, StyleIndex, style_props};

#[derive(Debug, Error)]
pub enum KmlError {
    #[error("malformed KML: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("document root is <{root}>, not <kml>")]
    NotKml { root: String },
}

/// Convert a KML document to a GeoJSON `FeatureCollection`.
pub fn to_geojson(kml: &str) -> Result<FeatureCollection, KmlError> {
    let doc = Document::parse(kml)?;
    let root = doc.root_element();
    if root.tag_name().name() != "kml" {
        return Err(KmlError::NotKml {
            root: root.tag_name().name().to_owned(),
        });
    }

    let styles = StyleIndex::build(&doc);
    let features = root
        .descendants()
        .filter(|n| n.has_tag_name_local("Placemark"))
        .filter_map(|pm| placemark(pm, &styles))
        .collect();

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

// ── Placemarks ─────────────────────────────────────────────────────

fn placemark(pm: Node<'_, '_>, styles: &StyleIndex) -> Option<Feature> {
    let mut geometries = Vec::new();
    collect_geometries(pm, &mut geometries);

    let geometry = match geometries.len() {
        0 => None,
        1 => geometries.pop(),
        _ => Some(Geometry::new(Value::GeometryCollection(geometries))),
    };

    let name = child_text(pm, "name").map(str::trim);
    if geometry.is_none() && name.is_none_or(str::is_empty) {
        return None;
    }

    let mut props = JsonObject::new();
    if let Some(name) = name {
        props.insert("name".into(), name.into());
    }
    if let Some(desc) = child_text(pm, "description") {
        props.insert("description".into(), desc.trim().into());
    }
    extended_data(pm, &mut props);

    if let Some(url) = child_text(pm, "styleUrl").map(str::trim) {
        props.insert("styleUrl".into(), url.into());
        if let Some((id, style)) = styles.resolve(url) {
            props.insert("styleHash".into(), id.into());
            props.extend(style.clone());
        }
    }
    // Inline styles win over shared ones.
    if let Some(inline) = child(pm, "Style") {
        props.extend(style_props(inline));
    }

    Some(Feature {
        bbox: None,
        geometry,
        id: pm.attribute("id").map(|id| Id::String(id.to_owned())),
        properties: Some(props),
        foreign_members: None,
    })
}

fn extended_data(pm: Node<'_, '_>, props: &mut JsonObject) {
    let Some(ext) = child(pm, "ExtendedData") else {
        return;
    };
    for node in ext.descendants() {
        let Some(key) = node.attribute("name") else {
            continue;
        };
        if node.has_tag_name_local("Data") {
            let value = child_text(node, "value").map_or("", str::trim);
            props.insert(key.to_owned(), value.into());
        } else if node.has_tag_name_local("SimpleData") {
            props.insert(key.to_owned(), node.text().unwrap_or("").trim().into());
        }
    }
}

// ── Geometry ───────────────────────────────────────────────────────

/// Walk `node`'s subtree in document order, converting each geometry
/// element. Container elements (`MultiGeometry`, `gx:MultiTrack`) are
/// descended into; everything else is left alone.
fn collect_geometries(node: Node<'_, '_>, out: &mut Vec<Geometry>) {
    for c in node.children().filter(Node::is_element) {
        let value = match c.tag_name().name() {
            "Point" => coords_in(c).into_iter().next().map(Value::Point),
            "LineString" => non_empty(coords_in(c)).map(Value::LineString),
            "LinearRing" => non_empty(coords_in(c)).map(|ring| Value::Polygon(vec![ring])),
            "Polygon" => polygon(c),
            "Track" => non_empty(track_coords(c)).map(Value::LineString),
            "MultiGeometry" | "MultiTrack" => {
                collect_geometries(c, out);
                None
            }
            _ => None,
        };
        if let Some(value) = value {
            out.push(Geometry::new(value));
        }
    }
}

fn polygon(poly: Node<'_, '_>) -> Option<Value> {
    let ring = |boundary: Node<'_, '_>| {
        child(boundary, "LinearRing")
            .map(coords_in)
            .and_then(non_empty)
    };
    let outer = child(poly, "outerBoundaryIs").and_then(ring)?;
    let mut rings = vec![outer];
    rings.extend(
        poly.children()
            .filter(|n| n.has_tag_name_local("innerBoundaryIs"))
            .filter_map(ring),
    );
    Some(Value::Polygon(rings))
}

/// Positions from the `<coordinates>` child of a geometry element.
fn coords_in(geom: Node<'_, '_>) -> Vec<Vec<f64>> {
    child_text(geom, "coordinates").map_or_else(Vec::new, parse_coordinates)
}

/// Parse whitespace-separated `lon,lat[,alt]` tuples. Malformed tuples
/// are skipped.
pub fn parse_coordinates(text: &str) -> Vec<Vec<f64>> {
    text.split_whitespace()
        .filter_map(|tuple| {
            let nums: Vec<f64> = tuple
                .split(',')
                .map(|n| n.trim().parse::<f64>())
                .collect::<Result<_, _>>()
                .ok()?;
            matches!(nums.len(), 2 | 3).then_some(nums)
        })
        .collect()
}

/// `gx:Track` stores positions as `<gx:coord>lon lat alt</gx:coord>`.
fn track_coords(track: Node<'_, '_>) -> Vec<Vec<f64>> {
    track
        .children()
        .filter(|n| n.has_tag_name_local("coord"))
        .filter_map(|n| {
            let nums: Vec<f64> = n
                .text()?
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<Result<_, _>>()
                .ok()?;
            matches!(nums.len(), 2 | 3).then_some(nums)
        })
        .collect()
}

fn non_empty(coords: Vec<Vec<f64>>) -> Option<Vec<Vec<f64>>> {
    (!coords.is_empty()).then_some(coords)
}

// ── Node helpers ───────────────────────────────────────────────────

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name_local(name))
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name).and_then(|n| n.text())
}

// ── Consumers ──────────────────────────────────────────────────────

/// Geographic extent of a set of features.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    /// `(lat, lon)` of the midpoint.
    pub fn center(&self) -> (f64, f64) {
        (
            f64::midpoint(self.min_lat, self.max_lat),
            f64::midpoint(self.min_lon, self.max_lon),
        )
    }

    fn include(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
    }

    /// Grow `self` to cover `other`.
    pub fn union(mut self, other: Bounds) -> Bounds {
        self.include(other.min_lon, other.min_lat);
        self.include(other.max_lon, other.max_lat);
        self
    }
}

/// Bounding box over every position in the collection.
pub fn bounds(fc: &FeatureCollection) -> Option<Bounds> {
    let mut out: Option<Bounds> = None;
    for line in line_strings(fc) {
        for (lon, lat) in line {
            match out.as_mut() {
                Some(b) => b.include(lon, lat),
                None => {
                    out = Some(Bounds {
                        min_lon: lon,
                        min_lat: lat,
                        max_lon: lon,
                        max_lat: lat,
                    });
                }
            }
        }
    }
    out
}

/// Every geometry flattened to `(lon, lat)` polylines, for drawing.
/// Points become single-element lines.
pub fn line_strings(fc: &FeatureCollection) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    for geometry in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
        flatten(&geometry.value, &mut out);
    }
    out
}

fn flatten(value: &Value, out: &mut Vec<Vec<(f64, f64)>>) {
    match value {
        Value::Point(p) => out.push(to_line(std::slice::from_ref(p))),
        Value::MultiPoint(ps) | Value::LineString(ps) => out.push(to_line(ps)),
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            out.extend(lines.iter().map(|l| to_line(l)));
        }
        Value::MultiPolygon(polys) => {
            out.extend(polys.iter().flatten().map(|l| to_line(l)));
        }
        Value::GeometryCollection(geoms) => {
            for g in geoms {
                flatten(&g.value, out);
            }
        }
    }
}

fn to_line(positions: &[Vec<f64>]) -> Vec<(f64, f64)> {
    positions
        .iter()
        .filter_map(|p| Some((*p.first()?, *p.get(1)?)))
        .collect()
}

/// The string value of a feature property.
pub fn property_str<'a>(feature: &'a Feature, key: &str) -> Option<&'a str> {
    feature
        .properties
        .as_ref()
        .and_then(|p| p.get(key))
        .and_then(JsonValue::as_str)
}
