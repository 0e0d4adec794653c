// ── GeoJSON export ──
//
// Flattens route layers and vehicle markers into a single
// FeatureCollection using simplestyle property names, with the viewport
// and tile source carried as a foreign member.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;

use super::layers::RouteLayer;
use super::marker::{VehicleMarker, marker_svg};
use super::{MapView, TILE_ATTRIBUTION};

pub fn export_feature_collection(
    view: &MapView,
    layers: &[RouteLayer],
    markers: &[VehicleMarker],
) -> FeatureCollection {
    let mut features = Vec::new();

    for layer in layers {
        features.extend(layer.styled_features());
    }

    for marker in markers {
        let (lat, lon) = marker.position;
        let mut props = JsonObject::new();
        props.insert("vehicle_id".into(), json!(marker.vehicle_id));
        props.insert("route".into(), json!(marker.label));
        props.insert("title".into(), json!(marker.popup.title));
        props.insert("popup".into(), json!(marker.popup.body));
        props.insert("marker-color".into(), json!(marker.color.css()));
        props.insert("heading".into(), json!(marker.heading));
        props.insert("icon".into(), json!(marker_svg(&marker.color)));

        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![lon, lat]))),
            id: None,
            properties: Some(props),
            foreign_members: None,
        });
    }

    let mut foreign = JsonObject::new();
    foreign.insert(
        "map".into(),
        json!({
            "center": [view.center.0, view.center.1],
            "zoom": view.zoom,
            "tiles": view.tile_template(),
            "attribution": TILE_ATTRIBUTION,
        }),
    );

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::map::{route_layers, vehicle_markers};
    use crate::model::RouteId;
    use crate::test_support::{route, trace, vehicle};

    #[test]
    fn export_contains_traces_markers_and_view() {
        let routes = vec![route(1, "B43", "0C6CB4")];
        let vehicles = vec![vehicle(10, 1, "UMass", "N")];
        let traces = vec![trace(1, "0C6CB4")];

        let layers = route_layers(&traces, &[RouteId(1)]);
        let markers = vehicle_markers(&vehicles, &routes);
        let fc = export_feature_collection(&MapView::default(), &layers, &markers);

        assert_eq!(fc.features.len(), 2);

        let line = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(line["stroke"], "#0C6CB4");
        assert_eq!(line["stroke-opacity"], 0.75);
        assert_eq!(line["route_id"], 1);

        let bus = &fc.features[1];
        let props = bus.properties.as_ref().unwrap();
        assert_eq!(props["title"], "Route B43");
        assert_eq!(props["popup"], "Destination: UMass (N)");
        assert!(props["icon"].as_str().unwrap().starts_with("<?xml"));
        let Value::Point(p) = &bus.geometry.as_ref().unwrap().value else {
            panic!("expected Point");
        };
        assert_eq!(p.len(), 2);
        assert!(p[0] < 0.0, "longitude comes first");

        let map = &fc.foreign_members.as_ref().unwrap()["map"];
        assert_eq!(map["zoom"], 13);
        assert_eq!(map["center"][0], 42.3055);
    }
}
