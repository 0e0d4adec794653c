// ── Route layers ──

use std::borrow::Borrow;
use std::collections::HashMap;

use geojson::{Feature, FeatureCollection, JsonObject};
use serde::Serialize;
use serde_json::json;

use crate::model::{HexColor, RouteId, RouteTrace};

/// Stroke opacity for route overlays.
pub const ROUTE_LAYER_OPACITY: f64 = 0.75;

/// A route trace ready to draw.
#[derive(Debug, Clone, Serialize)]
pub struct RouteLayer {
    pub route_id: RouteId,
    pub color: HexColor,
    pub opacity: f64,
    pub geojson: FeatureCollection,
}

impl RouteLayer {
    pub fn from_trace(trace: &RouteTrace) -> Self {
        Self {
            route_id: trace.route_id,
            color: trace.color.clone(),
            opacity: ROUTE_LAYER_OPACITY,
            geojson: trace.geojson.clone(),
        }
    }

    /// Trace features carrying simplestyle `stroke` properties.
    pub fn styled_features(&self) -> Vec<Feature> {
        self.geojson
            .features
            .iter()
            .map(|feature| {
                let mut f = feature.clone();
                let props = f.properties.get_or_insert_with(JsonObject::new);
                props.insert("route_id".into(), json!(self.route_id));
                props.insert("stroke".into(), json!(self.color.css()));
                props.insert("stroke-opacity".into(), json!(self.opacity));
                f
            })
            .collect()
    }

    /// The styled trace as a standalone document.
    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.styled_features(),
            foreign_members: None,
        }
    }
}

/// One layer per active route that has a loaded trace, in `active` order.
pub fn route_layers(traces: &[impl Borrow<RouteTrace>], active: &[RouteId]) -> Vec<RouteLayer> {
    let by_route: HashMap<RouteId, &RouteTrace> = traces
        .iter()
        .map(|t| {
            let t: &RouteTrace = t.borrow();
            (t.route_id, t)
        })
        .collect();

    active
        .iter()
        .filter_map(|id| by_route.get(id))
        .map(|trace| RouteLayer::from_trace(trace))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::trace;

    #[test]
    fn only_active_routes_are_layered() {
        let traces = vec![trace(1, "FF0000"), trace(2, "00FF00"), trace(3, "0000FF")];
        let layers = route_layers(&traces, &[RouteId(3), RouteId(1), RouteId(9)]);

        let ids: Vec<RouteId> = layers.iter().map(|l| l.route_id).collect();
        assert_eq!(ids, vec![RouteId(3), RouteId(1)]);
        assert!(layers.iter().all(|l| (l.opacity - 0.75).abs() < f64::EPSILON));
        assert_eq!(layers[0].color.as_str(), "0000FF");
    }
}
