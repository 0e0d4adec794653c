// ── Vehicle markers ──
//
// Each vehicle is drawn as a round badge in its route color with a white
// bus glyph, and carries a two-line popup.

use std::borrow::Borrow;
use std::collections::HashMap;

use serde::Serialize;

use crate::model::{HexColor, Route, RouteId, Vehicle, VehicleId};

/// Marker edge length in pixels.
pub const MARKER_SIZE: u32 = 32;

const BUS_BODY_PATH: &str = concat!(
    "M 181.90658,156.87997 L 199.69048,87.742095 L 239.02341,48.030315 L 435.0703,48.779593 L ",
    "466.25966,87.366615 L 488.4373,162.1708 L 491.64086,357.52393 L 182.11301,346.92699 L ",
    "181.90658,156.87997 z",
);

const BUS_GLYPH_PATH: &str = concat!(
    "M 202.01059,454.26396 C 197.46571,452.29841 192.38292,447.38175 189.70017,442.3559 C ",
    "187.79829,438.79293 187.52377,436.38928 187.18755,420.3559 C 186.93398,408.26407 ",
    "186.4327,402.11475 185.66034,401.62121 C 185.02798,401.21713 178.30984,400.87963 ",
    "170.73116,400.87121 L 156.95172,400.8559 L 157.2491,307.1059 L 157.54647,213.3559 L ",
    "166.23798,148.3559 C 171.01831,112.60589 175.61666,81.072565 176.45653,78.281827 C ",
    "178.70708,70.803695 185.09525,61.612719 191.69715,56.354401 C 198.45661,50.970581 ",
    "216.01208,42.213898 227.51059,38.490621 C 238.1229,35.054301 257.3769,30.481709 ",
    "274.0106,27.447426 C 319.12791,19.217227 355.97667,19.638876 403.63238,28.930646 C ",
    "458.12668,39.555785 485.32634,54.264678 492.97337,77.244009 C 494.35387,81.392425 ",
    "497.85124,105.12601 503.52447,148.84517 L 512.0106,214.24105 L 512.0106,307.54847 L ",
    "512.0106,400.8559 L 498.7606,400.87121 C 491.4731,400.87963 484.99393,401.21713 ",
    "484.36245,401.62121 C 483.5971,402.11095 483.0775,408.19046 482.80396,419.8559 C ",
    "482.32844,440.13576 481.35222,443.62475 474.45466,449.69623 C 461.18568,461.37605 ",
    "437.92939,455.87901 433.15203,439.93362 C 432.50229,437.76496 432.0106,429.20471 ",
    "432.0106,420.06131 C 432.0106,406.79232 431.7373,403.72546 430.43917,402.42733 C ",
    "429.03292,401.02108 419.00194,400.8559 335.0106,400.8559 C 251.01925,400.8559 ",
    "240.98827,401.02108 239.58202,402.42733 C 238.27993,403.72942 238.00892,406.8574 ",
    "238.00082,420.67733 C 237.99179,436.10816 237.81466,437.72995 235.63317,442.3559 C ",
    "232.82337,448.31421 230.05834,451.03008 224.01059,453.77187 C 218.49991,456.27017 ",
    "207.23228,456.5222 202.01059,454.26396 z M 221.1008,342.48478 C 230.56636,339.10128 ",
    "237.15345,329.70599 237.15345,319.58859 C 237.15345,305.51821 226.64693,294.8559 ",
    "212.78213,294.8559 C 205.89115,294.8559 201.72608,296.41078 196.62895,300.88612 C ",
    "190.80777,305.99719 188.56999,311.1258 188.56999,319.3559 C 188.56999,327.12989 ",
    "190.63735,332.28185 195.66901,337.04695 C 202.11812,343.15442 212.82365,345.44348 ",
    "221.1008,342.48478 z M 468.07442,341.1059 C 486.14906,331.93932 486.14906,306.77248 ",
    "468.07442,297.6059 C 455.26759,291.1109 439.75171,296.7281 434.23734,309.8559 C ",
    "431.9951,315.19388 432.33827,324.8356 434.96351,330.25862 C 440.85625,342.43139 ",
    "455.80462,347.32854 468.07442,341.1059 z M 470.07207,231.84424 C 473.00601,231.28783 ",
    "476.4168,229.88347 477.6516,228.72344 C 480.13084,226.39431 482.04588,219.01784 ",
    "481.38161,214.3559 C 481.14651,212.7059 477.84734,189.01023 474.05013,161.69886 C ",
    "466.94051,110.56314 466.17051,107.02111 461.18321,102.51081 C 456.03659,97.856439 ",
    "458.4826,97.946323 335.70342,97.899788 C 252.63003,97.868302 218.62464,98.176084 ",
    "215.39755,98.988675 C 209.50844,100.47157 205.39381,104.70397 203.55037,111.17496 C ",
    "201.07489,119.86455 187.85881,217.52991 188.61381,221.55443 C 189.61644,226.8989 ",
    "193.81395,231.03721 199.09935,231.89208 C 206.2682,233.05159 463.94563,233.0061 ",
    "470.07207,231.84424 z M 410.5106,75.881391 C 415.12597,74.812019 417.68374,72.115112 ",
    "418.57173,67.38176 C 419.36445,63.156189 416.82495,57.547966 413.41536,55.994452 C ",
    "411.6147,55.17402 389.48487,54.862108 334.21355,54.878131 C 263.04857,54.898761 ",
    "257.3566,55.025112 255.37764,56.628131 C 250.66932,60.442017 249.73812,66.256675 ",
    "252.98332,71.579058 C 254.15373,73.498638 256.07332,75.050672 257.72958,75.416529 C ",
    "259.25914,75.754398 260.9606,76.180949 261.5106,76.364419 C 263.95909,77.181189 ",
    "406.90068,76.717802 410.5106,75.881391 z",
);

/// The bus marker as a standalone SVG document, filled with `color`.
pub fn marker_svg(color: &HexColor) -> String {
    let fill = color.css();
    format!(
        concat!(
            r#"<?xml version="1.0" ?>"#,
            r#"<svg height="{size}" viewBox="0 0 630 630" width="{size}" xmlns="http://www.w3.org/2000/svg">"#,
            r#"<circle cx="315" cy="315" fill="{fill}" r="300"/>"#,
            r#"<g transform="translate(-15,65)"><desc/>"#,
            r#"<path d="{body}" fill="{fill}"/>"#,
            r#"<path d="{glyph}" style="fill:#fff"/>"#,
            r#"</g></svg>"#,
        ),
        size = MARKER_SIZE,
        fill = fill,
        body = BUS_BODY_PATH,
        glyph = BUS_GLYPH_PATH,
    )
}

/// Popup text shown when a marker is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Popup {
    /// `Route {abbreviation}`
    pub title: String,
    /// `Destination: {destination} ({direction})`
    pub body: String,
}

impl Popup {
    pub fn for_vehicle(vehicle: &Vehicle, route: &Route) -> Self {
        Self {
            title: format!("Route {}", route.label()),
            body: format!(
                "Destination: {} ({})",
                vehicle.destination.as_deref().unwrap_or(""),
                vehicle.direction_label()
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleMarker {
    pub vehicle_id: VehicleId,
    pub route_id: RouteId,
    /// Route label drawn next to the marker.
    pub label: String,
    /// `(lat, lon)`
    pub position: (f64, f64),
    pub color: HexColor,
    pub heading: Option<i32>,
    pub popup: Popup,
}

/// Join each vehicle to its route by `RouteId`. Vehicles whose route is
/// not in `routes` get no marker.
pub fn vehicle_markers(
    vehicles: &[impl Borrow<Vehicle>],
    routes: &[impl Borrow<Route>],
) -> Vec<VehicleMarker> {
    let by_id: HashMap<RouteId, &Route> = routes
        .iter()
        .map(|r| {
            let r: &Route = r.borrow();
            (r.id, r)
        })
        .collect();

    vehicles
        .iter()
        .filter_map(|v| {
            let v: &Vehicle = v.borrow();
            let route = by_id.get(&v.route_id)?;
            Some(VehicleMarker {
                vehicle_id: v.id,
                route_id: route.id,
                label: route.label(),
                position: v.position(),
                color: route.color.clone(),
                heading: v.heading,
                popup: Popup::for_vehicle(v, route),
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{route, vehicle};
    use pretty_assertions::assert_eq;

    #[test]
    fn svg_uses_route_color_twice_and_white_glyph() {
        let svg = marker_svg(&HexColor::parse("0c6cb4").unwrap());
        assert!(svg.starts_with(r#"<?xml version="1.0" ?><svg height="32""#));
        assert_eq!(svg.matches(r##"fill="#0C6CB4""##).count(), 2);
        assert!(svg.contains(r#"r="300""#));
        assert!(svg.contains("style=\"fill:#fff\""));
        assert!(svg.ends_with("</g></svg>"));
    }

    #[test]
    fn markers_join_routes_and_skip_unknown() {
        let routes = vec![route(1, "B43", "FF0000")];
        let vehicles = vec![vehicle(10, 1, "UMass", "N"), vehicle(11, 99, "Nowhere", "S")];

        let markers = vehicle_markers(&vehicles, &routes);

        assert_eq!(markers.len(), 1);
        let m = &markers[0];
        assert_eq!(m.vehicle_id, VehicleId(10));
        assert_eq!(m.label, "B43");
        assert_eq!(m.color.as_str(), "FF0000");
        assert_eq!(
            m.popup,
            Popup {
                title: "Route B43".into(),
                body: "Destination: UMass (N)".into(),
            }
        );
    }
}
