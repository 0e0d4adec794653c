// ── Map composition ──
//
// Turns store snapshots into map primitives: vehicle markers with popups,
// colored route layers, status text, and a combined GeoJSON export that any
// web map can draw.

mod export;
mod layers;
mod marker;
mod status;

use secrecy::{ExposeSecret, SecretString};

pub use export::export_feature_collection;
pub use layers::{ROUTE_LAYER_OPACITY, RouteLayer, route_layers};
pub use marker::{MARKER_SIZE, Popup, VehicleMarker, marker_svg, vehicle_markers};
pub use status::{StatusLine, clock_label, vehicle_count_label};

/// Downtown Northampton / Five College area.
pub const DEFAULT_CENTER: (f64, f64) = (42.3055, -72.5208);
pub const DEFAULT_ZOOM: u8 = 13;
pub const DEFAULT_TILE_URL: &str = "https://tile.thunderforest.com/transport/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str = "© OpenStreetMap contributors";

/// Initial viewport and tile source.
#[derive(Debug, Clone)]
pub struct MapView {
    /// `(lat, lon)`
    pub center: (f64, f64),
    pub zoom: u8,
    /// XYZ template with `{z}`, `{x}`, `{y}` placeholders.
    pub tile_url: String,
    pub tile_api_key: Option<SecretString>,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            tile_url: DEFAULT_TILE_URL.to_owned(),
            tile_api_key: None,
        }
    }
}

impl MapView {
    /// URL of one tile, with the API key appended when configured.
    pub fn tile_url_for(&self, z: u8, x: u32, y: u32) -> String {
        self.tile_template()
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }

    /// The tile template with `apikey` applied (placeholders left intact).
    pub fn tile_template(&self) -> String {
        match &self.tile_api_key {
            Some(key) if !key.expose_secret().is_empty() => {
                let sep = if self.tile_url.contains('?') { '&' } else { '?' };
                format!("{}{sep}apikey={}", self.tile_url, key.expose_secret())
            }
            _ => self.tile_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tile_url_without_key() {
        let view = MapView::default();
        assert_eq!(
            view.tile_url_for(13, 2446, 3027),
            "https://tile.thunderforest.com/transport/13/2446/3027.png"
        );
    }

    #[test]
    fn tile_url_appends_key() {
        let view = MapView {
            tile_api_key: Some(SecretString::from("abc123")),
            ..MapView::default()
        };
        assert_eq!(
            view.tile_template(),
            "https://tile.thunderforest.com/transport/{z}/{x}/{y}.png?apikey=abc123"
        );
        assert_eq!(
            view.tile_url_for(1, 2, 3),
            "https://tile.thunderforest.com/transport/1/2/3.png?apikey=abc123"
        );
    }

    #[test]
    fn tile_key_joins_existing_query() {
        let view = MapView {
            tile_url: "https://tiles.example/{z}/{x}/{y}?style=t".into(),
            tile_api_key: Some(SecretString::from("k")),
            ..MapView::default()
        };
        assert!(view.tile_template().ends_with("?style=t&apikey=k"));
    }
}
