//! Geographic viewport behind the map canvas.
//!
//! Canvas x is longitude and y is latitude. The visible span comes from the
//! configured slippy-map zoom (a fixed number of tiles across) divided by a
//! user scale that `+`/`-` multiply by [`ZOOM_STEP`].

use busmap_core::kml::Bounds;

pub const ZOOM_STEP: f64 = 1.2;
pub const MIN_SCALE: f64 = 0.05;
pub const MAX_SCALE: f64 = 40.0;

/// Tiles visible across the canvas at scale 1.0.
const TILES_ACROSS: f64 = 4.0;
/// Terminal cells are about twice as tall as they are wide.
const CELL_ASPECT: f64 = 2.0;
/// Fraction of the visible span moved per arrow key.
const PAN_FRACTION: f64 = 0.1;
/// Breathing room around fitted content.
const FIT_PADDING: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// `(lat, lon)`
    pub center: (f64, f64),
    pub zoom: u8,
    pub scale: f64,
}

impl Viewport {
    pub fn new(center: (f64, f64), zoom: u8) -> Self {
        Self {
            center,
            zoom,
            scale: 1.0,
        }
    }

    /// Half the visible longitude span at scale 1.0.
    fn base_half_lon(&self) -> f64 {
        let tile_degrees = 360.0 / 2f64.powi(i32::from(self.zoom));
        tile_degrees * TILES_ACROSS / 2.0
    }

    pub fn half_lon_span(&self) -> f64 {
        self.base_half_lon() / self.scale
    }

    /// Degrees of latitude per degree of longitude at equal ground distance.
    fn lat_per_lon(&self) -> f64 {
        self.center.0.to_radians().cos().abs().max(0.01)
    }

    /// Canvas bounds `([lon_min, lon_max], [lat_min, lat_max])` for a canvas
    /// of `width` x `height` cells.
    pub fn bounds(&self, width: u16, height: u16) -> ([f64; 2], [f64; 2]) {
        let half_lon = self.half_lon_span();
        let half_lat = half_lon * self.lat_per_lon() * aspect(width, height);
        let (lat, lon) = self.center;
        (
            [lon - half_lon, lon + half_lon],
            [lat - half_lat, lat + half_lat],
        )
    }

    /// Shift the center by a fraction of the visible span. `dx` moves east,
    /// `dy` moves north.
    pub fn pan(&mut self, dx: i8, dy: i8) {
        let step_lon = self.half_lon_span() * 2.0 * PAN_FRACTION;
        let step_lat = step_lon * self.lat_per_lon();
        self.center.1 += f64::from(dx) * step_lon;
        self.center.0 += f64::from(dy) * step_lat;
    }

    pub fn zoom_in(&mut self) {
        self.scale = (self.scale * ZOOM_STEP).min(MAX_SCALE);
    }

    pub fn zoom_out(&mut self) {
        self.scale = (self.scale / ZOOM_STEP).max(MIN_SCALE);
    }

    /// Center on `extent` and scale so all of it is visible on a
    /// `width` x `height` canvas.
    pub fn fit(&mut self, extent: Bounds, width: u16, height: u16) {
        self.center = extent.center();

        let half_lon = (extent.max_lon - extent.min_lon) / 2.0;
        let half_lat = (extent.max_lat - extent.min_lat) / 2.0;
        let lat_as_lon = half_lat / (self.lat_per_lon() * aspect(width, height));
        let needed = half_lon.max(lat_as_lon) * FIT_PADDING;
        if needed > 0.0 {
            self.scale = (self.base_half_lon() / needed).clamp(MIN_SCALE, MAX_SCALE);
        }
    }

    pub fn contains(&self, lat: f64, lon: f64, width: u16, height: u16) -> bool {
        let ([x0, x1], [y0, y1]) = self.bounds(width, height);
        (x0..=x1).contains(&lon) && (y0..=y1).contains(&lat)
    }
}

/// Height over width of the canvas, in longitude-equivalent units.
fn aspect(width: u16, height: u16) -> f64 {
    if width == 0 || height == 0 {
        return 1.0;
    }
    f64::from(height) * CELL_ASPECT / f64::from(width)
}

/// Extent of a set of `(lat, lon)` points.
pub fn points_extent(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Bounds> {
    points
        .into_iter()
        .map(|(lat, lon)| Bounds {
            min_lon: lon,
            min_lat: lat,
            max_lon: lon,
            max_lat: lat,
        })
        .reduce(Bounds::union)
}
