// ── Route trace ──

use chrono::{DateTime, Utc};
use geojson::FeatureCollection;
use serde::Serialize;

use super::color::HexColor;
use super::ids::RouteId;

/// A route's KML trace, converted to GeoJSON and paired with its color.
#[derive(Debug, Clone, Serialize)]
pub struct RouteTrace {
    pub route_id: RouteId,
    pub color: HexColor,
    /// `RouteTraceHash64` at fetch time; a new hash means a new file.
    pub hash: Option<String>,
    pub geojson: FeatureCollection,
    pub fetched_at: DateTime<Utc>,
}
