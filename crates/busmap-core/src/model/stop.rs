// ── Stop domain type ──

use serde::{Deserialize, Serialize};

use super::ids::{RouteId, StopId};

/// A physical stop, shared by every route that serves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub is_time_point: bool,
    pub route_ids: Vec<RouteId>,
}
