// ── Service alert domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{MessageId, RouteId};

/// A published service message (detour, closure, schedule change).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAlert {
    pub id: MessageId,
    pub message: String,
    pub cause: Option<String>,
    pub effect: Option<String>,
    /// Lower is more urgent.
    pub priority: i32,
    pub route_ids: Vec<RouteId>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub detour_id: Option<u32>,
}
