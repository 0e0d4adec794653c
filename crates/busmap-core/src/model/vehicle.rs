// ── Vehicle domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{RouteId, StopId, VehicleId};

/// A bus as reported by the latest vehicle poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    /// Fleet number painted on the bus.
    pub name: String,
    pub route_id: RouteId,
    pub direction: Option<String>,
    pub direction_long: Option<String>,
    pub destination: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub heading: Option<i32>,
    pub speed: Option<f64>,
    /// Positive when behind schedule.
    pub deviation_minutes: Option<i32>,
    pub display_status: Option<String>,
    pub current_status: Option<String>,
    pub op_status: Option<String>,
    /// Human-readable occupancy (e.g. "Many Seats Available").
    pub occupancy: Option<String>,
    pub on_board: Option<u32>,
    pub seating_capacity: Option<u32>,
    pub total_capacity: Option<u32>,
    pub last_stop: Option<String>,
    pub next_stop_id: Option<StopId>,
    pub last_updated: Option<DateTime<Utc>>,
    pub run_id: Option<u32>,
    pub trip_id: Option<u32>,
    pub block_farebox_id: Option<u32>,
    pub comm_status: Option<String>,
    pub gps_status: Option<i32>,
}

impl Vehicle {
    /// `(latitude, longitude)`
    pub fn position(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    pub fn is_on_time(&self) -> bool {
        self.deviation_minutes.unwrap_or(0) == 0
    }

    /// "On time", "N min early", or "N min late".
    pub fn schedule_label(&self) -> String {
        match self.deviation_minutes.unwrap_or(0) {
            0 => "On time".into(),
            d if d < 0 => format!("{} min early", d.unsigned_abs()),
            d => format!("{d} min late"),
        }
    }

    /// Direction text for popups, preferring the short code.
    pub fn direction_label(&self) -> &str {
        self.direction
            .as_deref()
            .or(self.direction_long.as_deref())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(deviation: Option<i32>) -> Vehicle {
        Vehicle {
            id: VehicleId(3201),
            name: "3201".into(),
            route_id: RouteId(20030),
            direction: Some("N".into()),
            direction_long: Some("Northbound".into()),
            destination: Some("UMass".into()),
            latitude: 42.37,
            longitude: -72.52,
            heading: None,
            speed: None,
            deviation_minutes: deviation,
            display_status: None,
            current_status: None,
            op_status: None,
            occupancy: None,
            on_board: None,
            seating_capacity: None,
            total_capacity: None,
            last_stop: None,
            next_stop_id: None,
            last_updated: None,
            run_id: None,
            trip_id: None,
            block_farebox_id: None,
            comm_status: None,
            gps_status: None,
        }
    }

    #[test]
    fn schedule_labels() {
        assert_eq!(vehicle(Some(0)).schedule_label(), "On time");
        assert_eq!(vehicle(None).schedule_label(), "On time");
        assert_eq!(vehicle(Some(-2)).schedule_label(), "2 min early");
        assert_eq!(vehicle(Some(5)).schedule_label(), "5 min late");
        assert!(vehicle(None).is_on_time());
        assert!(!vehicle(Some(1)).is_on_time());
    }

    #[test]
    fn position_is_lat_lon() {
        assert_eq!(vehicle(None).position(), (42.37, -72.52));
    }
}
