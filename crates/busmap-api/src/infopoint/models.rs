// InfoPoint API response types
//
// Models for the InfoPoint REST endpoints. InfoPoint serializes .NET objects
// with PascalCase names and is loose about nulls: `#[serde(default)]` at the
// struct level covers missing keys, and every non-optional field goes through
// `null_as_default` so an explicit `null` in one record cannot fail a batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Route details ────────────────────────────────────────────────────

/// A route record from `RouteDetails/GetAllRouteDetails`.
///
/// Embeds the route's stops, service messages, and (at fetch time) the
/// vehicles currently assigned to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RouteDetails {
    #[serde(deserialize_with = "null_as_default")]
    pub route_id: u32,
    pub route_record_id: Option<u32>,
    pub route_abbreviation: Option<String>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    /// Six-digit hex without `#`.
    pub color: Option<String>,
    pub text_color: Option<String>,
    pub group: Option<String>,
    pub google_description: Option<String>,
    pub ivr_description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub include_in_google: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub is_headway: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub is_headway_monitored: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub is_visible: bool,
    pub sort_order: Option<i32>,
    pub route_trace_filename: Option<String>,
    #[serde(rename = "RouteTraceHash64")]
    pub route_trace_hash64: Option<String>,
    pub detour_active_message_count: Option<u32>,
    #[serde(deserialize_with = "null_as_default")]
    pub directions: Vec<RouteDirection>,
    #[serde(deserialize_with = "null_as_default")]
    pub messages: Vec<RouteMessage>,
    #[serde(deserialize_with = "null_as_default")]
    pub route_stops: Vec<RouteStopLink>,
    #[serde(deserialize_with = "null_as_default")]
    pub stops: Vec<RouteStop>,
    #[serde(deserialize_with = "null_as_default")]
    pub vehicles: Vec<RouteVehicle>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RouteDirection {
    pub dir: Option<String>,
    pub direction_desc: Option<String>,
    pub direction_icon_file_name: Option<String>,
}

/// Ordering of a stop along one direction of a route.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RouteStopLink {
    pub direction: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub route_id: u32,
    pub sort_order: Option<i32>,
    #[serde(deserialize_with = "null_as_default")]
    pub stop_id: u32,
}

// ── Service messages ─────────────────────────────────────────────────

/// A service alert attached to one or more routes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RouteMessage {
    #[serde(deserialize_with = "null_as_default")]
    pub message_id: u32,
    pub message: Option<String>,
    pub cause: Option<i32>,
    pub cause_report_label: Option<String>,
    pub effect: Option<i32>,
    pub effect_report_label: Option<String>,
    pub days_of_week: Option<u32>,
    pub from_date: Option<String>,
    pub from_time: Option<String>,
    pub to_date: Option<String>,
    pub to_time: Option<String>,
    pub priority: Option<i32>,
    pub public_access: Option<i32>,
    #[serde(deserialize_with = "null_as_default")]
    pub published: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub routes: Vec<u32>,
    #[serde(deserialize_with = "null_as_default")]
    pub signs: Vec<u32>,
    #[serde(rename = "URL")]
    pub url: Option<String>,
    #[serde(rename = "Detour_Id")]
    pub detour_id: Option<u32>,
    #[serde(deserialize_with = "null_as_default")]
    pub channel_messages: Vec<ChannelMessage>,
    #[serde(deserialize_with = "null_as_default")]
    pub message_translations: Vec<MessageTranslation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ChannelMessage {
    pub channel_id: Option<u32>,
    pub message: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub channel_message_translations: Vec<ChannelMessageTranslation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ChannelMessageTranslation {
    pub language_id: Option<String>,
    pub translated_text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MessageTranslation {
    pub lang: Option<String>,
    pub text: Option<String>,
}

// ── Stops ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RouteStop {
    #[serde(deserialize_with = "null_as_default")]
    pub stop_id: u32,
    pub stop_record_id: Option<u32>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub is_time_point: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl RouteStop {
    /// `(latitude, longitude)` when both are present.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

// ── Vehicles ─────────────────────────────────────────────────────────

/// A live vehicle position from `Vehicles/GetAllVehiclesForRoutes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RouteVehicle {
    #[serde(deserialize_with = "null_as_default")]
    pub vehicle_id: u32,
    pub name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub route_id: u32,
    pub run_id: Option<u32>,
    pub trip_id: Option<u32>,
    pub block_farebox_id: Option<u32>,
    pub stop_id: Option<u32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub heading: Option<i32>,
    pub speed: Option<f64>,
    /// Minutes behind schedule (negative when early).
    pub deviation: Option<i32>,
    pub direction: Option<String>,
    pub direction_long: Option<String>,
    pub destination: Option<String>,
    pub display_status: Option<String>,
    pub current_status: Option<String>,
    pub op_status: Option<String>,
    pub comm_status: Option<String>,
    #[serde(rename = "GPSStatus")]
    pub gps_status: Option<i32>,
    pub driver_name: Option<String>,
    pub last_stop: Option<String>,
    /// `/Date(ms-offset)/` timestamp; see [`parse_infopoint_date`].
    pub last_updated: Option<String>,
    pub occupancy_status: Option<i32>,
    pub occupancy_status_report_label: Option<String>,
    pub on_board: Option<u32>,
    pub seating_capacity: Option<u32>,
    pub total_capacity: Option<u32>,
    pub property_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RouteVehicle {
    /// `(latitude, longitude)`, or `None` for a vehicle without a GPS fix.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Read an explicit `null` as the type's default. `#[serde(default)]` alone
/// only covers missing keys.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode an ASP.NET JSON date (`/Date(1700000000000-0500)/`).
///
/// The millisecond value is already UTC; the trailing offset only describes
/// the server's local zone and is ignored.
pub fn parse_infopoint_date(raw: &str) -> Option<DateTime<Utc>> {
    let inner = raw.trim().strip_prefix("/Date(")?.strip_suffix(")/")?;
    let digits_end = inner
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '+' || *c == '-')
        .map_or(inner.len(), |(i, _)| i);
    let millis: i64 = inner.get(..digits_end)?.parse().ok()?;
    DateTime::from_timestamp_millis(millis)
}
