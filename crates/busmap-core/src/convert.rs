// ── API-to-domain type conversions ──
//
// Bridges raw `busmap_api` response types into `busmap_core::model` domain
// types. Stops and alerts are embedded per route on the wire, so they are
// flattened and deduplicated here.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use busmap_api::models::{RouteDetails, RouteMessage, RouteVehicle};
use busmap_api::parse_infopoint_date;
use tracing::debug;

use crate::model::{
    Direction, HexColor, MessageId, Route, RouteId, ServiceAlert, Stop, StopId, Vehicle, VehicleId,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Drop empty and whitespace-only strings.
fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

// ── Routes ─────────────────────────────────────────────────────────

impl From<&RouteDetails> for Route {
    fn from(d: &RouteDetails) -> Self {
        // Prefer the ordered RouteStops links; fall back to the embedded stops.
        let mut links: Vec<_> = d.route_stops.iter().collect();
        links.sort_by_key(|l| (l.direction.clone(), l.sort_order));
        let ordered: Vec<StopId> = if links.is_empty() {
            d.stops.iter().map(|s| StopId(s.stop_id)).collect()
        } else {
            links.iter().map(|l| StopId(l.stop_id)).collect()
        };
        let mut seen = HashSet::new();
        let stop_ids: Vec<StopId> = ordered.into_iter().filter(|id| seen.insert(*id)).collect();

        Route {
            id: RouteId(d.route_id),
            abbreviation: non_blank(d.route_abbreviation.clone()),
            short_name: non_blank(d.short_name.clone()),
            long_name: non_blank(d.long_name.clone()),
            color: HexColor::from(d.color.as_deref()),
            text_color: HexColor::from(d.text_color.as_deref()),
            group: non_blank(d.group.clone()),
            is_visible: d.is_visible,
            sort_order: d.sort_order.unwrap_or(0),
            trace_filename: non_blank(d.route_trace_filename.clone()),
            trace_hash: non_blank(d.route_trace_hash64.clone()),
            directions: d
                .directions
                .iter()
                .filter_map(|dir| {
                    Some(Direction {
                        code: non_blank(dir.dir.clone())?,
                        description: non_blank(dir.direction_desc.clone()),
                    })
                })
                .collect(),
            stop_ids,
            embedded_vehicle_count: d.vehicles.len(),
            alert_ids: d
                .messages
                .iter()
                .filter(|m| m.published)
                .map(|m| MessageId(m.message_id))
                .collect(),
        }
    }
}

// ── Vehicles ───────────────────────────────────────────────────────

impl From<RouteVehicle> for Vehicle {
    fn from(v: RouteVehicle) -> Self {
        let (latitude, longitude) = v.position().unwrap_or_default();
        Vehicle {
            id: VehicleId(v.vehicle_id),
            name: non_blank(v.name).unwrap_or_else(|| v.vehicle_id.to_string()),
            route_id: RouteId(v.route_id),
            direction: non_blank(v.direction),
            direction_long: non_blank(v.direction_long),
            destination: non_blank(v.destination),
            latitude,
            longitude,
            heading: v.heading,
            speed: v.speed,
            deviation_minutes: v.deviation,
            display_status: non_blank(v.display_status),
            current_status: non_blank(v.current_status),
            op_status: non_blank(v.op_status),
            occupancy: non_blank(v.occupancy_status_report_label),
            on_board: v.on_board,
            seating_capacity: v.seating_capacity,
            total_capacity: v.total_capacity,
            last_stop: non_blank(v.last_stop),
            next_stop_id: v.stop_id.filter(|id| *id != 0).map(StopId),
            last_updated: v.last_updated.as_deref().and_then(parse_infopoint_date),
            run_id: v.run_id,
            trip_id: v.trip_id,
            block_farebox_id: v.block_farebox_id,
            comm_status: non_blank(v.comm_status),
            gps_status: v.gps_status,
        }
    }
}

/// Convert a vehicle poll, dropping vehicles that report no GPS fix.
pub fn vehicles_from_wire(raw: Vec<RouteVehicle>) -> Vec<Vehicle> {
    let total = raw.len();
    let vehicles: Vec<Vehicle> = raw
        .into_iter()
        .filter(|v| v.position().is_some())
        .map(Vehicle::from)
        .collect();
    if vehicles.len() < total {
        debug!(dropped = total - vehicles.len(), "vehicles without a position");
    }
    vehicles
}

// ── Stops ──────────────────────────────────────────────────────────

/// Flatten the stops embedded in every route, one entry per `StopId`,
/// recording which routes serve each stop.
pub fn stops_from_details(details: &[RouteDetails]) -> Vec<Stop> {
    let mut stops: BTreeMap<u32, Stop> = BTreeMap::new();
    let mut served_by: BTreeMap<u32, BTreeSet<RouteId>> = BTreeMap::new();

    for route in details {
        let route_id = RouteId(route.route_id);
        for s in &route.stops {
            let Some((latitude, longitude)) = s.position() else {
                continue;
            };
            stops.entry(s.stop_id).or_insert_with(|| Stop {
                id: StopId(s.stop_id),
                name: non_blank(s.name.clone()).unwrap_or_else(|| s.stop_id.to_string()),
                description: non_blank(s.description.clone()),
                latitude,
                longitude,
                is_time_point: s.is_time_point,
                route_ids: Vec::new(),
            });
            served_by.entry(s.stop_id).or_default().insert(route_id);
        }
        for link in &route.route_stops {
            served_by
                .entry(link.stop_id)
                .or_default()
                .insert(RouteId(link.route_id));
        }
    }

    stops
        .into_iter()
        .map(|(id, mut stop)| {
            stop.route_ids = served_by.remove(&id).unwrap_or_default().into_iter().collect();
            stop
        })
        .collect()
}

// ── Alerts ─────────────────────────────────────────────────────────

/// Collect published service messages, one per `MessageId`. A message's
/// route list is the union of its own `Routes` and every route it was
/// attached to.
pub fn alerts_from_details(details: &[RouteDetails]) -> Vec<ServiceAlert> {
    let mut alerts: BTreeMap<u32, (ServiceAlert, BTreeSet<RouteId>)> = BTreeMap::new();

    for route in details {
        for m in route.messages.iter().filter(|m| m.published) {
            let (_, routes) = alerts
                .entry(m.message_id)
                .or_insert_with(|| (alert_from_message(m), BTreeSet::new()));
            routes.insert(RouteId(route.route_id));
            routes.extend(m.routes.iter().copied().map(RouteId));
        }
    }

    alerts
        .into_values()
        .map(|(mut alert, routes)| {
            alert.route_ids = routes.into_iter().collect();
            alert
        })
        .collect()
}

fn alert_from_message(m: &RouteMessage) -> ServiceAlert {
    let message = non_blank(m.message.clone())
        .or_else(|| m.message_translations.iter().find_map(|t| non_blank(t.text.clone())))
        .unwrap_or_default();
    ServiceAlert {
        id: MessageId(m.message_id),
        message,
        cause: non_blank(m.cause_report_label.clone()),
        effect: non_blank(m.effect_report_label.clone()),
        priority: m.priority.unwrap_or(0),
        route_ids: Vec::new(),
        from: m.from_date.as_deref().and_then(parse_infopoint_date),
        to: m.to_date.as_deref().and_then(parse_infopoint_date),
        url: non_blank(m.url.clone()),
        detour_id: m.detour_id.filter(|id| *id != 0),
    }
}
