// ── Central reactive data store ──
//
// Thread-safe storage for all busmap domain entities. Mutations are
// broadcast to subscribers via `watch` channels.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::collection::EntityCollection;
use crate::model::{Route, RouteId, RouteTrace, ServiceAlert, Stop, Vehicle};
use crate::stream::EntityStream;

/// Whether the first vehicle poll has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
pub enum LoadPhase {
    #[default]
    Initializing,
    Live,
}

/// Central reactive store for routes, vehicles, stops, alerts, and traces.
pub struct DataStore {
    pub(crate) routes: EntityCollection<Route>,
    pub(crate) vehicles: EntityCollection<Vehicle>,
    pub(crate) stops: EntityCollection<Stop>,
    pub(crate) alerts: EntityCollection<ServiceAlert>,
    pub(crate) traces: EntityCollection<RouteTrace>,
    pub(crate) last_route_refresh: watch::Sender<Option<DateTime<Utc>>>,
    pub(crate) last_vehicle_poll: watch::Sender<Option<DateTime<Utc>>>,
    pub(crate) phase: watch::Sender<LoadPhase>,
}

fn route_order(a: &Route, b: &Route) -> Ordering {
    (a.sort_order, a.id).cmp(&(b.sort_order, b.id))
}

fn vehicle_order(a: &Vehicle, b: &Vehicle) -> Ordering {
    a.route_id
        .cmp(&b.route_id)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

fn stop_order(a: &Stop, b: &Stop) -> Ordering {
    a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id))
}

fn alert_order(a: &ServiceAlert, b: &ServiceAlert) -> Ordering {
    (a.priority, a.id).cmp(&(b.priority, b.id))
}

fn trace_order(a: &RouteTrace, b: &RouteTrace) -> Ordering {
    a.route_id.cmp(&b.route_id)
}

impl DataStore {
    pub fn new() -> Self {
        let (last_route_refresh, _) = watch::channel(None);
        let (last_vehicle_poll, _) = watch::channel(None);
        let (phase, _) = watch::channel(LoadPhase::Initializing);

        Self {
            routes: EntityCollection::new(route_order),
            vehicles: EntityCollection::new(vehicle_order),
            stops: EntityCollection::new(stop_order),
            alerts: EntityCollection::new(alert_order),
            traces: EntityCollection::new(trace_order),
            last_route_refresh,
            last_vehicle_poll,
            phase,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn routes_snapshot(&self) -> Arc<Vec<Arc<Route>>> {
        self.routes.snapshot()
    }

    pub fn vehicles_snapshot(&self) -> Arc<Vec<Arc<Vehicle>>> {
        self.vehicles.snapshot()
    }

    pub fn stops_snapshot(&self) -> Arc<Vec<Arc<Stop>>> {
        self.stops.snapshot()
    }

    pub fn alerts_snapshot(&self) -> Arc<Vec<Arc<ServiceAlert>>> {
        self.alerts.snapshot()
    }

    pub fn traces_snapshot(&self) -> Arc<Vec<Arc<RouteTrace>>> {
        self.traces.snapshot()
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn route_by_id(&self, id: RouteId) -> Option<Arc<Route>> {
        self.routes.get(&id.to_string())
    }

    /// Find a route by abbreviation, short name, or numeric id
    /// (case-insensitive). Abbreviation matches win over id matches.
    pub fn route_by_label(&self, label: &str) -> Option<Arc<Route>> {
        let routes = self.routes.snapshot();
        routes
            .iter()
            .find(|r| {
                r.abbreviation
                    .as_deref()
                    .is_some_and(|a| a.eq_ignore_ascii_case(label.trim()))
            })
            .or_else(|| routes.iter().find(|r| r.matches_label(label)))
            .cloned()
    }

    pub fn trace_for(&self, route: RouteId) -> Option<Arc<RouteTrace>> {
        self.traces.get(&route.to_string())
    }

    pub fn vehicles_for_route(&self, route: RouteId) -> Vec<Arc<Vehicle>> {
        self.vehicles
            .snapshot()
            .iter()
            .filter(|v| v.route_id == route)
            .cloned()
            .collect()
    }

    // ── Derived views ────────────────────────────────────────────────

    /// Known routes with at least one vehicle in the latest poll, in
    /// route sort order.
    pub fn active_route_ids(&self) -> Vec<RouteId> {
        let with_vehicles: HashSet<RouteId> =
            self.vehicles.snapshot().iter().map(|v| v.route_id).collect();
        self.routes
            .snapshot()
            .iter()
            .map(|r| r.id)
            .filter(|id| with_vehicles.contains(id))
            .collect()
    }

    /// Active routes that have a trace file but no loaded trace for the
    /// current `RouteTraceHash64`.
    pub fn routes_missing_traces(&self) -> Vec<Arc<Route>> {
        let active: HashSet<RouteId> = self.active_route_ids().into_iter().collect();
        self.routes
            .snapshot()
            .iter()
            .filter(|r| active.contains(&r.id) && r.trace_filename.is_some())
            .filter(|r| {
                self.trace_for(r.id).is_none_or(|t| t.hash != r.trace_hash)
            })
            .cloned()
            .collect()
    }

    /// All route ids from the last route refresh, in sort order.
    pub fn route_ids(&self) -> Vec<RouteId> {
        self.routes.snapshot().iter().map(|r| r.id).collect()
    }

    // ── Count accessors ──────────────────────────────────────────────

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_routes(&self) -> EntityStream<Route> {
        EntityStream::new(self.routes.subscribe())
    }

    pub fn subscribe_vehicles(&self) -> EntityStream<Vehicle> {
        EntityStream::new(self.vehicles.subscribe())
    }

    pub fn subscribe_stops(&self) -> EntityStream<Stop> {
        EntityStream::new(self.stops.subscribe())
    }

    pub fn subscribe_alerts(&self) -> EntityStream<ServiceAlert> {
        EntityStream::new(self.alerts.subscribe())
    }

    pub fn subscribe_traces(&self) -> EntityStream<RouteTrace> {
        EntityStream::new(self.traces.subscribe())
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<LoadPhase> {
        self.phase.subscribe()
    }

    /// Fires after every completed vehicle poll, including `null` answers.
    pub fn subscribe_vehicle_polls(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.last_vehicle_poll.subscribe()
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn phase(&self) -> LoadPhase {
        *self.phase.borrow()
    }

    pub fn last_route_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_route_refresh.borrow()
    }

    pub fn last_vehicle_poll(&self) -> Option<DateTime<Utc>> {
        *self.last_vehicle_poll.borrow()
    }

    /// How long ago the last vehicle poll completed, or `None` if never.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_vehicle_poll().map(|t| Utc::now() - t)
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
