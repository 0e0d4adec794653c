// ── Refresh application logic ──
//
// Applies fetched snapshots into the DataStore. Every collection is
// replaced wholesale with upsert-then-prune so subscribers never observe a
// blank intermediate state.

use std::collections::HashSet;

use chrono::Utc;

use super::DataStore;
use super::LoadPhase;
use super::collection::EntityCollection;
use crate::model::{Route, RouteTrace, ServiceAlert, Stop, Vehicle};

/// Upsert all incoming entities, then prune any existing keys not in the
/// incoming set, publishing the result as a single change.
fn upsert_and_prune<T: Send + Sync + 'static>(
    collection: &EntityCollection<T>,
    items: Vec<(String, T)>,
) {
    let incoming_keys: HashSet<String> = items.iter().map(|(k, _)| k.clone()).collect();
    for (key, entity) in items {
        collection.upsert_silent(key, entity);
    }
    for existing_key in collection.keys() {
        if !incoming_keys.contains(&existing_key) {
            collection.remove_silent(&existing_key);
        }
    }
    collection.flush();
}

impl DataStore {
    /// Replace routes, stops, and alerts from a route-details fetch.
    pub(crate) fn apply_route_details(
        &self,
        routes: Vec<Route>,
        stops: Vec<Stop>,
        alerts: Vec<ServiceAlert>,
    ) {
        upsert_and_prune(
            &self.routes,
            routes.into_iter().map(|r| (r.id.to_string(), r)).collect(),
        );
        upsert_and_prune(
            &self.stops,
            stops.into_iter().map(|s| (s.id.to_string(), s)).collect(),
        );
        upsert_and_prune(
            &self.alerts,
            alerts.into_iter().map(|a| (a.id.to_string(), a)).collect(),
        );
        self.last_route_refresh.send_replace(Some(Utc::now()));
    }

    /// Replace the vehicle snapshot. The most recently applied response
    /// wins; duplicate vehicle ids within one response keep the last entry.
    pub(crate) fn apply_vehicles(&self, vehicles: Vec<Vehicle>) {
        upsert_and_prune(
            &self.vehicles,
            vehicles.into_iter().map(|v| (v.id.to_string(), v)).collect(),
        );
        self.mark_polled();
    }

    /// Record a completed vehicle poll, even one that returned nothing.
    pub(crate) fn mark_polled(&self) {
        self.last_vehicle_poll.send_replace(Some(Utc::now()));
        self.phase.send_if_modified(|phase| {
            let changed = *phase != LoadPhase::Live;
            *phase = LoadPhase::Live;
            changed
        });
    }

    /// Store a converted trace, replacing any older trace for the route.
    pub(crate) fn apply_trace(&self, trace: RouteTrace) {
        self.traces.upsert(trace.route_id.to_string(), trace);
    }

    /// Drop everything fetched so far and return to `Initializing`.
    pub(crate) fn reset(&self) {
        self.routes.clear();
        self.vehicles.clear();
        self.stops.clear();
        self.alerts.clear();
        self.traces.clear();
        self.last_route_refresh.send_replace(None);
        self.last_vehicle_poll.send_replace(None);
        self.phase.send_replace(LoadPhase::Initializing);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{MessageId, RouteId, VehicleId};
    use crate::test_support::{route, trace, vehicle};
    use pretty_assertions::assert_eq;

    #[test]
    fn vehicles_are_replaced_wholesale() {
        let store = DataStore::new();
        store.apply_vehicles(vec![vehicle(1, 10, "A", "N"), vehicle(2, 10, "B", "S")]);
        store.apply_vehicles(vec![vehicle(2, 10, "B", "S"), vehicle(3, 20, "C", "N")]);

        let ids: Vec<VehicleId> = store.vehicles_snapshot().iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![VehicleId(2), VehicleId(3)]);
    }

    #[test]
    fn first_poll_moves_phase_to_live() {
        let store = DataStore::new();
        let mut rx = store.subscribe_phase();
        assert_eq!(store.phase(), LoadPhase::Initializing);
        assert!(store.data_age().is_none());

        store.mark_polled();
        assert_eq!(store.phase(), LoadPhase::Live);
        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();

        store.mark_polled();
        assert!(!rx.has_changed().unwrap());
        assert!(store.data_age().is_some());
    }

    #[test]
    fn active_routes_follow_route_order() {
        let store = DataStore::new();
        let mut late = route(5, "R29", "00FF00");
        late.sort_order = 9;
        let mut early = route(7, "B43", "FF0000");
        early.sort_order = 1;
        store.apply_route_details(vec![late, early, route(8, "X90", "0000FF")], vec![], vec![]);
        store.apply_vehicles(vec![
            vehicle(1, 5, "A", "N"),
            vehicle(2, 7, "B", "S"),
            vehicle(3, 99, "Ghost", "N"),
        ]);

        assert_eq!(store.active_route_ids(), vec![RouteId(7), RouteId(5)]);
        assert_eq!(store.vehicles_for_route(RouteId(5)).len(), 1);
    }

    #[test]
    fn traces_are_keyed_by_route() {
        let store = DataStore::new();
        store.apply_trace(trace(1, "FF0000"));
        store.apply_trace(trace(1, "00FF00"));
        assert_eq!(store.traces_snapshot().len(), 1);
        assert_eq!(store.trace_for(RouteId(1)).unwrap().color.as_str(), "00FF00");
    }

    #[test]
    fn missing_traces_respect_hash_and_filename() {
        let store = DataStore::new();
        let mut with_file = route(1, "B43", "FF0000");
        with_file.trace_filename = Some("B43.kml".into());
        with_file.trace_hash = Some("h2".into());
        let no_file = route(2, "R29", "00FF00");
        store.apply_route_details(vec![with_file, no_file], vec![], vec![]);
        store.apply_vehicles(vec![vehicle(1, 1, "A", "N"), vehicle(2, 2, "B", "N")]);

        assert_eq!(store.routes_missing_traces().len(), 1);

        let mut stale = trace(1, "FF0000");
        stale.hash = Some("h1".into());
        store.apply_trace(stale);
        assert_eq!(store.routes_missing_traces().len(), 1);

        let mut fresh = trace(1, "FF0000");
        fresh.hash = Some("h2".into());
        store.apply_trace(fresh);
        assert!(store.routes_missing_traces().is_empty());
    }

    #[test]
    fn route_lookup_by_label() {
        let store = DataStore::new();
        let mut r = route(20030, "B43", "FF0000");
        r.alert_ids = vec![MessageId(1)];
        store.apply_route_details(vec![r], vec![], vec![]);

        assert_eq!(store.route_by_label("b43").unwrap().id, RouteId(20030));
        assert_eq!(store.route_by_label("20030").unwrap().id, RouteId(20030));
        assert!(store.route_by_label("R29").is_none());
        assert!(store.last_route_refresh().is_some());
    }

    #[test]
    fn reset_returns_to_initializing() {
        let store = DataStore::new();
        store.apply_vehicles(vec![vehicle(1, 1, "A", "N")]);
        store.reset();
        assert_eq!(store.phase(), LoadPhase::Initializing);
        assert_eq!(store.vehicle_count(), 0);
    }
}
