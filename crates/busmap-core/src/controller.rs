// ── Controller abstraction ──
//
// Full lifecycle management for an InfoPoint connection: initial route
// load, background vehicle polling, lazy trace loading, and reactive data
// streaming through the DataStore.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use geojson::FeatureCollection;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use busmap_api::{InfoPointClient, TransportConfig};

use crate::config::ControllerConfig;
use crate::convert::{alerts_from_details, stops_from_details, vehicles_from_wire};
use crate::error::CoreError;
use crate::kml;
use crate::map::{self, MapView, RouteLayer, VehicleMarker};
use crate::model::{Route, RouteId, RouteTrace, ServiceAlert, Stop, Vehicle};
use crate::store::{DataStore, LoadPhase};
use crate::stream::EntityStream;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Manages the connection
/// lifecycle, the vehicle poll loop, and trace loading.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    store: Arc<DataStore>,
    connection_state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
    /// Child token for the current connection. Cancelled on disconnect,
    /// replaced on reconnect.
    cancel_child: Mutex<CancellationToken>,
    client: Mutex<Option<Arc<InfoPointClient>>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    /// Serializes connect and disconnect.
    lifecycle: Mutex<()>,
    /// Bumped by every connect.
    generation: AtomicU64,
    /// Held while traces load so only one route is fetched at a time.
    trace_gate: Mutex<()>,
}

impl Controller {
    /// Create a new Controller from configuration. Does NOT connect;
    /// call [`connect()`](Self::connect) to load data and start polling.
    pub fn new(config: ControllerConfig) -> Self {
        let store = Arc::new(DataStore::new());
        let connection_state = watch::Sender::new(ConnectionState::Disconnected);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store,
                connection_state,
                cancel,
                cancel_child: Mutex::new(cancel_child),
                client: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
                lifecycle: Mutex::new(()),
                generation: AtomicU64::new(0),
                trace_gate: Mutex::new(()),
            }),
        }
    }

    /// Access the controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Access the underlying DataStore.
    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    pub fn map_view(&self) -> &MapView {
        &self.inner.config.map
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to InfoPoint.
    ///
    /// Stops whatever a previous connection left running, loads route
    /// details and the first vehicle snapshot, then spawns the vehicle poll
    /// task (unless `poll_interval` is zero) and, with `trace_loading` on, a
    /// background task that fetches traces for active routes.
    ///
    /// Returns the generation of the new connection. Pass it to
    /// [`disconnect_if_current()`](Self::disconnect_if_current) so a stale
    /// owner cannot tear down a newer connection.
    pub async fn connect(&self) -> Result<u64, CoreError> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        self.stop_tasks().await;

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);
        self.inner.store.reset();

        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let config = &self.inner.config;
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let client = match InfoPointClient::new(config.base_url.clone(), &transport) {
            Ok(c) => c,
            Err(e) => {
                self.inner
                    .connection_state
                    .send_replace(ConnectionState::Failed);
                return Err(e.into());
            }
        };
        *self.inner.client.lock().await = Some(Arc::new(client));

        if let Err(e) = self.load_snapshot().await {
            *self.inner.client.lock().await = None;
            self.inner
                .connection_state
                .send_replace(ConnectionState::Failed);
            return Err(e);
        }

        let mut spawned = Vec::new();
        if config.trace_loading {
            spawned.push(tokio::spawn(trace_load_task(self.clone(), child.clone())));
        }
        if !config.poll_interval.is_zero() {
            let period = config.poll_interval;
            spawned.push(tokio::spawn(vehicle_poll_task(self.clone(), period, child)));
        }
        self.inner.task_handles.lock().await.extend(spawned);

        self.inner
            .connection_state
            .send_replace(ConnectionState::Connected);
        info!(
            base_url = %config.base_url,
            generation,
            routes = self.inner.store.route_count(),
            vehicles = self.inner.store.vehicle_count(),
            "connected to InfoPoint"
        );
        Ok(generation)
    }

    /// Disconnect from InfoPoint.
    ///
    /// Cancels the poll timer and waits for background tasks to exit. A
    /// request already in flight is allowed to finish first.
    pub async fn disconnect(&self) {
        let _lifecycle = self.inner.lifecycle.lock().await;
        self.teardown().await;
    }

    /// Disconnect only if `generation` is still the live connection. A
    /// newer [`connect()`](Self::connect) has already stopped the older
    /// connection's tasks, so there is nothing left to do for it.
    pub async fn disconnect_if_current(&self, generation: u64) -> bool {
        let _lifecycle = self.inner.lifecycle.lock().await;
        if self.generation() != generation {
            debug!(generation, "stale disconnect ignored");
            return false;
        }
        self.teardown().await;
        true
    }

    /// Generation of the most recent [`connect()`](Self::connect); zero
    /// before the first one.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Caller holds the lifecycle lock.
    async fn teardown(&self) {
        self.stop_tasks().await;
        *self.inner.client.lock().await = None;
        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// Cancel the current child token and join its tasks. The handle list
    /// is taken out of its lock before any task is awaited.
    async fn stop_tasks(&self) {
        self.inner.cancel_child.lock().await.cancel();
        let handles = std::mem::take(&mut *self.inner.task_handles.lock().await);
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "background task ended abnormally");
            }
        }
    }

    /// Fetch route details, then vehicles, then traces for active routes.
    pub async fn full_refresh(&self) -> Result<(), CoreError> {
        self.load_snapshot().await?;
        if self.inner.config.trace_loading {
            self.load_active_traces().await;
        }
        Ok(())
    }

    /// Route details followed by one vehicle poll.
    async fn load_snapshot(&self) -> Result<(), CoreError> {
        let client = self.client().await?;

        let details = client.list_route_details().await?;
        let routes: Vec<Route> = details.iter().map(Route::from).collect();
        let stops = stops_from_details(&details);
        let alerts = alerts_from_details(&details);
        debug!(
            routes = routes.len(),
            stops = stops.len(),
            alerts = alerts.len(),
            "applying route details"
        );
        self.inner.store.apply_route_details(routes, stops, alerts);

        self.poll_vehicles().await?;
        Ok(())
    }

    /// Poll vehicle positions for every known route.
    ///
    /// Returns the number of vehicles applied, or `None` when InfoPoint
    /// answered `null` and the previous snapshot was kept.
    pub async fn poll_vehicles(&self) -> Result<Option<usize>, CoreError> {
        let client = self.client().await?;
        let route_ids: Vec<u32> = self
            .inner
            .store
            .route_ids()
            .into_iter()
            .map(RouteId::get)
            .collect();

        if route_ids.is_empty() {
            debug!("no routes known; skipping vehicle request");
            self.inner.store.apply_vehicles(Vec::new());
            return Ok(Some(0));
        }

        match client.list_vehicles_for_routes(&route_ids).await? {
            Some(raw) => {
                let vehicles = vehicles_from_wire(raw);
                let count = vehicles.len();
                self.inner.store.apply_vehicles(vehicles);
                Ok(Some(count))
            }
            None => {
                debug!("vehicle response was null; keeping previous snapshot");
                self.inner.store.mark_polled();
                Ok(None)
            }
        }
    }

    /// Load traces for active routes that lack a current one, one route at
    /// a time. Failures are logged and skipped. Returns how many loaded.
    pub async fn load_active_traces(&self) -> usize {
        self.load_traces(None).await
    }

    async fn load_traces(&self, cancel: Option<&CancellationToken>) -> usize {
        let _gate = self.inner.trace_gate.lock().await;
        let mut loaded = 0;

        for route in self.inner.store.routes_missing_traces() {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                break;
            }
            match self.fetch_trace(&route).await {
                Ok(trace) => {
                    self.inner.store.apply_trace(trace);
                    loaded += 1;
                }
                Err(e) => {
                    warn!(route = %route.label(), error = %e, "route trace unavailable");
                }
            }
        }

        if loaded > 0 {
            debug!(loaded, "route traces loaded");
        }
        loaded
    }

    /// A route's trace, fetched on demand and cached in the store.
    pub async fn route_trace(&self, route_id: RouteId) -> Result<Arc<RouteTrace>, CoreError> {
        let route = self
            .inner
            .store
            .route_by_id(route_id)
            .ok_or_else(|| CoreError::RouteNotFound {
                identifier: route_id.to_string(),
            })?;

        if let Some(cached) = self.inner.store.trace_for(route_id) {
            if cached.hash == route.trace_hash {
                return Ok(cached);
            }
        }

        let trace = self.fetch_trace(&route).await?;
        self.inner.store.apply_trace(trace);
        self.inner
            .store
            .trace_for(route_id)
            .ok_or_else(|| CoreError::Internal(format!("trace for route {route_id} vanished")))
    }

    async fn fetch_trace(&self, route: &Route) -> Result<RouteTrace, CoreError> {
        let filename = route
            .trace_filename
            .as_deref()
            .ok_or_else(|| CoreError::TraceUnavailable {
                route: route.label(),
                reason: "route has no trace file".into(),
            })?;

        let client = self.client().await?;
        let kml_text = client.fetch_trace_kml(filename).await?;
        let geojson = kml::to_geojson(&kml_text)?;
        debug!(
            route = %route.label(),
            features = geojson.features.len(),
            "converted route trace"
        );

        Ok(RouteTrace {
            route_id: route.id,
            color: route.color.clone(),
            hash: route.trace_hash.clone(),
            geojson,
            fetched_at: Utc::now(),
        })
    }

    async fn client(&self) -> Result<Arc<InfoPointClient>, CoreError> {
        self.inner
            .client
            .lock()
            .await
            .clone()
            .ok_or(CoreError::NotConnected)
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Disables background polling and background trace loading since the
    /// CLI only needs a single request-response cycle. Closures that need
    /// traces call [`load_active_traces()`](Self::load_active_traces).
    pub async fn oneshot<F, Fut, T>(config: ControllerConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.poll_interval = Duration::ZERO;
        cfg.trace_loading = false;

        let controller = Controller::new(cfg);
        controller.connect().await?;
        let result = f(controller.clone()).await;
        controller.disconnect().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    pub fn phase(&self) -> LoadPhase {
        self.inner.store.phase()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<LoadPhase> {
        self.inner.store.subscribe_phase()
    }

    pub fn subscribe_vehicle_polls(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.inner.store.subscribe_vehicle_polls()
    }

    // ── Snapshot accessors (delegate to DataStore) ───────────────

    pub fn routes_snapshot(&self) -> Arc<Vec<Arc<Route>>> {
        self.inner.store.routes_snapshot()
    }

    pub fn vehicles_snapshot(&self) -> Arc<Vec<Arc<Vehicle>>> {
        self.inner.store.vehicles_snapshot()
    }

    pub fn stops_snapshot(&self) -> Arc<Vec<Arc<Stop>>> {
        self.inner.store.stops_snapshot()
    }

    pub fn alerts_snapshot(&self) -> Arc<Vec<Arc<ServiceAlert>>> {
        self.inner.store.alerts_snapshot()
    }

    pub fn traces_snapshot(&self) -> Arc<Vec<Arc<RouteTrace>>> {
        self.inner.store.traces_snapshot()
    }

    // ── Stream accessors ─────────────────────────────────────────

    pub fn routes(&self) -> EntityStream<Route> {
        self.inner.store.subscribe_routes()
    }

    pub fn vehicles(&self) -> EntityStream<Vehicle> {
        self.inner.store.subscribe_vehicles()
    }

    pub fn stops(&self) -> EntityStream<Stop> {
        self.inner.store.subscribe_stops()
    }

    pub fn alerts(&self) -> EntityStream<ServiceAlert> {
        self.inner.store.subscribe_alerts()
    }

    pub fn traces(&self) -> EntityStream<RouteTrace> {
        self.inner.store.subscribe_traces()
    }

    // ── Map composition ──────────────────────────────────────────

    /// Markers for the current vehicles. Vehicles on unknown routes are
    /// skipped.
    pub fn vehicle_markers(&self) -> Vec<VehicleMarker> {
        map::vehicle_markers(&self.vehicles_snapshot(), &self.routes_snapshot())
    }

    /// Overlays for active routes with a loaded trace.
    pub fn route_layers(&self) -> Vec<RouteLayer> {
        map::route_layers(&self.traces_snapshot(), &self.inner.store.active_route_ids())
    }

    /// Everything on the map as one GeoJSON document.
    pub fn export_map(&self) -> FeatureCollection {
        map::export_feature_collection(
            self.map_view(),
            &self.route_layers(),
            &self.vehicle_markers(),
        )
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Load traces for the routes active after connect. Stops between routes
/// once cancelled; a fetch already started is allowed to finish.
async fn trace_load_task(controller: Controller, cancel: CancellationToken) {
    let loaded = controller.load_traces(Some(&cancel)).await;
    debug!(loaded, "initial route traces done");
}

/// Poll vehicles every `period` until cancelled. Failed ticks are logged
/// and the previous snapshot stays in place.
async fn vehicle_poll_task(controller: Controller, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match controller.poll_vehicles().await {
                    Ok(_) => {
                        if controller.config().trace_loading {
                            controller.load_traces(Some(&cancel)).await;
                        }
                    }
                    Err(e) => warn!(error = %e, "vehicle poll failed"),
                }
            }
        }
    }
}
