#![allow(clippy::unwrap_used)]
// End-to-end controller tests against a mocked InfoPoint server.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use busmap_core::{
    ConnectionState, Controller, ControllerConfig, CoreError, LoadPhase, RouteId, VehicleId,
};

const TRACE_KML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Style id="line"><LineStyle><color>ff0000ff</color><width>4</width></LineStyle></Style>
    <Placemark>
      <name>B43</name>
      <styleUrl>#line</styleUrl>
      <LineString><coordinates>-72.63,42.32,0 -72.52,42.37,0 -72.51,42.39,0</coordinates></LineString>
    </Placemark>
  </Document>
</kml>"#;

// ── Helpers ─────────────────────────────────────────────────────────

fn route_details() -> Value {
    json!([
        {
            "RouteId": 20030,
            "RouteAbbreviation": "B43",
            "LongName": "Northampton - Amherst",
            "Color": "0C6CB4",
            "TextColor": "FFFFFF",
            "SortOrder": 1,
            "IsVisible": true,
            "RouteTraceFilename": "B43.kml",
            "RouteTraceHash64": "h1",
            "Stops": [{ "StopId": 64, "Name": "Haigis Mall", "Latitude": 42.386, "Longitude": -72.525 }],
            "Messages": [{ "MessageId": 7, "Message": "Detour on North Pleasant", "Published": true, "Priority": 1 }]
        },
        {
            "RouteId": 20031,
            "RouteAbbreviation": "R29",
            "Color": "F4A000",
            "SortOrder": 2,
            "IsVisible": true,
            "RouteTraceFilename": "R29.kml",
            "RouteTraceHash64": "h2"
        }
    ])
}

fn vehicles() -> Value {
    json!([
        {
            "VehicleId": 3201,
            "Name": "3201",
            "RouteId": 20030,
            "Latitude": 42.37,
            "Longitude": -72.52,
            "Heading": 45,
            "Deviation": 2,
            "Direction": "N",
            "Destination": "UMass"
        }
    ])
}

async fn mount_routes(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/InfoPoint/rest/RouteDetails/GetAllRouteDetails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(route_details()))
        .mount(server)
        .await;
}

async fn mount_vehicles(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/InfoPoint/rest/Vehicles/GetAllVehiclesForRoutes"))
        .and(query_param("routeIDs", "20030,20031"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_trace(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/InfoPoint/Resources/Traces/B43.kml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TRACE_KML))
        .mount(server)
        .await;
}

const VEHICLES_PATH: &str = "/InfoPoint/rest/Vehicles/GetAllVehiclesForRoutes";

async fn vehicle_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == VEHICLES_PATH)
        .count()
}

async fn wait_for_vehicle_requests(server: &MockServer, at_least: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while vehicle_requests(server).await < at_least {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

async fn wait_for_traces(controller: &Controller, count: usize) {
    let mut traces = controller.traces();
    tokio::time::timeout(Duration::from_secs(5), traces.wait_for(|t| t.len() >= count))
        .await
        .unwrap()
        .unwrap();
}

fn config(server: &MockServer) -> ControllerConfig {
    let base = Url::parse(&format!("{}/InfoPoint", server.uri())).unwrap();
    let mut config = ControllerConfig::new(base);
    config.poll_interval = Duration::ZERO;
    config.timeout = Duration::from_secs(5);
    config
}

// ── Connect ─────────────────────────────────────────────────────────

#[tokio::test]
async fn connect_loads_routes_vehicles_and_active_traces() {
    let server = MockServer::start().await;
    mount_routes(&server).await;
    mount_vehicles(&server, vehicles()).await;
    mount_trace(&server).await;

    let controller = Controller::new(config(&server));
    assert_eq!(controller.phase(), LoadPhase::Initializing);

    assert_eq!(controller.connect().await.unwrap(), 1);

    assert_eq!(*controller.connection_state().borrow(), ConnectionState::Connected);
    assert_eq!(controller.phase(), LoadPhase::Live);
    assert!(controller.store().last_route_refresh().is_some());
    assert!(controller.store().data_age().is_some());
    assert_eq!(controller.routes_snapshot().len(), 2);
    assert_eq!(controller.stops_snapshot().len(), 1);
    assert_eq!(controller.alerts_snapshot().len(), 1);

    let vehicles = controller.vehicles_snapshot();
    assert_eq!(vehicles.len(), 1);
    assert_eq!(vehicles[0].id, VehicleId(3201));

    // Only B43 has a bus on the road, so only its trace is fetched.
    wait_for_traces(&controller, 1).await;
    let traces = controller.traces_snapshot();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].route_id, RouteId(20030));
    assert_eq!(traces[0].hash.as_deref(), Some("h1"));

    let layers = controller.route_layers();
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].color.as_str(), "0C6CB4");

    let markers = controller.vehicle_markers();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].label, "B43");

    controller.disconnect().await;
    assert_eq!(
        *controller.connection_state().borrow(),
        ConnectionState::Disconnected
    );
}

#[tokio::test]
async fn connect_fails_when_route_details_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/InfoPoint/rest/RouteDetails/GetAllRouteDetails"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let controller = Controller::new(config(&server));
    let err = controller.connect().await.unwrap_err();

    assert!(matches!(err, CoreError::Api { status: Some(500), .. }));
    assert_eq!(*controller.connection_state().borrow(), ConnectionState::Failed);
    assert!(matches!(
        controller.poll_vehicles().await,
        Err(CoreError::NotConnected)
    ));
}

// ── Vehicle polling ─────────────────────────────────────────────────

#[tokio::test]
async fn null_vehicle_response_keeps_snapshot_and_goes_live() {
    let server = MockServer::start().await;
    mount_routes(&server).await;
    mount_vehicles(&server, Value::Null).await;

    let mut cfg = config(&server);
    cfg.trace_loading = false;
    let controller = Controller::new(cfg);
    controller.connect().await.unwrap();

    assert!(controller.vehicles_snapshot().is_empty());
    assert_eq!(controller.phase(), LoadPhase::Live);
    assert_eq!(controller.poll_vehicles().await.unwrap(), None);
    assert!(controller.traces_snapshot().is_empty());
}

#[tokio::test]
async fn background_poll_replaces_vehicles() {
    let server = MockServer::start().await;
    mount_routes(&server).await;
    mount_trace(&server).await;
    Mock::given(method("GET"))
        .and(path("/InfoPoint/rest/Vehicles/GetAllVehiclesForRoutes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_vehicles(&server, vehicles()).await;

    let mut cfg = config(&server);
    cfg.poll_interval = Duration::from_millis(50);
    let controller = Controller::new(cfg);
    controller.connect().await.unwrap();
    assert!(controller.vehicles_snapshot().is_empty());

    let mut stream = controller.vehicles();
    let snap = tokio::time::timeout(Duration::from_secs(5), stream.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snap.len(), 1);

    // The newly active route gets its trace on the same tick.
    wait_for_traces(&controller, 1).await;
    assert_eq!(controller.traces_snapshot().len(), 1);

    controller.disconnect().await;
}

// ── Traces ──────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_trace_is_skipped() {
    let server = MockServer::start().await;
    mount_routes(&server).await;
    mount_vehicles(&server, vehicles()).await;
    Mock::given(method("GET"))
        .and(path("/InfoPoint/Resources/Traces/B43.kml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut cfg = config(&server);
    cfg.trace_loading = false;
    let controller = Controller::new(cfg);
    controller.connect().await.unwrap();

    assert_eq!(controller.load_active_traces().await, 0);
    assert!(controller.traces_snapshot().is_empty());
    assert_eq!(controller.vehicles_snapshot().len(), 1);
    assert!(controller.route_layers().is_empty());
}

#[tokio::test]
async fn route_trace_fetches_on_demand_and_caches() {
    let server = MockServer::start().await;
    mount_routes(&server).await;
    mount_vehicles(&server, json!([])).await;
    Mock::given(method("GET"))
        .and(path("/InfoPoint/Resources/Traces/R29.kml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TRACE_KML))
        .expect(1)
        .mount(&server)
        .await;

    let controller = Controller::new(config(&server));
    controller.connect().await.unwrap();

    let first = controller.route_trace(RouteId(20031)).await.unwrap();
    assert_eq!(first.geojson.features.len(), 1);
    let second = controller.route_trace(RouteId(20031)).await.unwrap();
    assert_eq!(first.fetched_at, second.fetched_at);

    let err = controller.route_trace(RouteId(1)).await.unwrap_err();
    assert!(matches!(err, CoreError::RouteNotFound { .. }));
}

// ── One-shot ────────────────────────────────────────────────────────

#[tokio::test]
async fn oneshot_runs_closure_and_disconnects() {
    let server = MockServer::start().await;
    mount_routes(&server).await;
    mount_vehicles(&server, vehicles()).await;

    let mut cfg = config(&server);
    cfg.trace_loading = false;
    cfg.poll_interval = Duration::from_secs(5);

    let count = Controller::oneshot(cfg, |c| async move { Ok(c.vehicles_snapshot().len()) })
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn export_map_combines_layers_and_markers() {
    let server = MockServer::start().await;
    mount_routes(&server).await;
    mount_vehicles(&server, vehicles()).await;
    mount_trace(&server).await;

    let fc = Controller::oneshot(config(&server), |c| async move {
        assert!(c.traces_snapshot().is_empty());
        c.load_active_traces().await;
        Ok(c.export_map())
    })
    .await
    .unwrap();

    assert_eq!(fc.features.len(), 2);
    assert!(fc.foreign_members.unwrap().contains_key("map"));
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn failed_poll_keeps_previous_snapshot_and_clock() {
    let server = MockServer::start().await;
    mount_routes(&server).await;
    Mock::given(method("GET"))
        .and(path(VEHICLES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(vehicles()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(VEHICLES_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&server)
        .await;

    let mut cfg = config(&server);
    cfg.trace_loading = false;
    cfg.poll_interval = Duration::from_millis(20);
    let controller = Controller::new(cfg);
    controller.connect().await.unwrap();
    let polled_at = controller.store().last_vehicle_poll();
    assert!(polled_at.is_some());

    wait_for_vehicle_requests(&server, 4).await;

    assert_eq!(controller.vehicles_snapshot().len(), 1);
    assert_eq!(controller.store().last_vehicle_poll(), polled_at);
    assert_eq!(controller.phase(), LoadPhase::Live);
    assert_eq!(*controller.connection_state().borrow(), ConnectionState::Connected);

    controller.disconnect().await;
}

#[tokio::test]
async fn no_fetches_after_disconnect() {
    let server = MockServer::start().await;
    mount_routes(&server).await;
    mount_vehicles(&server, vehicles()).await;

    let mut cfg = config(&server);
    cfg.trace_loading = false;
    cfg.poll_interval = Duration::from_millis(20);
    let controller = Controller::new(cfg);
    controller.connect().await.unwrap();
    wait_for_vehicle_requests(&server, 3).await;

    controller.disconnect().await;
    let settled = vehicle_requests(&server).await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(vehicle_requests(&server).await, settled);
    assert!(matches!(
        controller.poll_vehicles().await,
        Err(CoreError::NotConnected)
    ));
}

#[tokio::test]
async fn reconnect_replaces_the_previous_connection() {
    let server = MockServer::start().await;
    mount_routes(&server).await;
    mount_vehicles(&server, vehicles()).await;

    let mut cfg = config(&server);
    cfg.trace_loading = false;
    cfg.poll_interval = Duration::from_millis(20);
    let controller = Controller::new(cfg);

    let first = controller.connect().await.unwrap();
    let second = controller.connect().await.unwrap();
    assert_eq!((first, second), (1, 2));

    // A stale owner cannot tear down the newer connection.
    assert!(!controller.disconnect_if_current(first).await);
    assert_eq!(*controller.connection_state().borrow(), ConnectionState::Connected);

    // Overlapping connect and stale disconnect settle on the new connection
    // whichever takes the lifecycle lock first.
    let (third, _) = tokio::join!(
        controller.connect(),
        controller.disconnect_if_current(second)
    );
    let third = third.unwrap();
    assert_eq!(third, 3);
    assert_eq!(controller.generation(), 3);
    assert_eq!(*controller.connection_state().borrow(), ConnectionState::Connected);
    assert_eq!(controller.vehicles_snapshot().len(), 1);

    assert!(controller.disconnect_if_current(third).await);
    assert_eq!(
        *controller.connection_state().borrow(),
        ConnectionState::Disconnected
    );

    // Neither of the replaced connections left a poll task behind.
    let settled = vehicle_requests(&server).await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(vehicle_requests(&server).await, settled);
}

#[tokio::test]
async fn full_refresh_loads_traces_before_returning() {
    let server = MockServer::start().await;
    mount_routes(&server).await;
    mount_vehicles(&server, vehicles()).await;
    mount_trace(&server).await;

    let controller = Controller::new(config(&server));
    controller.connect().await.unwrap();
    controller.full_refresh().await.unwrap();

    assert_eq!(controller.traces_snapshot().len(), 1);
    assert_eq!(controller.vehicles_snapshot().len(), 1);
    controller.disconnect().await;
}
