#![allow(clippy::unwrap_used)]
// Integration tests for `InfoPointClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use busmap_api::{Error, InfoPointClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, InfoPointClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/InfoPoint", server.uri())).unwrap();
    let client = InfoPointClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn rest_path(suffix: &str) -> String {
    format!("/InfoPoint/rest/{suffix}")
}

// ── Route details ───────────────────────────────────────────────────

#[tokio::test]
async fn test_list_route_details() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(rest_path("RouteDetails/GetAllRouteDetails")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "RouteId": 20030,
                "RouteAbbreviation": "B43",
                "LongName": "Northampton - Amherst",
                "Color": "0C6CB4",
                "RouteTraceFilename": "B43.kml",
                "RouteTraceHash64": "h1",
                "IsVisible": true,
                "Stops": [{ "StopId": 64, "Name": "Haigis Mall", "Latitude": 42.386, "Longitude": -72.525 }],
                "Vehicles": []
            },
            { "RouteId": 20031, "RouteAbbreviation": "R29", "Stops": null }
        ])))
        .mount(&server)
        .await;

    let routes = client.list_route_details().await.unwrap();

    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0].route_abbreviation.as_deref(), Some("B43"));
    assert_eq!(routes[0].stops[0].stop_id, 64);
    assert_eq!(routes[0].route_trace_filename.as_deref(), Some("B43.kml"));
    assert!(routes[1].stops.is_empty());
}

#[tokio::test]
async fn test_null_route_details_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(rest_path("RouteDetails/GetAllRouteDetails")))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    assert!(client.list_route_details().await.unwrap().is_empty());
}

// ── Vehicles ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_vehicles_sends_comma_separated_ids() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(rest_path("Vehicles/GetAllVehiclesForRoutes")))
        .and(query_param("routeIDs", "1,2,3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "VehicleId": 3201,
                "Name": "3201",
                "RouteId": 2,
                "Latitude": 42.3732,
                "Longitude": -72.5199,
                "Destination": "UMass",
                "Direction": "N",
                "Deviation": 3,
                "LastUpdated": "/Date(1700000000000-0500)/"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let vehicles = client
        .list_vehicles_for_routes(&[1, 2, 3])
        .await
        .unwrap()
        .unwrap();

    assert_eq!(vehicles.len(), 1);
    assert_eq!(vehicles[0].vehicle_id, 3201);
    assert_eq!(vehicles[0].destination.as_deref(), Some("UMass"));
    assert_eq!(vehicles[0].deviation, Some(3));
}

#[tokio::test]
async fn test_null_vehicles_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(rest_path("Vehicles/GetAllVehiclesForRoutes")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_string("null"),
        )
        .mount(&server)
        .await;

    let vehicles = client.list_vehicles_for_routes(&[1]).await.unwrap();
    assert!(vehicles.is_none());
}

// ── Traces ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_trace_kml() {
    let (server, client) = setup().await;
    let kml = r#"<?xml version="1.0"?><kml xmlns="http://www.opengis.net/kml/2.2"><Document/></kml>"#;

    Mock::given(method("GET"))
        .and(path("/InfoPoint/Resources/Traces/B43.kml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(kml))
        .mount(&server)
        .await;

    assert_eq!(client.fetch_trace_kml("B43.kml").await.unwrap(), kml);
}

#[tokio::test]
async fn test_missing_trace_maps_to_http_404() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/InfoPoint/Resources/Traces/gone.kml"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let result = client.fetch_trace_kml("gone.kml").await;
    match &result {
        Err(e @ Error::Http { status, body }) => {
            assert_eq!(*status, 404);
            assert_eq!(body, "Not Found");
            assert!(e.is_not_found());
        }
        other => panic!("expected Http 404, got: {other:?}"),
    }
}

// ── Error handling ──────────────────────────────────────────────────

#[tokio::test]
async fn test_server_error_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(rest_path("RouteDetails/GetAllRouteDetails")))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client.list_route_details().await.unwrap_err();
    assert!(err.is_transient(), "expected transient error, got: {err:?}");
}

#[tokio::test]
async fn test_malformed_json_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(rest_path("Vehicles/GetAllVehiclesForRoutes")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.list_vehicles_for_routes(&[1]).await;
    assert!(
        matches!(result, Err(Error::Deserialization { ref body, .. }) if body.contains("oops")),
        "expected Deserialization error, got: {result:?}"
    );
}
