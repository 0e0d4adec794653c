//! Integration tests for the `busmap` CLI binary.
//!
//! Argument parsing, help output, shell completions, and error handling run
//! without network access. The end-to-end section drives the binary
//! against a mocked InfoPoint server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `busmap` binary with env isolation.
///
/// Clears all `BUSMAP_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn busmap_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("busmap");
    cmd.env("HOME", "/tmp/busmap-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/busmap-cli-test-nonexistent")
        .env_remove("BUSMAP_PROFILE")
        .env_remove("BUSMAP_BASE_URL")
        .env_remove("BUSMAP_OUTPUT")
        .env_remove("BUSMAP_TIMEOUT")
        .env_remove("BUSMAP_POLL_INTERVAL")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = busmap_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    busmap_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("PVTA")
            .and(predicate::str::contains("routes"))
            .and(predicate::str::contains("vehicles"))
            .and(predicate::str::contains("export")),
    );
}

#[test]
fn test_version_flag() {
    busmap_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("busmap"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    busmap_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    busmap_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = busmap_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let output = busmap_cmd()
        .args(["--output", "invalid", "routes", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("possible values") || text.contains("invalid value"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_invalid_base_url_is_usage_error() {
    busmap_cmd()
        .args(["--base-url", "not a url", "routes", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("base-url"));
}

#[test]
fn test_unknown_profile() {
    busmap_cmd()
        .args(["--profile", "nowhere", "routes", "list"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("nowhere"));
}

#[test]
fn test_unreachable_infopoint() {
    busmap_cmd()
        .args([
            "--base-url",
            "http://127.0.0.1:9/InfoPoint",
            "--timeout",
            "2",
            "routes",
            "list",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("InfoPoint"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    busmap_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bustracker.pvta.com"));
}

#[test]
fn test_config_path() {
    busmap_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_subcommands_exist() {
    busmap_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("set-tile-key")),
        );
}

// ── End-to-end against a mock InfoPoint ─────────────────────────────

const TRACE_KML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2"><Document><Placemark>
  <name>B43</name>
  <LineString><coordinates>-72.63,42.32 -72.52,42.37</coordinates></LineString>
</Placemark></Document></kml>"#;

async fn mock_infopoint() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/InfoPoint/rest/RouteDetails/GetAllRouteDetails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "RouteId": 20030,
                "RouteAbbreviation": "B43",
                "LongName": "Northampton - Amherst",
                "Color": "0C6CB4",
                "SortOrder": 1,
                "RouteTraceFilename": "B43.kml",
                "RouteTraceHash64": "h1",
                "Stops": [{ "StopId": 64, "Name": "Haigis Mall", "Latitude": 42.386, "Longitude": -72.525 }]
            },
            { "RouteId": 20031, "RouteAbbreviation": "R29", "Color": "F4A000", "SortOrder": 2 }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/InfoPoint/rest/Vehicles/GetAllVehiclesForRoutes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "VehicleId": 3201, "Name": "3201", "RouteId": 20030,
                "Latitude": 42.37, "Longitude": -72.52,
                "Direction": "N", "Destination": "UMass", "Deviation": 0
            },
            {
                "VehicleId": 9999, "Name": "9999", "RouteId": 55555,
                "Latitude": 42.30, "Longitude": -72.60,
                "Direction": "S", "Destination": "Garage"
            }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/InfoPoint/Resources/Traces/B43.kml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TRACE_KML))
        .mount(&server)
        .await;

    server
}

/// Run the binary on a blocking thread so the mock server keeps serving.
async fn run_against(server: &MockServer, args: &[&str]) -> std::process::Output {
    let base = format!("{}/InfoPoint", server.uri());
    let args: Vec<String> = args.iter().map(|s| (*s).to_owned()).collect();
    tokio::task::spawn_blocking(move || {
        busmap_cmd()
            .arg("--base-url")
            .arg(base)
            .args(args)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_routes_list_plain() {
    let server = mock_infopoint().await;
    let output = run_against(&server, &["-o", "plain", "routes", "list"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "B43\nR29");

    let active = run_against(&server, &["-o", "plain", "routes", "list", "--active"]).await;
    assert_eq!(String::from_utf8_lossy(&active.stdout).trim(), "B43");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_vehicles_list_keeps_unknown_routes() {
    let server = mock_infopoint().await;
    let output = run_against(&server, &["--color", "never", "vehicles", "list"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("UMass"));
    assert!(stdout.contains("Garage"));
    assert!(stdout.contains('?'), "unknown route shown as '?':\n{stdout}");

    let filtered = run_against(&server, &["-o", "plain", "vehicles", "list", "--route", "b43"]).await;
    assert_eq!(String::from_utf8_lossy(&filtered.stdout).trim(), "3201");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_route_is_not_found() {
    let server = mock_infopoint().await;
    let output = run_against(&server, &["routes", "get", "X99"]).await;
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("busmap routes list"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_trace_outputs_styled_geojson() {
    let server = mock_infopoint().await;
    let output = run_against(&server, &["trace", "B43"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let doc: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["type"], "FeatureCollection");
    let props = &doc["features"][0]["properties"];
    assert_eq!(props["stroke"], "#0C6CB4");
    assert_eq!(props["name"], "B43");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_icon_writes_svg_file() {
    let server = mock_infopoint().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("b43.svg");

    let output = run_against(&server, &["icon", "B43", "--out", file.to_str().unwrap()]).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let svg = std::fs::read_to_string(&file).unwrap();
    assert!(svg.contains(r##"fill="#0C6CB4""##));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_combines_traces_and_markers() {
    let server = mock_infopoint().await;
    let output = run_against(&server, &["-o", "json-compact", "export"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let doc: Value = serde_json::from_slice(&output.stdout).unwrap();
    let features = doc["features"].as_array().unwrap();
    // One trace line plus one marker; the bus on an unknown route has none.
    assert_eq!(features.len(), 2);
    assert_eq!(features[1]["properties"]["title"], "Route B43");
    assert_eq!(doc["map"]["zoom"], 13);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_prints_status_lines() {
    let server = mock_infopoint().await;
    let output = run_against(&server, &["watch", "--count", "2", "--interval", "1"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("2 vehicles"));
    assert!(lines[1].ends_with("Only showing active routes"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_global_poll_interval_drives_watch() {
    let server = mock_infopoint().await;
    let output = run_against(&server, &["--poll-interval", "1", "watch", "--count", "2"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).lines().count(), 2);
}

#[test]
fn test_zero_poll_interval_is_usage_error() {
    busmap_cmd()
        .args(["--poll-interval", "0", "watch"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("poll-interval"));
}
