//! Reactive data layer between `busmap-api` and UI consumers (CLI / TUI).
//!
//! - **[`Controller`]** owns the lifecycle: [`connect()`](Controller::connect)
//!   loads route details and the first vehicle snapshot, then spawns a poll
//!   task that refreshes vehicles on a fixed period. Traces for active routes
//!   are fetched lazily, converted from KML to GeoJSON, and cached.
//!   [`Controller::oneshot()`](Controller::oneshot) runs a single cycle for
//!   CLI invocations.
//!
//! - **[`DataStore`]** holds routes, vehicles, stops, alerts, and traces in
//!   `EntityCollection<T>` (`DashMap` + `tokio::sync::watch`), replacing each
//!   collection wholesale on every fetch.
//!
//! - **[`EntityStream<T>`]** is the subscription handle the TUI renders from.
//!
//! - **[`kml`]** converts KML documents to GeoJSON; **[`map`]** turns
//!   snapshots into markers, route layers, and an exportable map document.

pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod kml;
pub mod map;
pub mod model;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ControllerConfig;
pub use controller::{ConnectionState, Controller};
pub use error::CoreError;
pub use kml::KmlError;
pub use map::MapView;
pub use store::{DataStore, LoadPhase};
pub use stream::EntityStream;

pub use model::{
    Direction, HexColor, MessageId, Route, RouteId, RouteTrace, ServiceAlert, Stop, StopId,
    Vehicle, VehicleId,
};
