//! All UI actions. Actions are the only way state changes.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use busmap_core::{LoadPhase, Route, RouteTrace, ServiceAlert, Vehicle, VehicleId};

use crate::screen::ScreenId;

/// Route list filter on the routes screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteFilter {
    #[default]
    All,
    Active,
}

impl RouteFilter {
    pub const LABELS: [&'static str; 2] = ["All", "Active"];

    pub fn index(self) -> usize {
        match self {
            Self::All => 0,
            Self::Active => 1,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::All => Self::Active,
            Self::Active => Self::All,
        }
    }
}

/// Sort column on the vehicles screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VehicleSort {
    #[default]
    Route,
    Name,
    Destination,
    Schedule,
    Updated,
}

impl VehicleSort {
    pub fn next(self) -> Self {
        match self {
            Self::Route => Self::Name,
            Self::Name => Self::Destination,
            Self::Destination => Self::Schedule,
            Self::Schedule => Self::Updated,
            Self::Updated => Self::Route,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    GoBack,
    ToggleHelp,

    // ── Data events (from busmap-core streams) ────────────────────
    RoutesUpdated(Arc<Vec<Arc<Route>>>),
    VehiclesUpdated(Arc<Vec<Arc<Vehicle>>>),
    AlertsUpdated(Arc<Vec<Arc<ServiceAlert>>>),
    TracesUpdated(Arc<Vec<Arc<RouteTrace>>>),
    PhaseChanged(LoadPhase),
    VehiclesPolled(DateTime<Utc>),

    // ── Connection status ─────────────────────────────────────────
    Connecting,
    Connected,
    Disconnected(String),
    Reconnect,

    // ── Screen-local ──────────────────────────────────────────────
    FilterRoutes(RouteFilter),
    SortVehicles(VehicleSort),
    OpenVehicleDetail(VehicleId),
    CloseDetail,
    /// Jump to the map with this vehicle selected.
    ShowOnMap(VehicleId),
}
