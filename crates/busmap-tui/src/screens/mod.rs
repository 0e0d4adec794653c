//! Screen implementations. Each screen is a top-level Component.

pub mod alerts;
pub mod map;
pub mod routes;
pub mod vehicles;

use busmap_core::MapView;

use crate::component::Component;
use crate::screen::ScreenId;

/// Create screen components for the tab bar. The map opens on `view`.
pub fn create_screens(view: &MapView) -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (ScreenId::Map, Box::new(map::MapScreen::new(view))),
        (ScreenId::Vehicles, Box::new(vehicles::VehiclesScreen::new())),
        (ScreenId::Routes, Box::new(routes::RoutesScreen::new())),
        (ScreenId::Alerts, Box::new(alerts::AlertsScreen::new())),
    ]
}
