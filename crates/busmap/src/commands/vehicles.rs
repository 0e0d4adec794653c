//! Vehicle command handlers.

use std::sync::Arc;

use tabled::Tabled;

use busmap_core::{Controller, Vehicle};

use crate::cli::{GlobalOpts, VehiclesArgs, VehiclesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct VehicleRow {
    #[tabled(rename = "Vehicle")]
    name: String,
    #[tabled(rename = "Route")]
    route: String,
    #[tabled(rename = "Destination")]
    destination: String,
    #[tabled(rename = "Direction")]
    direction: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Lat")]
    lat: String,
    #[tabled(rename = "Lon")]
    lon: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

fn vehicle_row(controller: &Controller, v: &Vehicle) -> VehicleRow {
    VehicleRow {
        name: v.name.clone(),
        route: util::route_label(controller, v.route_id),
        destination: v.destination.clone().unwrap_or_default(),
        direction: v.direction_label().to_owned(),
        status: v.schedule_label(),
        lat: format!("{:.5}", v.latitude),
        lon: format!("{:.5}", v.longitude),
        updated: util::local_time(v.last_updated),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(
    controller: &Controller,
    args: VehiclesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        VehiclesCommand::List(filter) => {
            let route = util::resolve_route_filter(controller, filter.route.as_deref())?;
            let vehicles: Vec<Arc<Vehicle>> = controller
                .vehicles_snapshot()
                .iter()
                .filter(|v| route.is_none_or(|id| v.route_id == id))
                .cloned()
                .collect();

            let out = output::render_list(
                global.output,
                &vehicles,
                |v| vehicle_row(controller, v),
                |v| v.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
