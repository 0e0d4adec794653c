//! Stop command handlers.

use std::sync::Arc;

use tabled::Tabled;

use busmap_core::{Controller, Stop};

use crate::cli::{GlobalOpts, StopsArgs, StopsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct StopRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Lat")]
    lat: String,
    #[tabled(rename = "Lon")]
    lon: String,
    #[tabled(rename = "Routes")]
    routes: String,
}

fn stop_row(controller: &Controller, s: &Stop) -> StopRow {
    StopRow {
        id: s.id.to_string(),
        name: s.name.clone(),
        lat: format!("{:.5}", s.latitude),
        lon: format!("{:.5}", s.longitude),
        routes: s
            .route_ids
            .iter()
            .map(|id| util::route_label(controller, *id))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

pub fn handle(
    controller: &Controller,
    args: StopsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        StopsCommand::List(filter) => {
            let route = util::resolve_route_filter(controller, filter.route.as_deref())?;
            let stops: Vec<Arc<Stop>> = controller
                .stops_snapshot()
                .iter()
                .filter(|s| route.is_none_or(|id| s.route_ids.contains(&id)))
                .cloned()
                .collect();

            let out = output::render_list(
                global.output,
                &stops,
                |s| stop_row(controller, s),
                |s| s.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
