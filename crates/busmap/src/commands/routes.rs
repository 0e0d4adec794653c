//! Route command handlers.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

use tabled::Tabled;

use busmap_core::{Controller, Route, RouteId};

use crate::cli::{GlobalOpts, RoutesArgs, RoutesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct RouteRow {
    #[tabled(rename = "Route")]
    route: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Vehicles")]
    vehicles: usize,
    #[tabled(rename = "Alerts")]
    alerts: usize,
}

fn route_row(controller: &Controller, r: &Route, colored: bool) -> RouteRow {
    RouteRow {
        route: r.label(),
        name: r.long_name.clone().unwrap_or_default(),
        color: output::color_swatch(&r.color, colored),
        vehicles: controller.store().vehicles_for_route(r.id).len(),
        alerts: r.alert_ids.len(),
    }
}

fn detail(controller: &Controller, r: &Route) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Route:       {}", r.label());
    let _ = writeln!(out, "ID:          {}", r.id);
    if let Some(ref name) = r.long_name {
        let _ = writeln!(out, "Name:        {name}");
    }
    let _ = writeln!(out, "Color:       {}", r.color.css());
    if let Some(ref group) = r.group {
        let _ = writeln!(out, "Group:       {group}");
    }
    let directions: Vec<&str> = r
        .directions
        .iter()
        .map(|d| d.description.as_deref().unwrap_or(&d.code))
        .collect();
    let _ = writeln!(out, "Directions:  {}", directions.join(", "));
    let _ = writeln!(out, "Stops:       {}", r.stop_ids.len());
    let _ = writeln!(
        out,
        "Vehicles:    {}",
        controller.store().vehicles_for_route(r.id).len()
    );
    let _ = writeln!(out, "Alerts:      {}", r.alert_ids.len());
    let _ = write!(
        out,
        "Trace file:  {}",
        r.trace_filename.as_deref().unwrap_or("(none)")
    );
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(
    controller: &Controller,
    args: RoutesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let colored = output::should_color(global.color);

    match args.command {
        RoutesCommand::List { active } => {
            let snap = controller.routes_snapshot();
            let routes: Vec<Arc<Route>> = if active {
                let ids: HashSet<RouteId> =
                    controller.store().active_route_ids().into_iter().collect();
                snap.iter().filter(|r| ids.contains(&r.id)).cloned().collect()
            } else {
                snap.iter().cloned().collect()
            };

            let out = output::render_list(
                global.output,
                &routes,
                |r| route_row(controller, r, colored),
                |r| r.label(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RoutesCommand::Get { route } => {
            let route = util::resolve_route(controller, &route)?;
            let out = output::render_single(
                global.output,
                &route,
                |r| detail(controller, r),
                |r| r.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
