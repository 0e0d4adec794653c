//! Service alert command handlers.

use std::sync::Arc;

use tabled::Tabled;

use busmap_core::{Controller, ServiceAlert};

use crate::cli::{AlertsArgs, AlertsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Priority")]
    priority: i32,
    #[tabled(rename = "Routes")]
    routes: String,
    #[tabled(rename = "Message")]
    message: String,
}

fn alert_row(controller: &Controller, a: &ServiceAlert) -> AlertRow {
    AlertRow {
        id: a.id.to_string(),
        priority: a.priority,
        routes: a
            .route_ids
            .iter()
            .map(|id| util::route_label(controller, *id))
            .collect::<Vec<_>>()
            .join(", "),
        message: a.message.clone(),
    }
}

pub fn handle(
    controller: &Controller,
    args: AlertsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AlertsCommand::List(filter) => {
            let route = util::resolve_route_filter(controller, filter.route.as_deref())?;
            let alerts: Vec<Arc<ServiceAlert>> = controller
                .alerts_snapshot()
                .iter()
                .filter(|a| route.is_none_or(|id| a.route_ids.contains(&id)))
                .cloned()
                .collect();

            let out = output::render_list(
                global.output,
                &alerts,
                |a| alert_row(controller, a),
                |a| a.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
