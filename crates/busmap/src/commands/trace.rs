//! Route trace export.

use busmap_core::Controller;
use busmap_core::map::RouteLayer;

use crate::cli::{GlobalOpts, OutputFormat, TraceArgs};
use crate::error::CliError;
use crate::output;

use super::util;

/// Fetch one route's KML trace and print it as styled GeoJSON.
pub async fn handle(
    controller: &Controller,
    args: TraceArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let route = util::resolve_route(controller, &args.route)?;
    let trace = controller.route_trace(route.id).await?;
    let fc = RouteLayer::from_trace(&trace).to_feature_collection();

    let compact = matches!(global.output, OutputFormat::JsonCompact);
    let doc = output::render_json(&fc, compact)?;
    output::write_document(&doc, args.out.out.as_deref(), global.quiet)
}
