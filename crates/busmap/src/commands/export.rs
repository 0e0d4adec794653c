//! Combined map export.

use busmap_core::Controller;

use crate::cli::{ExportArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Load traces for every active route, then print traces, vehicle markers,
/// and the map view as one FeatureCollection.
pub async fn handle(
    controller: &Controller,
    args: ExportArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let loaded = controller.load_active_traces().await;
    tracing::info!(loaded, "route traces ready for export");

    let fc = controller.export_map();
    let compact = matches!(global.output, OutputFormat::JsonCompact);
    let doc = output::render_json(&fc, compact)?;
    output::write_document(&doc, args.out.out.as_deref(), global.quiet)
}
