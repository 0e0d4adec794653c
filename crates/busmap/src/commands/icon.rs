//! Bus marker icon.

use busmap_core::Controller;
use busmap_core::map::marker_svg;

use crate::cli::{GlobalOpts, IconArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub fn handle(controller: &Controller, args: IconArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let route = util::resolve_route(controller, &args.route)?;
    let svg = marker_svg(&route.color);
    output::write_document(&svg, args.out.out.as_deref(), global.quiet)
}
