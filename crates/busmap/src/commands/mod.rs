//! Command dispatch: bridges CLI args -> controller snapshots -> output.

pub mod alerts;
pub mod config_cmd;
pub mod export;
pub mod icon;
pub mod routes;
pub mod stops;
pub mod trace;
pub mod util;
pub mod vehicles;
pub mod watch;

use std::time::Duration;

use busmap_core::{Controller, ControllerConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an InfoPoint-bound command.
///
/// `watch` keeps polling; everything else runs against a single snapshot
/// and disconnects afterwards.
pub async fn dispatch(
    cmd: Command,
    config: ControllerConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Command::Watch(args) = cmd {
        return watch::handle(config, args, global).await;
    }

    let mut config = config;
    config.poll_interval = Duration::ZERO;
    let controller = Controller::new(config);
    controller.connect().await?;

    let result = match cmd {
        Command::Routes(args) => routes::handle(&controller, args, global),
        Command::Vehicles(args) => vehicles::handle(&controller, args, global),
        Command::Stops(args) => stops::handle(&controller, args, global),
        Command::Alerts(args) => alerts::handle(&controller, args, global),
        Command::Trace(args) => trace::handle(&controller, args, global).await,
        Command::Icon(args) => icon::handle(&controller, args, global),
        Command::Export(args) => export::handle(&controller, args, global).await,
        // Handled before connecting
        Command::Watch(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    };

    controller.disconnect().await;
    result
}
