//! Live polling with a status line per update.

use chrono::Local;

use busmap_core::map::{StatusLine, clock_label, vehicle_count_label};
use busmap_core::{Controller, ControllerConfig};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;

fn status_line(controller: &Controller) -> String {
    format!(
        "{}  {}  {}",
        clock_label(&Local::now()),
        vehicle_count_label(controller.store().vehicle_count()),
        StatusLine::from(controller.phase())
    )
}

pub async fn handle(
    config: ControllerConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut config = config;
    if let Some(secs) = args.interval {
        config.poll_interval = crate::config::poll_interval(secs, "interval")?;
    }

    let controller = Controller::new(config);
    let mut polls = controller.subscribe_vehicle_polls();
    controller.connect().await?;
    polls.mark_unchanged();

    let mut updates: u64 = 0;
    let mut emit = |controller: &Controller| {
        updates += 1;
        if !global.quiet {
            println!("{}", status_line(controller));
        }
        args.count.is_some_and(|n| updates >= n)
    };

    let mut done = emit(&controller);
    while !done {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = polls.changed() => {
                if changed.is_err() {
                    break;
                }
                done = emit(&controller);
            }
        }
    }

    controller.disconnect().await;
    Ok(())
}
