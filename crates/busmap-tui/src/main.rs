//! `busmap-tui`: live terminal map of PVTA buses.
//!
//! Built on [ratatui](https://ratatui.rs) with reactive data from
//! `busmap-core`'s [`EntityStream`](busmap_core::EntityStream). Screens are
//! navigable via number keys (1-4): Map, Vehicles, Routes, and Alerts.
//!
//! Logs are written to a file (default `/tmp/busmap-tui.log`) so they never
//! corrupt the terminal UI. A background data bridge task streams store
//! updates from the controller into the TUI action loop.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod viewport;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use busmap_config::Profile;
use busmap_core::{Controller, ControllerConfig};

use crate::app::App;

/// Live terminal map of PVTA buses and their routes.
#[derive(Parser, Debug)]
#[command(name = "busmap-tui", version, about)]
struct Cli {
    /// Config profile to use
    #[arg(short = 'p', long, env = "BUSMAP_PROFILE")]
    profile: Option<String>,

    /// InfoPoint root URL (overrides the profile)
    #[arg(short = 'u', long, env = "BUSMAP_BASE_URL")]
    base_url: Option<String>,

    /// Log file path
    #[arg(long, default_value = "/tmp/busmap-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. Anything on stdout/stderr would corrupt the TUI.
/// The returned guard must live as long as the app so logs get flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "busmap_tui={log_level},busmap_core={log_level},busmap_api={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("busmap-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Resolve the controller config: CLI flags > config profile > built-in
/// PVTA defaults.
fn build_config(cli: &Cli) -> Result<ControllerConfig> {
    let cfg = busmap_config::load_config_or_default();
    let profile_name = cfg.profile_name(cli.profile.as_deref());

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if cli.profile.is_some() => {
            return Err(eyre!("profile '{profile_name}' not found in config"));
        }
        None => Profile::default(),
    };

    let mut config = busmap_config::profile_to_controller_config(&profile, &profile_name)?;
    if let Some(ref raw) = cli.base_url {
        config.base_url = url::Url::parse(raw).map_err(|e| eyre!("invalid --base-url {raw}: {e}"))?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks go in before the terminal switches to raw mode
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);

    let config = build_config(&cli)?;
    info!(
        base_url = %config.base_url,
        poll_secs = config.poll_interval.as_secs(),
        "starting busmap-tui"
    );

    let mut app = App::new(Controller::new(config));
    app.run().await?;

    Ok(())
}
