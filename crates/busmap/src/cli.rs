//! Clap derive structures for the `busmap` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// busmap -- live PVTA bus positions from the command line
#[derive(Debug, Parser)]
#[command(
    name = "busmap",
    version,
    about = "Live PVTA bus positions, routes, and traces",
    long_about = "Query the PVTA InfoPoint service for routes, vehicles, stops, and\n\
        service alerts. Route traces are converted from KML to GeoJSON, and the\n\
        full map (active routes plus vehicle markers) can be exported for any\n\
        web map.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "BUSMAP_PROFILE", global = true)]
    pub profile: Option<String>,

    /// InfoPoint base URL (overrides profile)
    #[arg(long, short = 'u', env = "BUSMAP_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "BUSMAP_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "BUSMAP_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Vehicle poll interval in seconds for live commands (overrides profile)
    #[arg(long, env = "BUSMAP_POLL_INTERVAL", global = true)]
    pub poll_interval: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List and inspect routes
    #[command(alias = "r")]
    Routes(RoutesArgs),

    /// Current vehicle positions
    #[command(alias = "v")]
    Vehicles(VehiclesArgs),

    /// Stops served by routes
    Stops(StopsArgs),

    /// Published service alerts
    Alerts(AlertsArgs),

    /// Route trace as styled GeoJSON
    Trace(TraceArgs),

    /// Bus marker SVG in a route's color
    Icon(IconArgs),

    /// Combined map as GeoJSON (active traces, vehicle markers, view)
    Export(ExportArgs),

    /// Poll vehicles continuously and print a status line per update
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Restrict a listing to one route.
#[derive(Debug, Args)]
pub struct RouteFilter {
    /// Route abbreviation, short name, or numeric id (e.g. "B43")
    #[arg(long, short = 'r')]
    pub route: Option<String>,
}

/// Where to write a document instead of stdout.
#[derive(Debug, Args)]
pub struct OutFile {
    /// Write to FILE instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ROUTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RoutesArgs {
    #[command(subcommand)]
    pub command: RoutesCommand,
}

#[derive(Debug, Subcommand)]
pub enum RoutesCommand {
    /// List routes
    #[command(alias = "ls")]
    List {
        /// Only routes with at least one vehicle on the road
        #[arg(long, short = 'a')]
        active: bool,
    },

    /// Get route details
    Get {
        /// Route abbreviation, short name, or numeric id
        route: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  VEHICLES / STOPS / ALERTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct VehiclesArgs {
    #[command(subcommand)]
    pub command: VehiclesCommand,
}

#[derive(Debug, Subcommand)]
pub enum VehiclesCommand {
    /// List vehicles from the latest poll
    #[command(alias = "ls")]
    List(RouteFilter),
}

#[derive(Debug, Args)]
pub struct StopsArgs {
    #[command(subcommand)]
    pub command: StopsCommand,
}

#[derive(Debug, Subcommand)]
pub enum StopsCommand {
    /// List stops
    #[command(alias = "ls")]
    List(RouteFilter),
}

#[derive(Debug, Args)]
pub struct AlertsArgs {
    #[command(subcommand)]
    pub command: AlertsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AlertsCommand {
    /// List published service alerts
    #[command(alias = "ls")]
    List(RouteFilter),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MAP DOCUMENTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TraceArgs {
    /// Route abbreviation, short name, or numeric id
    pub route: String,

    #[command(flatten)]
    pub out: OutFile,
}

#[derive(Debug, Args)]
pub struct IconArgs {
    /// Route abbreviation, short name, or numeric id
    pub route: String,

    #[command(flatten)]
    pub out: OutFile,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub out: OutFile,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after N vehicle updates (default: run until Ctrl+C)
    #[arg(long, short = 'n')]
    pub count: Option<u64>,

    /// Poll interval in seconds (overrides --poll-interval and profile)
    #[arg(long)]
    pub interval: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Store the map tile API key in the system keyring
    SetTileKey,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
