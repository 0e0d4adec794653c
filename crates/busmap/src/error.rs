//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use busmap_config::ConfigError;
use busmap_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach InfoPoint at {url}: {reason}")]
    #[diagnostic(
        code(busmap::connection_failed),
        help(
            "Check your network connection and the InfoPoint URL.\n\
             URL: {url}\n\
             Override it with: busmap --base-url <URL> ..."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(busmap::not_found),
        help("Run: busmap {list_command}")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("No trace available for route {route}: {reason}")]
    #[diagnostic(code(busmap::trace_unavailable))]
    TraceUnavailable { route: String, reason: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("InfoPoint error: {message}")]
    #[diagnostic(code(busmap::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(busmap::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(busmap::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: busmap config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(busmap::config))]
    Config(#[from] ConfigError),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(busmap::timeout),
        help("Increase timeout with --timeout or try again later.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    #[diagnostic(code(busmap::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    #[diagnostic(code(busmap::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub fn route_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: "route".into(),
            identifier: identifier.into(),
            list_command: "routes list".into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::NotConnected => CliError::ConnectionFailed {
                url: "(not connected)".into(),
                reason: "no active InfoPoint connection".into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::RouteNotFound { identifier } => CliError::route_not_found(identifier),

            CoreError::VehicleNotFound { identifier } => CliError::NotFound {
                resource_type: "vehicle".into(),
                identifier,
                list_command: "vehicles list".into(),
            },

            CoreError::TraceUnavailable { route, reason } => {
                CliError::TraceUnavailable { route, reason }
            }

            CoreError::Kml(e) => CliError::ApiError {
                message: format!("route trace is not valid KML: {e}"),
            },

            CoreError::Api { message, status: _ } | CoreError::Internal(message) => {
                CliError::ApiError { message }
            }

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}
