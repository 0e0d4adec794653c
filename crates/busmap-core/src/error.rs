// ── Core error types ──
//
// User-facing errors from busmap-core. Consumers never see raw HTTP status
// codes or JSON parse failures; the `From<busmap_api::Error>` impl
// translates transport-layer errors into domain variants.

use thiserror::Error;

use crate::kml::KmlError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach InfoPoint at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("InfoPoint request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Not connected to InfoPoint")]
    NotConnected,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Route not found: {identifier}")]
    RouteNotFound { identifier: String },

    #[error("Vehicle not found: {identifier}")]
    VehicleNotFound { identifier: String },

    #[error("No trace available for route {route}: {reason}")]
    TraceUnavailable { route: String, reason: String },

    #[error("Route trace could not be converted: {0}")]
    Kml(#[from] KmlError),

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<busmap_api::Error> for CoreError {
    fn from(err: busmap_api::Error) -> Self {
        match err {
            busmap_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            busmap_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            busmap_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            busmap_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            busmap_api::Error::Http { status, body } => CoreError::Api {
                message: format!("HTTP {status}: {body}"),
                status: Some(status),
            },
            busmap_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
