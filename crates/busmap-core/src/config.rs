// ── Runtime connection configuration ──
//
// Describes *where* InfoPoint lives and how often to poll it. Never touches
// disk: the CLI/TUI build a `ControllerConfig` and hand it in.

use std::time::Duration;

use url::Url;

use crate::map::MapView;

pub const DEFAULT_BASE_URL: &str = "https://bustracker.pvta.com/InfoPoint";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for one InfoPoint deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// InfoPoint root (e.g. `https://bustracker.pvta.com/InfoPoint`).
    pub base_url: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// Vehicle poll period. Zero disables background polling.
    pub poll_interval: Duration,
    /// Fetch KML traces for active routes.
    pub trace_loading: bool,
    /// Viewport and tile source handed to renderers.
    pub map: MapView,
}

impl ControllerConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            trace_loading: true,
            map: MapView::default(),
        }
    }
}
