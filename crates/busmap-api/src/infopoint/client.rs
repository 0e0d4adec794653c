// InfoPoint HTTP client
//
// Wraps `reqwest::Client` with InfoPoint URL construction and response
// decoding. Endpoint groups (routes, vehicles, traces) are implemented as
// inherent methods in separate files to keep this module focused on
// transport mechanics.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Longest body excerpt carried in `Error::Http`.
const BODY_PREVIEW_CHARS: usize = 200;

/// Raw HTTP client for an InfoPoint deployment.
///
/// `base_url` is the InfoPoint root, e.g.
/// `https://bustracker.pvta.com/InfoPoint`. JSON endpoints live under
/// `{base}/rest/` and KML traces under `{base}/Resources/Traces/`.
pub struct InfoPointClient {
    http: reqwest::Client,
    base_url: Url,
}

impl InfoPointClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The InfoPoint base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/rest/{path}`
    pub fn rest_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/rest/{path}"))?)
    }

    /// `{base}/Resources/Traces/{filename}`, with the filename
    /// percent-encoded as a single path segment.
    pub fn trace_url(&self, filename: &str) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["Resources", "Traces", filename]);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// GET a URL and return the body as text, failing on non-2xx.
    pub(crate) async fn get_text(&self, url: Url) -> Result<String, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        resp.text().await.map_err(Error::Transport)
    }

    /// GET a URL and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
