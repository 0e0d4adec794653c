// InfoPoint route trace files

use tracing::debug;

use crate::error::Error;
use crate::infopoint::client::InfoPointClient;

impl InfoPointClient {
    /// Download a route's KML trace as raw text.
    ///
    /// `GET /Resources/Traces/{filename}`
    pub async fn fetch_trace_kml(&self, filename: &str) -> Result<String, Error> {
        let url = self.trace_url(filename)?;
        let kml = self.get_text(url).await?;
        debug!(filename, bytes = kml.len(), "fetched route trace");
        Ok(kml)
    }
}
