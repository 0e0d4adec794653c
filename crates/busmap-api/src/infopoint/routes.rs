// InfoPoint route endpoints

use tracing::debug;

use crate::error::Error;
use crate::infopoint::client::InfoPointClient;
use crate::infopoint::models::RouteDetails;

impl InfoPointClient {
    /// List every route with its stops, messages, and trace filename.
    ///
    /// `GET /rest/RouteDetails/GetAllRouteDetails`
    ///
    /// A `null` body is treated as no routes.
    pub async fn list_route_details(&self) -> Result<Vec<RouteDetails>, Error> {
        let url = self.rest_url("RouteDetails/GetAllRouteDetails")?;
        let routes: Option<Vec<RouteDetails>> = self.get_json(url).await?;
        let routes = routes.unwrap_or_default();
        debug!(count = routes.len(), "fetched route details");
        Ok(routes)
    }
}
