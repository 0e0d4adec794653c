// InfoPoint vehicle endpoints

use tracing::debug;

use crate::error::Error;
use crate::infopoint::client::InfoPointClient;
use crate::infopoint::models::RouteVehicle;

impl InfoPointClient {
    /// Current positions of all vehicles serving the given routes.
    ///
    /// `GET /rest/Vehicles/GetAllVehiclesForRoutes?routeIDs=1,2,3`
    ///
    /// Returns `Ok(None)` when InfoPoint answers with a JSON `null`, which it
    /// does intermittently; callers should keep their previous snapshot.
    pub async fn list_vehicles_for_routes(
        &self,
        route_ids: &[u32],
    ) -> Result<Option<Vec<RouteVehicle>>, Error> {
        let mut url = self.rest_url("Vehicles/GetAllVehiclesForRoutes")?;
        let ids = route_ids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        // Commas must stay literal; `query_pairs_mut` would encode them.
        url.set_query(Some(&format!("routeIDs={ids}")));

        let vehicles: Option<Vec<RouteVehicle>> = self.get_json(url).await?;
        debug!(
            routes = route_ids.len(),
            vehicles = vehicles.as_ref().map(Vec::len),
            "fetched vehicles"
        );
        Ok(vehicles)
    }
}
