//! Shared helpers for command handlers.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};

use busmap_core::{Controller, Route, RouteId};

use crate::error::CliError;

/// Resolve a route by abbreviation, short name, or numeric id.
pub fn resolve_route(controller: &Controller, identifier: &str) -> Result<Arc<Route>, CliError> {
    controller
        .store()
        .route_by_label(identifier)
        .ok_or_else(|| CliError::route_not_found(identifier))
}

/// Resolve an optional `--route` filter to a route id.
pub fn resolve_route_filter(
    controller: &Controller,
    identifier: Option<&str>,
) -> Result<Option<RouteId>, CliError> {
    identifier
        .map(|id| resolve_route(controller, id).map(|r| r.id))
        .transpose()
}

/// Route label for an id, or `?` when the route is unknown.
pub fn route_label(controller: &Controller, id: RouteId) -> String {
    controller
        .store()
        .route_by_id(id)
        .map_or_else(|| "?".into(), |r| r.label())
}

pub fn local_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_default()
}
