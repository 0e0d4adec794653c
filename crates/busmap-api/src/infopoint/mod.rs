// InfoPoint REST API
//
// Route metadata, live vehicle positions, and KML route traces served by an
// Avail InfoPoint deployment.

pub mod client;
pub mod models;
mod routes;
mod traces;
mod vehicles;

pub use client::InfoPointClient;
