// busmap-api: Async Rust client for the InfoPoint real-time transit API

pub mod error;
pub mod infopoint;
pub mod transport;

pub use error::Error;
pub use infopoint::InfoPointClient;
pub use infopoint::models;
pub use infopoint::models::parse_infopoint_date;
pub use transport::TransportConfig;
