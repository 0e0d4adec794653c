// ── Domain model ──
//
// Clean types built from InfoPoint wire records. Consumers (CLI, TUI) only
// see these; `busmap_api::models` stays behind the conversion layer.

pub mod alert;
pub mod color;
pub mod ids;
pub mod route;
pub mod stop;
pub mod trace;
pub mod vehicle;

pub use alert::ServiceAlert;
pub use color::HexColor;
pub use ids::{MessageId, RouteId, StopId, VehicleId};
pub use route::{Direction, Route};
pub use stop::Stop;
pub use trace::RouteTrace;
pub use vehicle::Vehicle;
