// ── Reactive data store ──
//
// Concurrent entity storage with push-based change notification.

pub(crate) mod collection;
mod data_store;
mod refresh;

pub use data_store::{DataStore, LoadPhase};
