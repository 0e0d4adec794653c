//! Data bridge: forwards [Controller] streams to TUI actions.
//!
//! Runs as a background task. It subscribes to the store's entity streams,
//! the load phase, the vehicle poll clock, and the connection state, then
//! sends every change as an [`Action`] through the TUI's action channel.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use busmap_core::{ConnectionState, Controller};

use crate::action::Action;

/// Connect the controller and stream its updates until `cancel` fires.
///
/// Subscriptions are taken before connecting so routes and vehicles reach
/// the screens while traces are still loading. A failed connect is reported
/// as [`Action::Disconnected`] and the task ends; the user can ask for
/// another attempt with [`Action::Reconnect`].
pub async fn spawn_data_bridge(
    controller: Controller,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let _ = action_tx.send(Action::Connecting);

    let mut routes = controller.routes();
    let mut vehicles = controller.vehicles();
    let mut alerts = controller.alerts();
    let mut traces = controller.traces();
    let mut phase = controller.subscribe_phase();
    let mut polls = controller.subscribe_vehicle_polls();
    let mut conn_state = controller.connection_state();
    conn_state.mark_unchanged();

    let connect = controller.connect();
    tokio::pin!(connect);
    let mut generation = None;

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            result = &mut connect, if generation.is_none() => match result {
                Ok(generation_id) => {
                    generation = Some(generation_id);
                    // Initial snapshots so screens have data immediately
                    let _ = action_tx.send(Action::RoutesUpdated(routes.latest()));
                    let _ = action_tx.send(Action::VehiclesUpdated(vehicles.latest()));
                    let _ = action_tx.send(Action::AlertsUpdated(alerts.latest()));
                    let _ = action_tx.send(Action::TracesUpdated(traces.latest()));
                    let _ = action_tx.send(Action::PhaseChanged(*phase.borrow_and_update()));
                    if let Some(at) = *polls.borrow_and_update() {
                        let _ = action_tx.send(Action::VehiclesPolled(at));
                    }
                    let _ = action_tx.send(Action::Connected);
                }
                Err(e) => {
                    warn!(error = %e, "failed to connect to InfoPoint");
                    let _ = action_tx.send(Action::Disconnected(e.to_string()));
                    return;
                }
            },

            Some(v) = vehicles.changed() => {
                debug!(count = v.len(), "dispatching VehiclesUpdated");
                let _ = action_tx.send(Action::VehiclesUpdated(v));
            }
            Some(r) = routes.changed() => {
                let _ = action_tx.send(Action::RoutesUpdated(r));
            }
            Some(a) = alerts.changed() => {
                let _ = action_tx.send(Action::AlertsUpdated(a));
            }
            Some(t) = traces.changed() => {
                debug!(count = t.len(), "dispatching TracesUpdated");
                let _ = action_tx.send(Action::TracesUpdated(t));
            }
            Ok(()) = phase.changed() => {
                let p = *phase.borrow_and_update();
                let _ = action_tx.send(Action::PhaseChanged(p));
            }
            Ok(()) = polls.changed() => {
                let polled = *polls.borrow_and_update();
                if let Some(at) = polled {
                    let _ = action_tx.send(Action::VehiclesPolled(at));
                }
            }
            Ok(()) = conn_state.changed() => {
                let state = *conn_state.borrow_and_update();
                let action = match state {
                    ConnectionState::Connected => Action::Connected,
                    ConnectionState::Connecting => Action::Connecting,
                    ConnectionState::Disconnected => Action::Disconnected("disconnected".into()),
                    ConnectionState::Failed => Action::Disconnected("connection failed".into()),
                };
                let _ = action_tx.send(action);
            }
        }
    }

    // A newer connect has already stopped this connection's tasks.
    if let Some(generation) = generation {
        controller.disconnect_if_current(generation).await;
    }
    debug!("data bridge shut down");
}
