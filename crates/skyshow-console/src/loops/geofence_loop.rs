//! Geofence worker.
//!
//! Triggers are debounced so a burst of position changes leads to a single
//! recompute. Status goes Computing → Ready or Error; an error keeps the last
//! good polygon.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use skyshow_core::GeofenceGenerator;

use crate::debounce::next_debounced;
use crate::loops::GeofenceTrigger;
use crate::sequence::CommitOutcome;
use crate::state::{ConsoleState, GeofenceStatus};

pub async fn run_geofence_loop(
    state: Arc<ConsoleState>,
    mut rx: mpsc::Receiver<GeofenceTrigger>,
    quiet: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Geofence loop shutting down");
                break;
            }
            maybe_trigger = next_debounced(&mut rx, quiet) => {
                match maybe_trigger {
                    Some(trigger) => {
                        dispatch(&state, trigger);
                    }
                    None => {
                        tracing::info!("Geofence trigger channel closed");
                        break;
                    }
                }
            }
        }
    }
}

pub fn dispatch(
    state: &Arc<ConsoleState>,
    trigger: GeofenceTrigger,
) -> Option<JoinHandle<CommitOutcome>> {
    let points = state.boundary_points();
    if points.is_empty() {
        tracing::debug!("No show positions, geofence cleared");
        state.clear_geofence();
        return None;
    }

    let settings = state.geofence_settings();
    let ticket = state.begin_geofence_request();
    let state = state.clone();

    Some(tokio::spawn(async move {
        let computed =
            tokio::task::spawn_blocking(move || GeofenceGenerator::recompute(&points, &settings))
                .await;

        let result = match computed {
            Ok(result) => result.map_err(|err| err.to_string()),
            Err(err) => Err(format!("geofence worker panicked: {}", err)),
        };
        if let Err(message) = &result {
            tracing::warn!("Geofence #{} ({:?}) failed: {}", ticket.value(), trigger, message);
        }

        let committed = state.commit_geofence(ticket, result);
        match committed {
            CommitOutcome::Committed => {
                if state.geofence().status == GeofenceStatus::Ready {
                    tracing::info!("Geofence #{} ({:?}) updated", ticket.value(), trigger);
                }
            }
            CommitOutcome::Stale => {
                tracing::debug!("Geofence #{} superseded, result dropped", ticket.value());
            }
        }
        committed
    }))
}
