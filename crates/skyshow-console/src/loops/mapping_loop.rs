//! Mapping worker.
//!
//! Each request is stamped with a ticket and computed off the async runtime.
//! Only the result of the newest request is stored.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use skyshow_core::MappingManager;

use crate::loops::MappingRequest;
use crate::sequence::CommitOutcome;
use crate::state::ConsoleState;

pub async fn run_mapping_loop(
    state: Arc<ConsoleState>,
    manager: MappingManager,
    mut rx: mpsc::Receiver<MappingRequest>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Mapping loop shutting down");
                break;
            }
            maybe_request = rx.recv() => {
                match maybe_request {
                    Some(request) => {
                        dispatch(&state, &manager, request);
                    }
                    None => {
                        tracing::info!("Mapping request channel closed");
                        break;
                    }
                }
            }
        }
    }
}

/// Take the inputs, issue a ticket and start the computation.
///
/// Returns `None` when an augmentation has nothing to do.
pub fn dispatch(
    state: &Arc<ConsoleState>,
    manager: &MappingManager,
    request: MappingRequest,
) -> Option<JoinHandle<CommitOutcome>> {
    let vehicles = state.snapshot();
    let slots = state.slots();
    let current = state.mapping().mapping;

    if request == MappingRequest::Augment {
        match manager.can_augment(&current, &vehicles, &slots) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("Nothing to augment: no empty slot or no spare vehicle");
                return None;
            }
            Err(err) => {
                tracing::warn!("Cannot augment mapping: {}", err);
                return None;
            }
        }
    }

    let ticket = state.begin_mapping_request();
    let state = state.clone();
    let manager = manager.clone();

    Some(tokio::spawn(async move {
        let computed = tokio::task::spawn_blocking(move || match request {
            MappingRequest::Recalculate => manager.recalculate(&vehicles, &slots),
            MappingRequest::Augment => manager.augment_from_spares(&current, &vehicles, &slots),
        })
        .await;

        match computed {
            Ok(Ok(outcome)) => {
                let assigned = outcome.assigned;
                let total_cost = outcome.total_cost;
                let committed = state.commit_mapping(ticket, outcome);
                match committed {
                    CommitOutcome::Committed => tracing::info!(
                        "Mapping {:?} #{} stored: {} bound, cost {:.1}m",
                        request,
                        ticket.value(),
                        assigned,
                        total_cost
                    ),
                    CommitOutcome::Stale => tracing::debug!(
                        "Mapping {:?} #{} superseded, result dropped",
                        request,
                        ticket.value()
                    ),
                }
                committed
            }
            Ok(Err(err)) => {
                tracing::warn!("Mapping {:?} #{} failed: {}", request, ticket.value(), err);
                CommitOutcome::Stale
            }
            Err(err) => {
                tracing::error!("Mapping worker panicked: {}", err);
                CommitOutcome::Stale
            }
        }
    }))
}
