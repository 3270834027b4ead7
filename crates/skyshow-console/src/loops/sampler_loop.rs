//! Vehicle snapshot sampler.
//!
//! Copies the live registry into an immutable snapshot at a fixed cadence
//! and watches the show's boundary points. Any change to them (or to the
//! geofence settings) fires a geofence recompute trigger.

use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;

use skyshow_core::{GeofenceSettings, Position, VehicleStatus};

use crate::loops::GeofenceTrigger;
use crate::state::ConsoleState;

pub async fn run_sampler_loop(
    state: Arc<ConsoleState>,
    cadence: Duration,
    geofence_tx: mpsc::Sender<GeofenceTrigger>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(cadence);
    let mut last_fingerprint: Option<u64> = None;

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Sampler loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                sample_once(&state, &geofence_tx, &mut last_fingerprint);
            }
        }
    }
}

/// Publish a fresh snapshot and fire a trigger if the boundary changed.
pub fn sample_once(
    state: &ConsoleState,
    geofence_tx: &mpsc::Sender<GeofenceTrigger>,
    last_fingerprint: &mut Option<u64>,
) {
    let snapshot = state.build_snapshot(Utc::now());
    let lost = snapshot
        .iter()
        .filter(|v| v.status == VehicleStatus::Lost)
        .count();
    if lost > 0 {
        tracing::debug!("{} of {} vehicles lost", lost, snapshot.len());
    }
    state.publish_snapshot(Arc::new(snapshot));

    let fingerprint = fingerprint_boundary(&state.boundary_points(), &state.geofence_settings());
    if *last_fingerprint == Some(fingerprint) {
        return;
    }
    *last_fingerprint = Some(fingerprint);

    match geofence_tx.try_send(GeofenceTrigger::PositionsChanged) {
        Ok(()) => tracing::debug!("Boundary changed, geofence recompute queued"),
        // A pending trigger already covers this change.
        Err(mpsc::error::TrySendError::Full(_)) => {}
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::warn!("Geofence worker is gone, boundary change ignored");
        }
    }
}

pub fn fingerprint_boundary(points: &[Position], settings: &GeofenceSettings) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    points.len().hash(&mut hasher);
    for point in points {
        point.x.to_bits().hash(&mut hasher);
        point.y.to_bits().hash(&mut hasher);
        point.z.to_bits().hash(&mut hasher);
    }
    settings.horizontal_margin_m.to_bits().hash(&mut hasher);
    settings.vertical_margin_m.to_bits().hash(&mut hasher);
    settings.simplify.hash(&mut hasher);
    settings.max_vertex_count.hash(&mut hasher);
    hasher.finish()
}
