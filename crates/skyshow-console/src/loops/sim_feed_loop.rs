//! Simulated telemetry feed.
//!
//! Parks a fleet in a staging grid south of the origin and reports each
//! vehicle's position with a little GPS noise on every tick.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::broadcast;
use tokio::time::interval;

use skyshow_core::{Point2, VehicleStatus};

use crate::state::{ConsoleState, TelemetryUpdate};

const FEED_INTERVAL_MS: u64 = 200;
const GPS_NOISE_M: f64 = 0.3;
/// Gap between the takeoff area and the first staging row
const STAGING_OFFSET_M: f64 = 30.0;

#[derive(Debug, Clone)]
pub struct SimFleet {
    pub vehicle_count: usize,
    pub spacing_m: f64,
}

impl SimFleet {
    pub fn vehicle_id(index: usize) -> String {
        format!("SIM{:03}", index + 1)
    }

    /// Staging position of each vehicle in the local frame.
    pub fn home_positions(&self) -> Vec<(String, Point2)> {
        let cols = (self.vehicle_count as f64).sqrt().ceil().max(1.0) as usize;
        (0..self.vehicle_count)
            .map(|i| {
                let x = (i % cols) as f64 * self.spacing_m;
                let y = -STAGING_OFFSET_M - (i / cols) as f64 * self.spacing_m;
                (Self::vehicle_id(i), Point2::new(x, y))
            })
            .collect()
    }
}

pub async fn run_sim_feed_loop(
    state: Arc<ConsoleState>,
    fleet: SimFleet,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(Duration::from_millis(FEED_INTERVAL_MS));
    let homes = fleet.home_positions();
    tracing::info!("Simulating {} vehicles", homes.len());

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Simulated feed shutting down");
                break;
            }
            _ = ticker.tick() => {
                report_all(&state, &homes);
            }
        }
    }
}

pub fn report_all(state: &ConsoleState, homes: &[(String, Point2)]) {
    let mut rng = rand::rng();
    for (vehicle_id, home) in homes {
        let noisy = Point2::new(
            home.x + rng.random_range(-GPS_NOISE_M..=GPS_NOISE_M),
            home.y + rng.random_range(-GPS_NOISE_M..=GPS_NOISE_M),
        );
        let (lat, lon) = state.frame().to_geodetic(noisy);
        let update = TelemetryUpdate {
            vehicle_id: vehicle_id.clone(),
            lat,
            lon,
            altitude_m: state.frame().to_geodetic_altitude(0.0),
            status: VehicleStatus::Ready,
        };
        if let Err(err) = state.update_telemetry(update) {
            tracing::warn!("Simulated telemetry rejected: {}", err);
        }
    }
}
