//! Synthetic vehicle fleets.

use std::f64::consts::PI;

use rand::Rng;

use skyshow_core::{Position, Vehicle, VehicleStatus};

pub fn vehicle_id(index: usize) -> String {
    format!("V{:03}", index + 1)
}

/// Scatter `count` vehicles uniformly over a disc around `center`.
///
/// The last `lost` vehicles are reported as lost.
pub fn scatter_fleet<R: Rng>(
    rng: &mut R,
    count: usize,
    lost: usize,
    center: Position,
    radius_m: f64,
) -> Vec<Vehicle> {
    let first_lost = count.saturating_sub(lost);
    (0..count)
        .map(|i| {
            let r = radius_m * rng.random_range(0.0..=1.0f64).sqrt();
            let theta = rng.random_range(0.0..2.0 * PI);
            let position = Position::flat(center.x + r * theta.cos(), center.y + r * theta.sin());
            let status = if i >= first_lost {
                VehicleStatus::Lost
            } else {
                VehicleStatus::Ready
            };
            Vehicle::new(vehicle_id(i), position).with_status(status)
        })
        .collect()
}
