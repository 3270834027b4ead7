//! Takeoff formations.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use skyshow_core::{grid_positions, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formation {
    /// Rows of evenly spaced pads around the origin
    Grid,
    /// Single ring with `spacing` between neighbours
    Circle,
    /// V shape opening towards -y, tip at the origin
    Chevron,
}

/// Takeoff positions of `count` slots, `spacing_m` apart.
pub fn takeoff_positions(formation: Formation, count: usize, spacing_m: f64) -> Vec<Position> {
    match formation {
        Formation::Grid => grid_positions(count, spacing_m),
        Formation::Circle => {
            let radius = (spacing_m * count as f64 / (2.0 * PI)).max(spacing_m);
            (0..count)
                .map(|i| {
                    let angle = 2.0 * PI * i as f64 / count as f64;
                    Position::flat(radius * angle.cos(), radius * angle.sin())
                })
                .collect()
        }
        Formation::Chevron => (0..count)
            .map(|i| {
                let arm = ((i + 1) / 2) as f64;
                let side = if i % 2 == 1 { -1.0 } else { 1.0 };
                Position::flat(side * arm * spacing_m, -arm * spacing_m * 0.75)
            })
            .collect(),
    }
}
