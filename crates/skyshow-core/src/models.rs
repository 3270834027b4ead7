//! Core data models for the show console.

use serde::{Deserialize, Serialize};

use crate::collection::Keyed;
use crate::error::{EngineError, Result};

/// Position in the show's local frame, in meters.
///
/// `x` points east and `y` north once the frame orientation is applied;
/// `z` is altitude above the frame's reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Position on the ground plane (`z = 0`).
    pub fn flat(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Distance on the horizontal plane; altitude is ignored.
    pub fn horizontal_distance(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    /// On the ground, healthy, waiting for a slot
    #[default]
    Ready,
    /// Flying or executing the show
    Active,
    /// Reporting a non-fatal warning
    Warning,
    /// Reporting an error
    Error,
    /// No telemetry within the timeout window
    Lost,
}

impl VehicleStatus {
    /// Whether a vehicle in this state may be proposed for a new binding.
    pub fn is_assignable(&self) -> bool {
        !matches!(self, VehicleStatus::Lost)
    }
}

/// Snapshot of a single vehicle at sampling time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub position: Position,
    #[serde(default)]
    pub status: VehicleStatus,
}

impl Vehicle {
    pub fn new(id: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            position,
            status: VehicleStatus::Ready,
        }
    }

    pub fn with_status(mut self, status: VehicleStatus) -> Self {
        self.status = status;
        self
    }
}

impl Keyed for Vehicle {
    type Key = String;

    fn key(&self) -> String {
        self.id.clone()
    }
}

/// A choreography position waiting to be filled by a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionSlot {
    pub index: usize,
    /// Takeoff position of the slot; slots without one are never matched.
    #[serde(default)]
    pub target: Option<Position>,
    /// Vehicle whose binding to this slot survives recalculation.
    #[serde(default)]
    pub pinned: Option<String>,
}

impl MissionSlot {
    pub fn new(index: usize, target: Position) -> Self {
        Self {
            index,
            target: Some(target),
            pinned: None,
        }
    }

    pub fn untargeted(index: usize) -> Self {
        Self {
            index,
            target: None,
            pinned: None,
        }
    }

    pub fn pinned_to(mut self, vehicle_id: impl Into<String>) -> Self {
        self.pinned = Some(vehicle_id.into());
        self
    }
}

impl Keyed for MissionSlot {
    type Key = usize;

    fn key(&self) -> usize {
        self.index
    }
}

/// Build slots from a list of takeoff positions, indexed in order.
pub fn slots_from_targets(targets: &[Position]) -> Vec<MissionSlot> {
    targets
        .iter()
        .enumerate()
        .map(|(index, target)| MissionSlot::new(index, *target))
        .collect()
}

/// Square-ish grid of `count` ground positions centered on the origin,
/// filled row by row from the lowest row.
pub fn grid_positions(count: usize, spacing_m: f64) -> Vec<Position> {
    let cols = (count as f64).sqrt().ceil().max(1.0) as usize;
    let rows = count.div_ceil(cols).max(1);
    let x0 = -((cols - 1) as f64) * spacing_m / 2.0;
    let y0 = -((rows - 1) as f64) * spacing_m / 2.0;
    (0..count)
        .map(|i| {
            Position::flat(
                x0 + (i % cols) as f64 * spacing_m,
                y0 + (i / cols) as f64 * spacing_m,
            )
        })
        .collect()
}

pub(crate) fn ensure_finite(position: &Position, what: &str) -> Result<()> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(EngineError::InvalidSnapshot(format!(
            "{what} has a non-finite coordinate"
        )))
    }
}
