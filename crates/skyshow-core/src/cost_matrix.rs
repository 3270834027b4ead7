//! Distance matrix between mission slots and spare vehicles.

use serde::{Deserialize, Serialize};

use crate::assignment::{self, Assignment};
use crate::error::Result;
use crate::models::{MissionSlot, Vehicle};

/// Cost used for every cell of a slot that has no target position.
///
/// Large enough to lose against any real distance on a show field, small
/// enough that sums over hundreds of slots stay exact in `f64`.
pub const DEFAULT_INFEASIBLE_COST: f64 = 1.0e9;

/// Rows are slots, columns are vehicles, both in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostMatrix {
    pub slot_indices: Vec<usize>,
    pub vehicle_ids: Vec<String>,
    pub costs: Vec<Vec<f64>>,
}

impl CostMatrix {
    pub fn rows(&self) -> usize {
        self.slot_indices.len()
    }

    pub fn cols(&self) -> usize {
        self.vehicle_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0 || self.cols() == 0
    }

    pub fn solve(&self) -> Result<Assignment> {
        assignment::solve(&self.costs)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CostMatrixBuilder {
    infeasible_cost: f64,
}

impl Default for CostMatrixBuilder {
    fn default() -> Self {
        Self {
            infeasible_cost: DEFAULT_INFEASIBLE_COST,
        }
    }
}

impl CostMatrixBuilder {
    pub fn new(infeasible_cost: f64) -> Self {
        Self { infeasible_cost }
    }

    /// Horizontal Euclidean distance from every vehicle to every slot target.
    pub fn build(&self, slots: &[&MissionSlot], vehicles: &[&Vehicle]) -> CostMatrix {
        let costs = slots
            .iter()
            .map(|slot| match &slot.target {
                Some(target) => vehicles
                    .iter()
                    .map(|vehicle| vehicle.position.horizontal_distance(target))
                    .collect(),
                None => vec![self.infeasible_cost; vehicles.len()],
            })
            .collect();

        CostMatrix {
            slot_indices: slots.iter().map(|slot| slot.index).collect(),
            vehicle_ids: vehicles.iter().map(|vehicle| vehicle.id.clone()).collect(),
            costs,
        }
    }
}
