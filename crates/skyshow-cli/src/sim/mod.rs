//! Synthetic show generation.

mod fleet;
mod formations;

pub use fleet::{scatter_fleet, vehicle_id};
pub use formations::{takeoff_positions, Formation};
