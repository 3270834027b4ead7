pub mod assignment;
pub mod collection;
pub mod cost_matrix;
pub mod error;
pub mod frame;
pub mod geofence;
pub mod hull;
pub mod mapping;
pub mod mapping_manager;
pub mod models;
pub mod settings;
pub mod spatial;

pub use assignment::{solve, Assignment};
pub use collection::{Keyed, OrderedCollection};
pub use cost_matrix::{CostMatrix, CostMatrixBuilder, DEFAULT_INFEASIBLE_COST};
pub use error::{EngineError, Result};
pub use frame::LocalFrame;
pub use geofence::{GeofenceGenerator, GeofencePolygon};
pub use hull::{convex_hull, ConvexHull};
pub use mapping::Mapping;
pub use mapping_manager::{MappingConfig, MappingManager, MappingOutcome};
pub use models::{grid_positions, slots_from_targets, MissionSlot, Position, Vehicle, VehicleStatus};
pub use settings::GeofenceSettings;
pub use spatial::Point2;
