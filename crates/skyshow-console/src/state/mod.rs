//! Shared console state.

mod store;

pub use store::{
    ConsoleState, GeofenceStatus, GeofenceView, ShowPlan, StoredGeofence, StoredMapping,
    TelemetryUpdate, VehicleRecord,
};
