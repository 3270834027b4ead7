//! Background loops for continuous processing.

pub mod geofence_loop;
pub mod mapping_loop;
pub mod sampler_loop;
pub mod sim_feed_loop;

/// Work accepted by the mapping worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingRequest {
    /// Match every unpinned slot from scratch
    Recalculate,
    /// Fill empty slots with spare vehicles only
    Augment,
}

/// Reason for a geofence recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeofenceTrigger {
    /// Takeoff/landing positions or settings changed
    PositionsChanged,
    /// Operator asked for a recompute
    Manual,
}
