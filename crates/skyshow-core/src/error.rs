//! Error types shared by the assignment engine and the geofence generator.

use thiserror::Error;

/// Failure returned by any core operation.
///
/// Every variant is detected synchronously, before any output is produced, so
/// callers never observe a partially updated mapping or polygon.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Ragged rows, negative or non-finite costs.
    #[error("invalid cost matrix: {0}")]
    InvalidCostMatrix(String),

    #[error("mapping has {actual} entries but the mission has {expected} slots")]
    InvalidMappingLength { expected: usize, actual: usize },

    /// Fewer than three non-collinear boundary points.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("invalid geofence settings: {0}")]
    InvalidSettings(String),

    /// Vehicle or slot snapshot that violates the input contract.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("slot {index} is out of range for a mission with {len} slots")]
    SlotOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, EngineError>;
