//! Show console runtime: live vehicle registry, snapshot sampler, and the
//! mapping and geofence workers built on `skyshow-core`.

pub mod config;
pub mod debounce;
pub mod handle;
pub mod loops;
pub mod sequence;
pub mod state;

pub use handle::{start, ConsoleError, ConsoleHandle};
