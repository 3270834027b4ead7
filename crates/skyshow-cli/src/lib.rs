//! Skyshow CLI - offline planning tools for drone shows.
//!
//! This crate provides:
//! - plan_show: synthetic show planner printing the slot mapping and geofence as JSON

pub mod report;
pub mod sim;

pub use report::{plan_show, GeofenceReport, PlanOptions, PlanReport};
