//! Offline show planning: synthetic fleet, optimal mapping and geofence.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use skyshow_core::{
    slots_from_targets, EngineError, GeofenceGenerator, GeofencePolygon, GeofenceSettings,
    LocalFrame, Mapping, MappingManager, MissionSlot, OrderedCollection, Position, Result,
    Vehicle,
};

use crate::sim::{scatter_fleet, takeoff_positions, Formation};

#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub formation: Formation,
    pub slots: usize,
    pub vehicles: usize,
    /// Vehicles reported as lost (taken from the end of the fleet)
    pub lost: usize,
    pub spacing_m: f64,
    /// Distance from the origin to the center of the staging area, towards -y
    pub staging_distance_m: f64,
    pub staging_radius_m: f64,
    pub geofence: GeofenceSettings,
    pub frame: LocalFrame,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeofenceReport {
    pub polygon: GeofencePolygon,
    pub geodetic: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub generated_at: DateTime<Utc>,
    pub formation: Formation,
    pub seed: u64,
    pub slots: Vec<MissionSlot>,
    pub vehicles: Vec<Vehicle>,
    pub mapping: Mapping,
    pub total_cost: f64,
    pub spares: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geofence: Option<GeofenceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geofence_error: Option<String>,
}

/// Generate a show and plan it.
///
/// A formation too small for a geofence (fewer than three non-collinear pads)
/// is reported in `geofence_error`; every other failure is returned.
pub fn plan_show(options: &PlanOptions) -> Result<PlanReport> {
    options.geofence.validate()?;

    let mut rng = StdRng::seed_from_u64(options.seed);
    let targets = takeoff_positions(options.formation, options.slots, options.spacing_m);
    let staging = Position::flat(0.0, -options.staging_distance_m);
    let fleet = scatter_fleet(
        &mut rng,
        options.vehicles,
        options.lost,
        staging,
        options.staging_radius_m,
    );

    let slots = OrderedCollection::from_items(slots_from_targets(&targets))?;
    let vehicles = OrderedCollection::from_items(fleet)?;
    let outcome = MappingManager::default().recalculate(&vehicles, &slots)?;

    let (geofence, geofence_error) = match GeofenceGenerator::recompute(&targets, &options.geofence)
    {
        Ok(polygon) => {
            let geodetic = polygon.to_geodetic(&options.frame);
            (Some(GeofenceReport { polygon, geodetic }), None)
        }
        Err(err @ EngineError::DegenerateGeometry(_)) => (None, Some(err.to_string())),
        Err(err) => return Err(err),
    };

    Ok(PlanReport {
        generated_at: Utc::now(),
        formation: options.formation,
        seed: options.seed,
        spares: outcome.mapping.spare_ids(&vehicles),
        slots: slots.iter().cloned().collect(),
        vehicles: vehicles.iter().cloned().collect(),
        mapping: outcome.mapping,
        total_cost: outcome.total_cost,
        geofence,
        geofence_error,
    })
}
