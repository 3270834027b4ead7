//! CLI tool that plans a synthetic drone show.
//!
//! Lays out takeoff pads, scatters a fleet over a staging area, computes the
//! optimal slot mapping and the show geofence, and prints everything as JSON.

use clap::{Parser, ValueEnum};

use skyshow_cli::sim::Formation;
use skyshow_cli::{plan_show, PlanOptions};
use skyshow_core::{GeofenceSettings, LocalFrame};

/// Available takeoff formations
#[derive(Debug, Clone, ValueEnum)]
enum FormationArg {
    /// Rows of evenly spaced pads
    Grid,
    /// Single ring of pads
    Circle,
    /// V shape
    Chevron,
}

impl From<FormationArg> for Formation {
    fn from(arg: FormationArg) -> Self {
        match arg {
            FormationArg::Grid => Formation::Grid,
            FormationArg::Circle => Formation::Circle,
            FormationArg::Chevron => Formation::Chevron,
        }
    }
}

/// Synthetic show planner
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Takeoff formation
    #[arg(long, value_enum, default_value = "grid")]
    formation: FormationArg,

    /// Number of mission slots
    #[arg(long, default_value_t = 25)]
    slots: usize,

    /// Number of vehicles in the fleet
    #[arg(long, default_value_t = 30)]
    vehicles: usize,

    /// Number of vehicles reported as lost
    #[arg(long, default_value_t = 0)]
    lost: usize,

    /// Distance between neighbouring pads in meters
    #[arg(long, default_value_t = 3.0)]
    spacing: f64,

    /// Distance of the staging area from the origin in meters
    #[arg(long, default_value_t = 50.0)]
    staging_distance: f64,

    /// Radius of the staging area in meters
    #[arg(long, default_value_t = 15.0)]
    staging_radius: f64,

    /// Horizontal geofence margin in meters
    #[arg(long, default_value_t = 20.0)]
    margin: f64,

    /// Vertical geofence margin in meters
    #[arg(long, default_value_t = 10.0)]
    vertical_margin: f64,

    /// Maximum number of geofence vertices
    #[arg(long, default_value_t = 10)]
    max_vertices: usize,

    /// Keep every offset vertex instead of simplifying
    #[arg(long)]
    no_simplify: bool,

    /// Origin latitude (default: Budapest)
    #[arg(long, default_value_t = 47.4979)]
    lat: f64,

    /// Origin longitude (default: Budapest)
    #[arg(long, default_value_t = 19.0402)]
    lon: f64,

    /// Orientation of the show's +y axis, degrees clockwise from north
    #[arg(long, default_value_t = 0.0)]
    orientation: f64,

    /// Random seed for the fleet layout
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let options = PlanOptions {
        formation: args.formation.into(),
        slots: args.slots,
        vehicles: args.vehicles,
        lost: args.lost,
        spacing_m: args.spacing,
        staging_distance_m: args.staging_distance,
        staging_radius_m: args.staging_radius,
        geofence: GeofenceSettings {
            horizontal_margin_m: args.margin,
            vertical_margin_m: args.vertical_margin,
            simplify: !args.no_simplify,
            max_vertex_count: args.max_vertices,
        },
        frame: LocalFrame::new(args.lat, args.lon).with_orientation(args.orientation),
        seed: args.seed,
    };

    let report = plan_show(&options)?;

    eprintln!(
        "{} slots, {} vehicles: {} bound, {} spare, total distance {:.1}m",
        report.slots.len(),
        report.vehicles.len(),
        report.mapping.filled_count(),
        report.spares.len(),
        report.total_cost
    );
    match (&report.geofence, &report.geofence_error) {
        (Some(fence), _) => eprintln!(
            "geofence: {} vertices, ceiling {:.1}m",
            fence.polygon.vertex_count(),
            fence.polygon.altitude_ceiling_m
        ),
        (None, Some(err)) => eprintln!("geofence: {}", err),
        (None, None) => {}
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);
    Ok(())
}
