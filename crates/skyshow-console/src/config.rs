//! Console configuration from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use skyshow_core::{GeofenceSettings, LocalFrame, MappingConfig};

#[derive(Debug, Clone)]
pub struct Config {
    /// How often the live registry is copied into a vehicle snapshot
    pub sample_interval: Duration,
    /// Quiet period before a geofence recompute starts
    pub geofence_debounce: Duration,
    /// Vehicles silent for longer than this are reported as lost
    pub telemetry_timeout: Duration,
    pub frame: LocalFrame,
    pub geofence: GeofenceSettings,
    pub mapping: MappingConfig,
    /// JSON show plan with takeoff and landing positions
    pub show_plan_path: Option<String>,
    /// Feed the registry with simulated telemetry
    pub simulate: bool,
    pub sim_vehicle_count: usize,
    pub sim_slot_count: usize,
    pub sim_spacing_m: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_millis(500),
            geofence_debounce: Duration::from_millis(300),
            telemetry_timeout: Duration::from_secs(5),
            frame: LocalFrame::new(47.4979, 19.0402),
            geofence: GeofenceSettings::default(),
            mapping: MappingConfig::default(),
            show_plan_path: None,
            simulate: true,
            sim_vehicle_count: 12,
            sim_slot_count: 10,
            sim_spacing_m: 5.0,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let fence = &defaults.geofence;
        let geofence = GeofenceSettings {
            horizontal_margin_m: env_or(
                "SHOW_GEOFENCE_HORIZONTAL_MARGIN_M",
                fence.horizontal_margin_m,
            ),
            vertical_margin_m: env_or("SHOW_GEOFENCE_VERTICAL_MARGIN_M", fence.vertical_margin_m),
            simplify: env_flag("SHOW_GEOFENCE_SIMPLIFY", fence.simplify),
            max_vertex_count: env_or("SHOW_GEOFENCE_MAX_VERTICES", fence.max_vertex_count),
        };
        let frame = LocalFrame::new(
            env_or("SHOW_ORIGIN_LAT", defaults.frame.origin_lat),
            env_or("SHOW_ORIGIN_LON", defaults.frame.origin_lon),
        )
        .with_origin_altitude(env_or("SHOW_ORIGIN_ALT_M", defaults.frame.origin_alt_m))
        .with_orientation(env_or("SHOW_ORIENTATION_DEG", defaults.frame.orientation_deg));

        Self {
            sample_interval: Duration::from_millis(env_or("SHOW_SAMPLE_INTERVAL_MS", 500)),
            geofence_debounce: Duration::from_millis(env_or("SHOW_GEOFENCE_DEBOUNCE_MS", 300)),
            telemetry_timeout: Duration::from_secs(env_or("SHOW_TELEMETRY_TIMEOUT_SECS", 5)),
            frame,
            geofence,
            mapping: MappingConfig {
                assign_lost_vehicles: env_flag(
                    "SHOW_ASSIGN_LOST_VEHICLES",
                    defaults.mapping.assign_lost_vehicles,
                ),
            },
            show_plan_path: env::var("SHOW_PLAN_PATH").ok().filter(|s| !s.trim().is_empty()),
            simulate: env_flag("SHOW_SIMULATE", defaults.simulate),
            sim_vehicle_count: env_or("SHOW_SIM_VEHICLES", defaults.sim_vehicle_count),
            sim_slot_count: env_or("SHOW_SIM_SLOTS", defaults.sim_slot_count),
            sim_spacing_m: env_or("SHOW_SIM_SPACING_M", defaults.sim_spacing_m),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|s| parse_flag(&s))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
