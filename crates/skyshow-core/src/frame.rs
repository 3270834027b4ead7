//! Show coordinate frame.
//!
//! Telemetry arrives as WGS84 latitude/longitude while the assignment and
//! geofence algorithms work on a flat plane in meters. A frame is anchored at
//! the show origin and may be rotated so that the choreography's +y axis
//! points along `orientation_deg` (clockwise from north).

use serde::{Deserialize, Serialize};

use crate::models::Position;
use crate::spatial::Point2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalFrame {
    pub origin_lat: f64,
    pub origin_lon: f64,
    /// Altitude that maps to `z = 0`
    #[serde(default)]
    pub origin_alt_m: f64,
    #[serde(default)]
    pub orientation_deg: f64,
}

impl LocalFrame {
    pub fn new(origin_lat: f64, origin_lon: f64) -> Self {
        Self {
            origin_lat,
            origin_lon,
            origin_alt_m: 0.0,
            orientation_deg: 0.0,
        }
    }

    pub fn with_orientation(mut self, orientation_deg: f64) -> Self {
        self.orientation_deg = orientation_deg;
        self
    }

    pub fn with_origin_altitude(mut self, origin_alt_m: f64) -> Self {
        self.origin_alt_m = origin_alt_m;
        self
    }

    /// Project a geodetic position into the frame.
    pub fn to_local(&self, lat: f64, lon: f64, altitude_m: f64) -> Position {
        let east = lon_to_meters(lon - self.origin_lon, self.origin_lat);
        let north = lat_to_meters(lat - self.origin_lat, self.origin_lat);
        let (sin, cos) = self.orientation_deg.to_radians().sin_cos();
        Position {
            x: east * cos - north * sin,
            y: east * sin + north * cos,
            z: altitude_m - self.origin_alt_m,
        }
    }

    /// Inverse of [`to_local`](Self::to_local) on the ground plane.
    /// Returns `(lat, lon)` in degrees.
    pub fn to_geodetic(&self, point: Point2) -> (f64, f64) {
        let (sin, cos) = self.orientation_deg.to_radians().sin_cos();
        let east = point.x * cos + point.y * sin;
        let north = -point.x * sin + point.y * cos;
        (
            self.origin_lat + meters_to_lat(north, self.origin_lat),
            self.origin_lon + meters_to_lon(east, self.origin_lat),
        )
    }

    pub fn to_geodetic_altitude(&self, z: f64) -> f64 {
        z + self.origin_alt_m
    }
}

// WGS84 meters-per-degree approximations, accurate to well under a meter
// across a show field.

/// Meters per degree of latitude at a given latitude.
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude.
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

pub fn meters_to_lat(meters: f64, ref_lat_deg: f64) -> f64 {
    meters / meters_per_deg_lat(ref_lat_deg).max(1e-9)
}

pub fn meters_to_lon(meters: f64, ref_lat_deg: f64) -> f64 {
    meters / meters_per_deg_lon(ref_lat_deg).max(1e-9)
}

pub fn lat_to_meters(deg: f64, ref_lat_deg: f64) -> f64 {
    deg * meters_per_deg_lat(ref_lat_deg)
}

pub fn lon_to_meters(deg: f64, ref_lat_deg: f64) -> f64 {
    deg * meters_per_deg_lon(ref_lat_deg)
}
