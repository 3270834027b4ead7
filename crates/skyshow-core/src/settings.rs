//! Geofence settings and their validation.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Operator-tunable parameters of the automatic geofence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceSettings {
    /// Outward offset of every hull edge, in meters
    pub horizontal_margin_m: f64,
    /// Added on top of the highest observed altitude, in meters
    pub vertical_margin_m: f64,
    /// Whether to reduce the polygon to `max_vertex_count` vertices
    pub simplify: bool,
    /// Upper bound on the polygon size (vehicles keep few fence points onboard)
    pub max_vertex_count: usize,
}

impl Default for GeofenceSettings {
    fn default() -> Self {
        Self {
            horizontal_margin_m: 20.0,
            vertical_margin_m: 10.0,
            simplify: true,
            max_vertex_count: 10,
        }
    }
}

impl GeofenceSettings {
    /// Minimum vertex count of a polygon.
    pub const MIN_VERTEX_COUNT: usize = 3;

    pub fn validate(&self) -> Result<()> {
        if self.max_vertex_count < Self::MIN_VERTEX_COUNT {
            return Err(EngineError::InvalidSettings(format!(
                "max vertex count must be at least {}, got {}",
                Self::MIN_VERTEX_COUNT,
                self.max_vertex_count
            )));
        }
        check_margin("horizontal margin", self.horizontal_margin_m)?;
        check_margin("vertical margin", self.vertical_margin_m)?;
        Ok(())
    }
}

fn check_margin(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::InvalidSettings(format!(
            "{} must be a non-negative number, got {}",
            name, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GeofenceSettings::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let too_few = GeofenceSettings {
            max_vertex_count: 2,
            ..GeofenceSettings::default()
        };
        assert!(matches!(too_few.validate(), Err(EngineError::InvalidSettings(_))));

        let negative = GeofenceSettings {
            horizontal_margin_m: -1.0,
            ..GeofenceSettings::default()
        };
        assert!(negative.validate().is_err());

        let nan = GeofenceSettings {
            vertical_margin_m: f64::NAN,
            ..GeofenceSettings::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn deserializes_from_console_settings() {
        let settings: GeofenceSettings = serde_json::from_value(serde_json::json!({
            "horizontal_margin_m": 5,
            "vertical_margin_m": 2.5,
            "simplify": false,
            "max_vertex_count": 6
        }))
        .unwrap();
        assert_eq!(settings.max_vertex_count, 6);
        assert!(!settings.simplify);
    }
}
