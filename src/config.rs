//! Tunable constants of the estimation and alerting pipeline
//!
//! Every threshold is empirical. They are grouped per component and all
//! have defaults, so a YAML file only needs the keys it overrides.

use serde::Deserialize;

use crate::NavError;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    pub filter: FilterConfig,
    pub speed: SpeedConfig,
    pub heading: HeadingConfig,
    pub orientation: OrientationConfig,
    pub display: DisplayConfig,
    pub proximity: ProximityConfig,
    pub alert: AlertConfig,
}

impl NavigatorConfig {
    /// Parse a YAML document, missing keys keep their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self, NavError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(yaml).map_err(|e| NavError::Config(e.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Samples less accurate than this (meters) are dropped
    pub max_accuracy_m: f64,
    /// Rolling buffer capacity
    pub buffer_size: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_accuracy_m: 30.0,
            buffer_size: 4,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpeedConfig {
    /// Number of most recent samples used for displacement speed
    pub window: usize,
    pub min_pair_secs: f64,
    pub max_pair_secs: f64,
    /// Displacements at or below this (meters) are jitter
    pub min_displacement_m: f64,
    /// Valid pairs needed before a derived speed is trusted
    pub min_valid_pairs: usize,
    pub max_kmh: f64,
    /// Device and derived speeds closer than this are blended
    pub agreement_kmh: f64,
    pub device_weight: f64,
    pub decay_factor: f64,
    pub decay_window_ms: u64,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            window: 3,
            min_pair_secs: 0.3,
            max_pair_secs: 2.0,
            min_displacement_m: 0.3,
            min_valid_pairs: 2,
            max_kmh: 200.0,
            agreement_kmh: 15.0,
            device_weight: 0.6,
            decay_factor: 0.95,
            decay_window_ms: 3_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeadingConfig {
    /// Fused speed (km/h) above which the vehicle counts as moving
    pub motion_kmh: f64,
    /// Samples apart when deriving a displacement bearing
    pub bearing_span: usize,
    pub min_bearing_displacement_m: f64,
    pub hold_ms: u64,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            motion_kmh: 2.0,
            bearing_span: 3,
            min_bearing_displacement_m: 15.0,
            hold_ms: 5_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    /// Minimum fused speed (km/h) to calibrate against the GPS heading
    pub calibration_kmh: f64,
    /// Sensor reports counter-clockwise angles
    pub invert: bool,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            calibration_kmh: 3.0,
            invert: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub speed_window: usize,
    pub heading_window: usize,
    /// Jumps wider than this (degrees) are glitches
    pub glitch_deg: f64,
    pub min_change_deg: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            speed_window: 2,
            heading_window: 5,
            glitch_deg: 45.0,
            min_change_deg: 2.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    /// Lateral corridor around the route, in km
    pub buffer_km: f64,
    /// Bounding box padding, fraction of the box extent per side
    pub bbox_pad: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            buffer_km: 0.12,
            bbox_pad: 0.02,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub radius_m: f64,
    /// Entries kept by the "next radar" ranking
    pub ranked_len: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            radius_m: 500.0,
            ranked_len: 5,
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn parse_configs() -> Result<(), String> {
        let conf = NavigatorConfig::from_yaml("").map_err(|e| e.to_string())?;
        assert_eq!(NavigatorConfig::default(), conf);

        let yaml = "\nfilter:\n  max_accuracy_m: 50\nalert:\n  radius_m: 800";
        let conf = NavigatorConfig::from_yaml(yaml).map_err(|e| e.to_string())?;

        assert_eq!(50.0, conf.filter.max_accuracy_m);
        assert_eq!(4, conf.filter.buffer_size);
        assert_eq!(800.0, conf.alert.radius_m);
        assert_eq!(5, conf.alert.ranked_len);
        assert_eq!(SpeedConfig::default(), conf.speed);

        Ok(())
    }

    #[test]
    fn invalid_config() {
        let res = NavigatorConfig::from_yaml("speed:\n  max_kmh: fast");
        assert!(matches!(res, Err(NavError::Config(_))));
    }
}
