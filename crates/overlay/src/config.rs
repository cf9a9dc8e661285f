use std::path::Path;

use foundation::math::Vec3;
use scene::prefabs::LightingRig;
use serde::{Deserialize, Serialize};

use crate::error::OverlayError;

/// Intro camera move: raise the map tilt to `target_deg` at `rate_deg_per_s`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TiltRampConfig {
    pub enabled: bool,
    pub rate_deg_per_s: f64,
    pub target_deg: f64,
}

impl Default for TiltRampConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // 0.5 degrees per frame at 60 fps.
            rate_deg_per_s: 30.0,
            target_deg: 45.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient_intensity: f32,
    pub directional_intensity: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_intensity: 0.75,
            directional_intensity: 0.25,
        }
    }
}

impl LightingConfig {
    pub fn rig(&self) -> LightingRig {
        LightingRig {
            ambient_intensity: self.ambient_intensity,
            directional_intensity: self.directional_intensity,
            directional_position: Vec3::new(0.0, 10.0, 50.0),
        }
    }
}

/// Overlay tuning. Marker colors and the marker lift are fixed and not part
/// of this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Altitude given to the anchor when it is (re)placed.
    pub anchor_altitude_m: f64,
    /// Largest animation step taken for a single frame.
    pub max_frame_dt_s: f64,
    pub tilt_ramp: TiltRampConfig,
    pub lighting: LightingConfig,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            anchor_altitude_m: 100.0,
            max_frame_dt_s: 0.25,
            tilt_ramp: TiltRampConfig::default(),
            lighting: LightingConfig::default(),
        }
    }
}

impl OverlayConfig {
    pub fn from_json_str(json: &str) -> Result<Self, OverlayError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OverlayError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| OverlayError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), OverlayError> {
        if !self.anchor_altitude_m.is_finite() {
            return Err(OverlayError::Config(
                "anchor_altitude_m must be finite".to_string(),
            ));
        }
        if !(self.max_frame_dt_s.is_finite() && self.max_frame_dt_s > 0.0) {
            return Err(OverlayError::Config(
                "max_frame_dt_s must be positive".to_string(),
            ));
        }
        let ramp = &self.tilt_ramp;
        if ramp.enabled && !(ramp.rate_deg_per_s > 0.0 && (0.0..=90.0).contains(&ramp.target_deg)) {
            return Err(OverlayError::Config(format!(
                "tilt ramp needs a positive rate and a target in [0, 90], got {} deg/s to {} deg",
                ramp.rate_deg_per_s, ramp.target_deg
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::OverlayConfig;
    use crate::error::OverlayError;

    #[test]
    fn empty_object_gives_defaults() {
        let config = OverlayConfig::from_json_str("{}").unwrap();
        assert_eq!(config, OverlayConfig::default());
        assert_eq!(config.anchor_altitude_m, 100.0);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config =
            OverlayConfig::from_json_str(r#"{"tilt_ramp": {"target_deg": 30.0}}"#).unwrap();
        assert_eq!(config.tilt_ramp.target_deg, 30.0);
        assert_eq!(config.tilt_ramp.rate_deg_per_s, 30.0);
        assert!(config.tilt_ramp.enabled);
    }

    #[test]
    fn rejects_bad_values() {
        let err = OverlayConfig::from_json_str(r#"{"max_frame_dt_s": 0}"#).unwrap_err();
        assert!(matches!(err, OverlayError::Config(_)));

        let err = OverlayConfig::from_json_str(r#"{"tilt_ramp": {"target_deg": 120}}"#).unwrap_err();
        assert!(matches!(err, OverlayError::Config(_)));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            OverlayConfig::from_json_str("{not json"),
            Err(OverlayError::Config(_))
        ));
    }
}
