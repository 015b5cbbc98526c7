// ─────────────────────────────────────────────────────────────────────
// Drivegate — Arbiter Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{DrivegateError, DrivegateResult};

/// Runtime configuration for the acceleration arbiter.
///
/// Every deployment-tunable constant of the blending law lives here:
/// the observed vehicle variants disagree on the exact floor and
/// threshold values, so none of them are hard-coded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbiterConfig {
    /// Platform absolute lower acceleration bound (m/s²). Default: -3.48.
    pub accel_min: f64,

    /// Platform absolute upper acceleration bound (m/s²). Default: 2.0.
    pub accel_max: f64,

    /// Jerk limits sent with directly-arbitrated commands (m/s³).
    /// Defaults: -0.9 / 0.9. Stock-aware policies carry the envelope's
    /// own jerk values instead.
    pub jerk_limit_min: f64,
    pub jerk_limit_max: f64,

    /// Cruise set-speed ceiling (kph) for engaged direct control.
    /// Default: 145.
    pub max_cruise_kph: f64,

    /// Below this speed (kph) the stock envelope owns the max side.
    /// Default: 25.
    pub stock_band_kph: f64,

    /// Upper edge (kph) of the linear blend band. Default: 35.
    pub blend_band_kph: f64,

    /// Minimum positive acceleration request while engaged (m/s²).
    /// Default: 0.4.
    pub engage_floor: f64,

    /// Desired accel below this (m/s²) counts as an aggressive braking
    /// override when still above the stock floor. Default: -0.5.
    pub brake_override_accel: f64,

    /// Post-clip ceiling on the emitted accel_min (m/s²): the command
    /// always grants at least this much braking authority.
    /// Default: -0.4 (-0.6 on some vehicle variants).
    pub accel_min_ceiling: f64,

    /// Post-clip floor on the emitted accel_max (m/s²).
    /// Default: 0.0 (0.1 on some vehicle variants).
    pub accel_max_floor: f64,

    /// Max-side fade duration (s) for the time-faded policy. Default: 2.0.
    pub max_fade_s: f64,

    /// Min-side fade durations (s) for entering and leaving the
    /// braking-override condition; each leg fades on its own clock.
    /// Defaults: 1.0 / 1.0.
    pub min_fade_enter_s: f64,
    pub min_fade_exit_s: f64,

    /// Speed (kph) separating the slow and fast slew regimes of the
    /// rate-limited stock-follow policy. Default: 40.
    pub rate_limit_band_kph: f64,

    /// Max-side per-cycle slew (m/s² per cycle) below / above the
    /// rate-limit band. Defaults: 0.03 / 0.005.
    pub max_slew_low: f64,
    pub max_slew_high: f64,

    /// Min-side per-cycle slew when releasing brake into coast, when
    /// deep in braking, and otherwise. Defaults: 0.001 / 0.04 / 0.01.
    pub min_slew_release: f64,
    pub min_slew_deep_brake: f64,
    pub min_slew_default: f64,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            accel_min: -3.48,
            accel_max: 2.0,
            jerk_limit_min: -0.9,
            jerk_limit_max: 0.9,
            max_cruise_kph: 145.0,
            stock_band_kph: 25.0,
            blend_band_kph: 35.0,
            engage_floor: 0.4,
            brake_override_accel: -0.5,
            accel_min_ceiling: -0.4,
            accel_max_floor: 0.0,
            max_fade_s: 2.0,
            min_fade_enter_s: 1.0,
            min_fade_exit_s: 1.0,
            rate_limit_band_kph: 40.0,
            max_slew_low: 0.03,
            max_slew_high: 0.005,
            min_slew_release: 0.001,
            min_slew_deep_brake: 0.04,
            min_slew_default: 0.01,
        }
    }
}

impl ArbiterConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> DrivegateResult<()> {
        let fields = [
            ("accel_min", self.accel_min),
            ("accel_max", self.accel_max),
            ("jerk_limit_min", self.jerk_limit_min),
            ("jerk_limit_max", self.jerk_limit_max),
            ("max_cruise_kph", self.max_cruise_kph),
            ("stock_band_kph", self.stock_band_kph),
            ("blend_band_kph", self.blend_band_kph),
            ("engage_floor", self.engage_floor),
            ("brake_override_accel", self.brake_override_accel),
            ("accel_min_ceiling", self.accel_min_ceiling),
            ("accel_max_floor", self.accel_max_floor),
            ("max_fade_s", self.max_fade_s),
            ("min_fade_enter_s", self.min_fade_enter_s),
            ("min_fade_exit_s", self.min_fade_exit_s),
            ("rate_limit_band_kph", self.rate_limit_band_kph),
            ("max_slew_low", self.max_slew_low),
            ("max_slew_high", self.max_slew_high),
            ("min_slew_release", self.min_slew_release),
            ("min_slew_deep_brake", self.min_slew_deep_brake),
            ("min_slew_default", self.min_slew_default),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(DrivegateError::Config(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }

        if self.accel_min >= self.accel_max {
            return Err(DrivegateError::Config(format!(
                "accel_min must be < accel_max, got {} >= {}",
                self.accel_min, self.accel_max
            )));
        }
        if self.jerk_limit_min >= self.jerk_limit_max {
            return Err(DrivegateError::Config(format!(
                "jerk_limit_min must be < jerk_limit_max, got {} >= {}",
                self.jerk_limit_min, self.jerk_limit_max
            )));
        }
        if self.max_cruise_kph <= 0.0 {
            return Err(DrivegateError::Config(format!(
                "max_cruise_kph must be > 0, got {}",
                self.max_cruise_kph
            )));
        }
        if self.stock_band_kph <= 0.0 || self.stock_band_kph >= self.blend_band_kph {
            return Err(DrivegateError::Config(format!(
                "speed bands must satisfy 0 < stock < blend, got {} / {}",
                self.stock_band_kph, self.blend_band_kph
            )));
        }
        if !(0.0..=self.accel_max).contains(&self.engage_floor) {
            return Err(DrivegateError::Config(format!(
                "engage_floor must be in [0, accel_max], got {}",
                self.engage_floor
            )));
        }
        if self.brake_override_accel >= 0.0 {
            return Err(DrivegateError::Config(format!(
                "brake_override_accel must be < 0, got {}",
                self.brake_override_accel
            )));
        }
        // The ceiling/floor pair is what guarantees accel_min <= accel_max
        // after the post-clip discipline.
        if self.accel_min_ceiling <= self.accel_min || self.accel_min_ceiling >= 0.0 {
            return Err(DrivegateError::Config(format!(
                "accel_min_ceiling must be in (accel_min, 0), got {}",
                self.accel_min_ceiling
            )));
        }
        if self.accel_max_floor < 0.0 || self.accel_max_floor >= self.accel_max {
            return Err(DrivegateError::Config(format!(
                "accel_max_floor must be in [0, accel_max), got {}",
                self.accel_max_floor
            )));
        }
        if self.max_fade_s <= 0.0 || self.min_fade_enter_s <= 0.0 || self.min_fade_exit_s <= 0.0 {
            return Err(DrivegateError::Config(format!(
                "fade durations must be > 0, got {} / {} / {}",
                self.max_fade_s, self.min_fade_enter_s, self.min_fade_exit_s
            )));
        }
        if self.rate_limit_band_kph <= 0.0 {
            return Err(DrivegateError::Config(format!(
                "rate_limit_band_kph must be > 0, got {}",
                self.rate_limit_band_kph
            )));
        }
        let slews = [
            self.max_slew_low,
            self.max_slew_high,
            self.min_slew_release,
            self.min_slew_deep_brake,
            self.min_slew_default,
        ];
        if slews.iter().any(|&s| s <= 0.0) {
            return Err(DrivegateError::Config(
                "slew rates must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> DrivegateResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| DrivegateError::Config(format!("JSON parse error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(ArbiterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_platform_bounds_rejected() {
        let mut cfg = ArbiterConfig::default();
        cfg.accel_min = 2.0;
        cfg.accel_max = -3.48;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_nan_field_rejected() {
        let mut cfg = ArbiterConfig::default();
        cfg.engage_floor = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_inverted_speed_bands_rejected() {
        let mut cfg = ArbiterConfig::default();
        cfg.stock_band_kph = 35.0;
        cfg.blend_band_kph = 25.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_positive_min_ceiling_rejected() {
        let mut cfg = ArbiterConfig::default();
        cfg.accel_min_ceiling = 0.2;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_fade_rejected() {
        let mut cfg = ArbiterConfig::default();
        cfg.max_fade_s = 0.0;
        assert!(cfg.validate().is_err());
        let mut cfg = ArbiterConfig::default();
        cfg.min_fade_exit_s = -1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_variant_floor_constants_accepted() {
        // The -0.6 / 0.1 revision observed on other vehicle variants.
        let mut cfg = ArbiterConfig::default();
        cfg.accel_min_ceiling = -0.6;
        cfg.accel_max_floor = 0.1;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::to_string(&ArbiterConfig::default()).unwrap();
        let cfg = ArbiterConfig::from_json(&json).unwrap();
        assert!(cfg.validate().is_ok());
        assert!((cfg.accel_min + 3.48).abs() < 1e-12);
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(ArbiterConfig::from_json("{not json").is_err());
    }
}
