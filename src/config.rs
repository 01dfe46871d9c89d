//! Fusion engine configuration
//!
//! Every tunable constant of the engine lives here. Defaults reproduce the
//! behaviour the engine was calibrated with; `validate` rejects values that
//! would make the filters or the matcher misbehave.

use serde::{Deserialize, Serialize};

use crate::{FusionError, Result};

// ============================================================================
// Orientation Thresholds
// ============================================================================

/// Cosine limits above which a limb counts as straight for orientation
/// reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationThresholds {
    /// |upper arm · forearm| at or above which the elbow bend plane is
    /// considered degenerate.
    pub upper_limb_straight_cos: f64,
    /// thigh · shin at or above which the leg is treated as straight.
    pub leg_straight_cos: f64,
}

impl Default for OrientationThresholds {
    fn default() -> Self {
        Self {
            upper_limb_straight_cos: 0.94,
            leg_straight_cos: 0.972,
        }
    }
}

// ============================================================================
// Fusion Config
// ============================================================================

/// Configuration of a [`SkeletonMerger`](crate::tracking::SkeletonMerger).
///
/// Durations are in milliseconds, distances in metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Mean per-axis deviation below which an observation joins a track.
    pub match_threshold: f64,
    /// Tracks idle for longer than this are dropped by `predict_all`.
    pub stale_track_ms: f64,
    /// A joint tracked within this window may be reported as Tracked.
    pub fresh_measurement_ms: f64,
    /// ln(covariance norm) below which a fresh joint is Tracked.
    pub tracked_log_norm: f64,
    /// ln(covariance norm) below which a joint is Inferred.
    pub inferred_log_norm: f64,

    /// Jerk spectral density of the joint motion model, in m²/s⁵.
    pub jerk_spectral_density: f64,
    /// Initial variance of every joint state component.
    pub initial_variance: f64,
    /// Floor applied to reported per-axis position errors.
    pub min_measurement_std: f64,

    /// Variance of a single open/closed reading.
    pub grip_measurement_variance: f64,
    /// Grip process noise added per elapsed millisecond.
    pub grip_noise_rate: f64,
    /// Grip variance before the first reading.
    pub grip_initial_variance: f64,
    /// Grip estimate above which the hand is reported closed.
    pub grip_threshold: f64,

    /// Whether hand joints contribute to the matching deviation.
    pub include_hands_in_matching: bool,

    pub orientation: OrientationThresholds,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.3,
            stale_track_ms: 5000.0,
            fresh_measurement_ms: 1000.0,
            tracked_log_norm: 2.0,
            inferred_log_norm: 4.0,
            jerk_spectral_density: 10.0,
            initial_variance: 1000.0,
            min_measurement_std: 1e-4,
            grip_measurement_variance: 0.25,
            grip_noise_rate: 0.001,
            grip_initial_variance: 1000.0,
            grip_threshold: 0.5,
            include_hands_in_matching: true,
            orientation: OrientationThresholds::default(),
        }
    }
}

impl FusionConfig {
    /// Checks every parameter for finiteness and range.
    pub fn validate(&self) -> Result<()> {
        positive("match_threshold", self.match_threshold)?;
        positive("stale_track_ms", self.stale_track_ms)?;
        non_negative("fresh_measurement_ms", self.fresh_measurement_ms)?;
        finite("tracked_log_norm", self.tracked_log_norm)?;
        finite("inferred_log_norm", self.inferred_log_norm)?;
        if self.tracked_log_norm > self.inferred_log_norm {
            return Err(FusionError::invalid_config(
                "tracked_log_norm",
                "must not exceed inferred_log_norm",
            ));
        }

        non_negative("jerk_spectral_density", self.jerk_spectral_density)?;
        positive("initial_variance", self.initial_variance)?;
        positive("min_measurement_std", self.min_measurement_std)?;

        positive("grip_measurement_variance", self.grip_measurement_variance)?;
        non_negative("grip_noise_rate", self.grip_noise_rate)?;
        positive("grip_initial_variance", self.grip_initial_variance)?;
        unit_interval("grip_threshold", self.grip_threshold)?;

        unit_interval(
            "orientation.upper_limb_straight_cos",
            self.orientation.upper_limb_straight_cos,
        )?;
        unit_interval("orientation.leg_straight_cos", self.orientation.leg_straight_cos)?;

        Ok(())
    }
}

fn finite(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FusionError::invalid_config(field, "must be finite"))
    }
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(FusionError::invalid_config(field, "must be > 0"))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<()> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(FusionError::invalid_config(field, "must be >= 0"))
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<()> {
    finite(field, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(FusionError::invalid_config(field, "must be in [0, 1]"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(FusionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_constants() {
        let config = FusionConfig::default();
        assert_eq!(config.match_threshold, 0.3);
        assert_eq!(config.stale_track_ms, 5000.0);
        assert_eq!(config.fresh_measurement_ms, 1000.0);
        assert_eq!(config.orientation.upper_limb_straight_cos, 0.94);
        assert_eq!(config.orientation.leg_straight_cos, 0.972);
        assert!(config.include_hands_in_matching);
    }

    #[test]
    fn test_rejects_non_finite() {
        let config = FusionConfig {
            jerk_spectral_density: f64::NAN,
            ..FusionConfig::default()
        };
        match config.validate() {
            Err(FusionError::InvalidConfig { field, .. }) => {
                assert_eq!(field, "jerk_spectral_density")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_swapped_log_norm_cutoffs() {
        let config = FusionConfig {
            tracked_log_norm: 5.0,
            ..FusionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_cosine_out_of_range() {
        let mut config = FusionConfig::default();
        config.orientation.leg_straight_cos = 1.5;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("orientation.leg_straight_cos"));
    }
}
