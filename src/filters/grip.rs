//! Binary grip filter
//!
//! Smooths a stream of open/closed hand readings. The hidden grip value is
//! modelled as constant with random-walk drift; each reading is a 1.0 or 0.0
//! measurement of it.

use chrono::{DateTime, Utc};

use crate::config::FusionConfig;
use crate::utils::ms_between;

/// Scalar estimator of whether a hand is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct GripFilter {
    value: f64,
    variance: f64,
    last_update: Option<DateTime<Utc>>,
    measurement_variance: f64,
    /// Process noise per elapsed millisecond
    noise_rate: f64,
    threshold: f64,
}

impl GripFilter {
    /// Creates an open-hand estimate with the given initial variance.
    pub fn new(
        measurement_variance: f64,
        noise_rate: f64,
        initial_variance: f64,
        threshold: f64,
    ) -> Self {
        Self {
            value: 0.0,
            variance: initial_variance,
            last_update: None,
            measurement_variance,
            noise_rate,
            threshold,
        }
    }

    pub fn from_config(config: &FusionConfig) -> Self {
        Self::new(
            config.grip_measurement_variance,
            config.grip_noise_rate,
            config.grip_initial_variance,
            config.grip_threshold,
        )
    }

    /// Folds one open/closed reading into the estimate.
    ///
    /// The variance first grows by `noise_rate` for every millisecond since
    /// the previous reading, then a scalar Kalman update is applied.
    pub fn integrate(&mut self, closed: bool, timestamp: DateTime<Utc>) {
        let elapsed_ms = self
            .last_update
            .map(|last| ms_between(last, timestamp).abs())
            .unwrap_or(0.0);

        let prior = self.variance + self.noise_rate * elapsed_ms;
        let innovation_variance = prior + self.measurement_variance;
        if innovation_variance.is_nan() || innovation_variance <= 0.0 {
            return;
        }

        let gain = prior / innovation_variance;
        let z = if closed { 1.0 } else { 0.0 };
        self.value += gain * (z - self.value);
        self.variance = (1.0 - gain) * prior;
        self.last_update = Some(timestamp);
    }

    /// `true` when the hand is estimated closed.
    #[inline]
    pub fn predict(&self) -> bool {
        self.value > self.threshold
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    pub fn variance(&self) -> f64 {
        self.variance
    }

    #[inline]
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }
}
