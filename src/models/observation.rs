//! Observation (sensor) models
//!
//! Describes how sensor measurements relate to joint states.

use nalgebra::RealField;
use num_traits::Float;

use crate::types::spaces::MeasurementCovariance;
use crate::types::transforms::ObservationMatrix;

/// Trait for linear observation models.
///
/// Describes the measurement process:
/// z = H * x + v
///
/// where H is the observation matrix and v is zero-mean Gaussian noise.
/// The noise covariance R is supplied per measurement by the caller.
pub trait ObservationModel<T: RealField, const N: usize, const M: usize> {
    /// Returns the observation matrix.
    fn observation_matrix(&self) -> ObservationMatrix<T, M, N>;
}

// ============================================================================
// Position Sensor
// ============================================================================

/// Observes the position component of a single-axis `[p, v, a]` state.
///
/// Body trackers report an error estimate with every joint, so the noise
/// is supplied per measurement through [`noise_for`](Self::noise_for). The
/// configured `min_sigma` keeps a zero or missing error report from turning
/// into an infinitely confident measurement.
#[derive(Debug, Clone)]
pub struct PositionSensor1D<T: RealField> {
    /// Floor on the measurement standard deviation
    pub min_sigma: T,
}

impl<T: RealField + Float + Copy> PositionSensor1D<T> {
    /// Creates a new position sensor.
    ///
    /// # Panics
    /// Panics if `min_sigma <= 0`.
    pub fn new(min_sigma: T) -> Self {
        assert!(min_sigma > T::zero(), "Measurement noise floor must be positive");
        Self { min_sigma }
    }

    /// Noise covariance for a measurement reported with standard deviation
    /// `sigma`. Non-finite or too-small reports fall back to the floor.
    pub fn noise_for(&self, sigma: T) -> MeasurementCovariance<T, 1> {
        let sigma = if Float::is_finite(sigma) {
            Float::max(Float::abs(sigma), self.min_sigma)
        } else {
            self.min_sigma
        };
        MeasurementCovariance::from_matrix(nalgebra::matrix![sigma * sigma])
    }
}

impl<T: RealField + Float + Copy> ObservationModel<T, 3, 1> for PositionSensor1D<T> {
    fn observation_matrix(&self) -> ObservationMatrix<T, 1, 3> {
        let one = T::one();
        let zero = T::zero();

        ObservationMatrix::from_matrix(nalgebra::matrix![one, zero, zero])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::spaces::StateVector;

    #[test]
    fn test_observes_position_only() {
        let sensor = PositionSensor1D::new(1e-4_f64);
        let state = StateVector::from_array([0.42, 3.0, -9.0]);
        let z = sensor.observation_matrix().observe(&state);
        assert!((z.index(0) - 0.42).abs() < 1e-12);
    }

    #[test]
    fn test_noise_floor() {
        let sensor = PositionSensor1D::new(1e-4_f64);

        let reported = sensor.noise_for(0.01);
        assert!((reported.leading_variance() - 1e-4).abs() < 1e-15);

        let zero = sensor.noise_for(0.0);
        assert!((zero.leading_variance() - 1e-8).abs() < 1e-20);

        let nan = sensor.noise_for(f64::NAN);
        assert!((nan.leading_variance() - 1e-8).abs() < 1e-20);
    }
}
