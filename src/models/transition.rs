//! Transition (motion) models for joint dynamics
//!
//! Describes how a joint coordinate evolves between measurements.

use nalgebra::RealField;
use num_traits::Float;

use crate::types::spaces::StateCovariance;
use crate::types::transforms::TransitionMatrix;

/// Trait for linear transition (motion) models.
///
/// Describes dynamics in the form:
/// x_{k+1} = F * x_k + w
///
/// where:
/// - F is the state transition matrix
/// - w is zero-mean Gaussian process noise with covariance Q
pub trait TransitionModel<T: RealField, const N: usize> {
    /// Returns the state transition matrix for time step dt.
    fn transition_matrix(&self, dt: T) -> TransitionMatrix<T, N>;

    /// Returns the process noise covariance for time step dt.
    fn process_noise(&self, dt: T) -> StateCovariance<T, N>;
}

// ============================================================================
// Constant Jerk
// ============================================================================

/// Constant-acceleration kinematics driven by white jerk noise, on a single
/// axis.
///
/// State: [p, v, a]
///
/// `dt` may be negative: a measurement older than the filter epoch is
/// reached by running the kinematics backwards. The noise is always that of
/// the elapsed duration `|dt|`, so uncertainty grows in both directions.
#[derive(Debug, Clone)]
pub struct ConstantJerk<T: RealField> {
    /// Jerk spectral density q (m²/s⁵ for positions in metres)
    pub jerk_density: T,
}

impl<T: RealField + Float + Copy> ConstantJerk<T> {
    /// Creates a new constant jerk model.
    ///
    /// # Arguments
    /// - `jerk_density`: Spectral density of the white jerk noise (must be >= 0)
    ///
    /// # Panics
    /// Panics if `jerk_density < 0`.
    pub fn new(jerk_density: T) -> Self {
        assert!(
            jerk_density >= T::zero(),
            "Jerk spectral density must be non-negative"
        );
        Self { jerk_density }
    }
}

impl<T: RealField + Float + Copy> TransitionModel<T, 3> for ConstantJerk<T> {
    fn transition_matrix(&self, dt: T) -> TransitionMatrix<T, 3> {
        let one = T::one();
        let zero = T::zero();
        let half_dt2 = dt * dt / nalgebra::convert::<f64, T>(2.0);

        TransitionMatrix::from_matrix(nalgebra::matrix![
            one, dt, half_dt2;
            zero, one, dt;
            zero, zero, one
        ])
    }

    fn process_noise(&self, dt: T) -> StateCovariance<T, 3> {
        let a = Float::abs(dt);
        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;

        let c = |v: f64| nalgebra::convert::<f64, T>(v);
        let q = self.jerk_density;

        let q11 = a5 / c(20.0) * q;
        let q12 = a4 / c(8.0) * q;
        let q13 = a3 / c(6.0) * q;
        let q22 = a3 / c(3.0) * q;
        let q23 = a2 / c(2.0) * q;
        let q33 = a * q;

        StateCovariance::from_matrix(nalgebra::matrix![
            q11, q12, q13;
            q12, q22, q23;
            q13, q23, q33
        ])
    }
}
