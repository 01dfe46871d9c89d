//! Linear Kalman filter core
//!
//! A type-safe discrete-time Kalman filter over the crate's space-tagged
//! vectors. The joint filter runs one of these per coordinate axis.
//!
//! # Example
//!
//! ```
//! use skelfuse::filters::kalman::{KalmanFilter, KalmanState};
//! use skelfuse::models::{ConstantJerk, PositionSensor1D};
//! use skelfuse::types::spaces::{Measurement, StateCovariance, StateVector};
//!
//! let filter = KalmanFilter::new(ConstantJerk::new(10.0_f64), PositionSensor1D::new(1e-4));
//!
//! // Unknown start: zero state, large covariance
//! let mut state = KalmanState::new(StateVector::zeros(), StateCovariance::isotropic(1000.0));
//!
//! // Measure 0.5 m with a 1 cm error, 33 ms later measure 0.51 m
//! let noise = filter.observation.noise_for(0.01);
//! state = filter
//!     .update_with_noise(&state, &Measurement::from_array([0.5]), &noise)
//!     .unwrap();
//! state = filter.predict(&state, 0.033);
//! state = filter
//!     .update_with_noise(&state, &Measurement::from_array([0.51]), &noise)
//!     .unwrap();
//!
//! assert!((state.position() - 0.51).abs() < 0.01);
//! ```

use core::marker::PhantomData;

use nalgebra::RealField;
use num_traits::Float;

use crate::models::{ObservationModel, TransitionModel};
use crate::types::spaces::{
    ComputeInnovation, Measurement, MeasurementCovariance, StateCovariance, StateVector,
};
use crate::types::transforms::{compute_innovation_covariance, compute_kalman_gain, joseph_update};

// ============================================================================
// Kalman Filter State
// ============================================================================

/// Mean and covariance of a state estimate.
///
/// # Type Parameters
///
/// - `T`: Scalar type (typically `f64`)
/// - `N`: State dimension (compile-time constant)
#[derive(Debug, Clone, PartialEq)]
pub struct KalmanState<T: RealField, const N: usize> {
    /// State estimate mean
    pub mean: StateVector<T, N>,
    /// State estimate covariance
    pub covariance: StateCovariance<T, N>,
}

impl<T: RealField + Copy, const N: usize> KalmanState<T, N> {
    /// Creates a new Kalman filter state.
    #[inline]
    pub fn new(mean: StateVector<T, N>, covariance: StateCovariance<T, N>) -> Self {
        Self { mean, covariance }
    }

    /// The first state component, the position for kinematic states.
    #[inline]
    pub fn position(&self) -> T {
        *self.mean.index(0)
    }
}

// ============================================================================
// Kalman Filter
// ============================================================================

/// A standard discrete-time Kalman filter.
///
/// # Type Parameters
///
/// - `T`: Scalar type
/// - `Trans`: Transition model type
/// - `Obs`: Observation model type
/// - `N`: State dimension
/// - `M`: Measurement dimension
#[derive(Debug, Clone)]
pub struct KalmanFilter<T, Trans, Obs, const N: usize, const M: usize>
where
    T: RealField,
    Trans: TransitionModel<T, N>,
    Obs: ObservationModel<T, N, M>,
{
    /// Transition (motion) model
    pub transition: Trans,
    /// Observation (sensor) model
    pub observation: Obs,
    _marker: PhantomData<T>,
}

impl<T, Trans, Obs, const N: usize, const M: usize> KalmanFilter<T, Trans, Obs, N, M>
where
    T: RealField + Float + Copy,
    Trans: TransitionModel<T, N>,
    Obs: ObservationModel<T, N, M>,
{
    /// Creates a new Kalman filter with the given models.
    #[inline]
    pub fn new(transition: Trans, observation: Obs) -> Self {
        Self {
            transition,
            observation,
            _marker: PhantomData,
        }
    }

    /// Performs the prediction step.
    ///
    /// - x_pred = F * x
    /// - P_pred = F * P * F^T + Q
    ///
    /// # Arguments
    /// - `state`: Current state estimate
    /// - `dt`: Time step; the sign handling is up to the transition model
    ///
    /// # Returns
    /// Predicted state estimate
    pub fn predict(&self, state: &KalmanState<T, N>, dt: T) -> KalmanState<T, N> {
        let f = self.transition.transition_matrix(dt);
        let q = self.transition.process_noise(dt);

        KalmanState {
            mean: f.apply_state(&state.mean),
            covariance: f.propagate_covariance(&state.covariance).add(&q),
        }
    }

    /// Performs the update step with a per-measurement noise covariance.
    ///
    /// - y = z - H * x (innovation)
    /// - S = H * P * H^T + R (innovation covariance)
    /// - K = P * H^T * S^{-1} (Kalman gain)
    /// - x_upd = x + K * y
    /// - P_upd = (I - K*H) * P * (I - K*H)^T + K * R * K^T (Joseph form)
    ///
    /// # Returns
    /// Updated state estimate, or `None` if the innovation covariance is singular
    pub fn update_with_noise(
        &self,
        state: &KalmanState<T, N>,
        measurement: &Measurement<T, M>,
        meas_noise: &MeasurementCovariance<T, M>,
    ) -> Option<KalmanState<T, N>> {
        let h = self.observation.observation_matrix();

        let innovation = measurement.innovation(h.observe(&state.mean));
        let innovation_cov = compute_innovation_covariance(&state.covariance, &h, meas_noise);
        let kalman_gain = compute_kalman_gain(&state.covariance, &h, &innovation_cov)?;

        let correction = kalman_gain.correct(&innovation);
        let updated_mean = state.mean + correction;
        let updated_cov = joseph_update(&state.covariance, &kalman_gain, &h, meas_noise);

        Some(KalmanState {
            mean: updated_mean,
            covariance: updated_cov,
        })
    }

    /// Performs a single predict-update cycle.
    ///
    /// If the update fails the prediction is returned unchanged, so the
    /// estimate free-runs instead of being lost.
    pub fn step(
        &self,
        state: &KalmanState<T, N>,
        dt: T,
        measurement: &Measurement<T, M>,
        meas_noise: &MeasurementCovariance<T, M>,
    ) -> KalmanState<T, N> {
        let predicted = self.predict(state, dt);
        self.update_with_noise(&predicted, measurement, meas_noise)
            .unwrap_or(predicted)
    }
}

// ============================================================================
// Tests
// ============================================================================
