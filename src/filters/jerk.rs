//! Jerk-model joint filter
//!
//! Estimates one joint's 3D position, velocity and acceleration. The three
//! coordinate axes are filtered independently with a constant-jerk model,
//! so the 9-state covariance is block diagonal and is stored as three 3×3
//! blocks.

use chrono::{DateTime, Utc};
use nalgebra::{Matrix3, Point3, Vector3};

use crate::config::FusionConfig;
use crate::filters::kalman::{KalmanFilter, KalmanState};
use crate::models::{ConstantJerk, PositionSensor1D};
use crate::types::spaces::{Measurement, StateCovariance, StateVector};
use crate::utils::ms_between;

type AxisFilter = KalmanFilter<f64, ConstantJerk<f64>, PositionSensor1D<f64>, 3, 1>;

/// Predicted joint position with its uncertainty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointPrediction {
    pub position: Point3<f64>,
    /// Position/velocity/acceleration covariance of the x, y and z axes,
    /// the diagonal blocks of the block-diagonal 9×9 state covariance.
    pub axis_covariances: [Matrix3<f64>; 3],
    /// Frobenius norm of the full 9×9 state covariance.
    pub covariance_norm: f64,
}

impl JointPrediction {
    /// Natural log of the covariance norm, the quantity joint
    /// classification thresholds are expressed in.
    #[inline]
    pub fn log_norm(&self) -> f64 {
        self.covariance_norm.ln()
    }
}

/// Per-joint kinematic estimator.
#[derive(Debug, Clone)]
pub struct JerkFilter3D {
    filter: AxisFilter,
    axes: [KalmanState<f64, 3>; 3],
    last_update: Option<DateTime<Utc>>,
}

impl JerkFilter3D {
    /// Creates a filter with a zero state and `initial_variance · I`
    /// covariance.
    ///
    /// # Panics
    /// Panics if `jerk_density < 0` or `min_sigma <= 0`.
    pub fn new(jerk_density: f64, initial_variance: f64, min_sigma: f64) -> Self {
        let prior = KalmanState::new(
            StateVector::zeros(),
            StateCovariance::isotropic(initial_variance),
        );
        Self {
            filter: KalmanFilter::new(
                ConstantJerk::new(jerk_density),
                PositionSensor1D::new(min_sigma),
            ),
            axes: core::array::from_fn(|_| prior.clone()),
            last_update: None,
        }
    }

    /// Creates a filter from a validated configuration.
    pub fn from_config(config: &FusionConfig) -> Self {
        Self::new(
            config.jerk_spectral_density,
            config.initial_variance,
            config.min_measurement_std,
        )
    }

    /// Time of the last integrated measurement, which is the filter epoch.
    #[inline]
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Folds a position measurement into the state.
    ///
    /// The state is propagated from the epoch to `timestamp` (backwards if
    /// the measurement is older) before the update, and `timestamp` becomes
    /// the new epoch. Measurements with a non-finite coordinate are ignored.
    ///
    /// # Returns
    /// `true` if the measurement was integrated
    pub fn integrate(
        &mut self,
        position: &Point3<f64>,
        timestamp: DateTime<Utc>,
        noise_std: &Vector3<f64>,
    ) -> bool {
        if !position.coords.iter().all(|c| c.is_finite()) {
            log::trace!("ignoring non-finite joint position {position:?}");
            return false;
        }

        let dt = self.seconds_since_epoch(timestamp);
        for (axis, state) in self.axes.iter_mut().enumerate() {
            let z = Measurement::from_array([position[axis]]);
            let noise = self.filter.observation.noise_for(noise_std[axis]);
            *state = self.filter.step(state, dt, &z, &noise);
        }
        self.last_update = Some(timestamp);
        true
    }

    /// Predicts the position at an absolute time without touching the state.
    ///
    /// Before the first measurement this is the origin with the initial
    /// covariance.
    pub fn predict_at(&self, time: DateTime<Utc>) -> JointPrediction {
        if self.last_update.is_none() {
            return JointPrediction {
                position: Point3::origin(),
                axis_covariances: blocks(&self.axes),
                covariance_norm: block_norm(self.axes.iter()),
            };
        }

        let dt = self.seconds_since_epoch(time);
        let predicted: [KalmanState<f64, 3>; 3] =
            core::array::from_fn(|axis| self.filter.predict(&self.axes[axis], dt));

        JointPrediction {
            position: Point3::new(
                predicted[0].position(),
                predicted[1].position(),
                predicted[2].position(),
            ),
            axis_covariances: blocks(&predicted),
            covariance_norm: block_norm(predicted.iter()),
        }
    }

    /// Covariance norm at the filter epoch.
    pub fn covariance_norm(&self) -> f64 {
        block_norm(self.axes.iter())
    }

    fn seconds_since_epoch(&self, time: DateTime<Utc>) -> f64 {
        self.last_update
            .map(|epoch| ms_between(epoch, time) / 1000.0)
            .unwrap_or(0.0)
    }
}

fn blocks(axes: &[KalmanState<f64, 3>; 3]) -> [Matrix3<f64>; 3] {
    core::array::from_fn(|axis| *axes[axis].covariance.as_matrix())
}

fn block_norm<'a>(axes: impl Iterator<Item = &'a KalmanState<f64, 3>>) -> f64 {
    axes.map(|s| s.covariance.frobenius_norm_squared())
        .sum::<f64>()
        .sqrt()
}
