//! State estimation filters
//!
//! - [`kalman::KalmanFilter`]: Generic linear Kalman filter over typed spaces
//! - [`JerkFilter3D`]: Per-joint position/velocity/acceleration estimator
//! - [`GripFilter`]: Open/closed hand estimator

pub mod grip;
pub mod jerk;
pub mod kalman;

pub use grip::GripFilter;
pub use jerk::{JerkFilter3D, JointPrediction};
