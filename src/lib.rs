//! skelfuse: multi-sensor skeleton fusion
//!
//! Fuses body-tracking skeletons from several independent sensors into one
//! set of temporally consistent poses that can be queried slightly ahead of
//! the present.
//!
//! # Features
//!
//! - **Association**: each observation joins the closest track, straight or
//!   left/right mirrored, or starts a new one
//! - **Per-joint filtering**: a constant-jerk Kalman filter per joint axis
//!   built on space-tagged nalgebra types
//! - **Grip estimation**: a scalar filter smoothing open/closed hand readings
//! - **Orientation**: closed-form joint rotation frames from filtered positions
//!
//! # Example
//!
//! ```
//! use skelfuse::prelude::*;
//!
//! let merger = SkeletonMerger::new();
//! let poses = merger.predict_all(0.0);
//! assert!(poses.is_empty());
//! ```

pub mod config;
pub mod filters;
pub mod models;
pub mod orientation;
pub mod tracking;
pub mod types;
pub mod utils;

pub mod prelude {
    pub use crate::config::*;
    pub use crate::filters::*;
    pub use crate::tracking::*;
    pub use crate::types::labels::*;
    pub use crate::types::skeleton::*;
    pub use crate::utils::{Clock, ManualClock, SystemClock};
    pub use crate::{FusionError, Result};
}

/// Error types for the library
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FusionError {
    /// A configuration parameter is non-finite or out of range
    #[error("invalid configuration for `{field}`: {reason}")]
    InvalidConfig {
        /// Name of the offending parameter
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

impl FusionError {
    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        FusionError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = ::core::result::Result<T, FusionError>;
