//! Model traits for joint state estimation
//!
//! This module defines the traits that describe joint dynamics and sensor
//! characteristics, with the concrete models the joint filter uses.

mod observation;
mod transition;

pub use observation::*;
pub use transition::*;
