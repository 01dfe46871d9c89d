//! Utilities: time source and online statistics

mod clock;
mod running_mean;

pub use clock::*;
pub use running_mean::*;
