//! Multi-sensor body tracking
//!
//! - [`SkeletonMerger`]: entry point; merges observations, serves predictions
//! - [`TrackCollection`]: mutex-guarded track storage and its [`TrackScope`]
//! - [`Track`]: per-person joint and grip filters
//! - [`matcher`]: observation-to-track scoring

pub mod collection;
pub mod estimate;
pub mod matcher;
pub mod merger;
pub mod track;

pub use collection::{TrackCollection, TrackScope};
pub use estimate::{FusedJoint, FusedSkeleton, JointOrientation};
pub use matcher::{MatchCandidate, MatchScore};
pub use merger::{MergeOutcome, SkeletonMerger};
pub use track::Track;
