//! Fused output types

use chrono::{DateTime, Utc};
use nalgebra::{Matrix3, Point3, Rotation3, UnitQuaternion, Vector3};

use crate::types::labels::TrackLabel;
use crate::types::skeleton::{Hand, JointType, TrackingState, JOINT_COUNT};

// ============================================================================
// Joint Orientation
// ============================================================================

/// A joint's local frame as a 3×3 matrix whose rows are the frame's x, y
/// and z axes in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointOrientation(pub Matrix3<f64>);

impl JointOrientation {
    /// The world-aligned frame.
    #[inline]
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    /// Builds a frame from its three axes.
    pub fn from_axes(x: Vector3<f64>, y: Vector3<f64>, z: Vector3<f64>) -> Self {
        Self(Matrix3::from_rows(&[
            x.transpose(),
            y.transpose(),
            z.transpose(),
        ]))
    }

    #[inline]
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    #[inline]
    pub fn x_axis(&self) -> Vector3<f64> {
        self.0.row(0).transpose()
    }

    #[inline]
    pub fn y_axis(&self) -> Vector3<f64> {
        self.0.row(1).transpose()
    }

    #[inline]
    pub fn z_axis(&self) -> Vector3<f64> {
        self.0.row(2).transpose()
    }

    /// The rotation taking world axes onto this frame's axes.
    ///
    /// Only meaningful for proper frames; a frame with a zero axis (from
    /// degenerate input positions) gives an arbitrary quaternion.
    pub fn to_quaternion(&self) -> UnitQuaternion<f64> {
        let rotation = Rotation3::from_matrix_unchecked(self.0.transpose());
        UnitQuaternion::from_rotation_matrix(&rotation)
    }
}

impl Default for JointOrientation {
    fn default() -> Self {
        Self::identity()
    }
}

// ============================================================================
// Fused Skeleton
// ============================================================================

/// One joint of a fused pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedJoint {
    pub position: Point3<f64>,
    pub orientation: JointOrientation,
    pub tracking_state: TrackingState,
}

/// A track's pose predicted to a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedSkeleton {
    pub label: TrackLabel,
    /// Hip centre position.
    pub position: Point3<f64>,
    /// Indexed by [`JointType::index`].
    pub joints: [FusedJoint; JOINT_COUNT],
    pub tracking_state: TrackingState,
    pub left_hand_closed: bool,
    pub right_hand_closed: bool,
    /// The time the pose was predicted for.
    pub timestamp: DateTime<Utc>,
}

impl FusedSkeleton {
    #[inline]
    pub fn joint(&self, joint: JointType) -> &FusedJoint {
        &self.joints[joint.index()]
    }

    #[inline]
    pub fn hand_closed(&self, hand: Hand) -> bool {
        match hand {
            Hand::Left => self.left_hand_closed,
            Hand::Right => self.right_hand_closed,
        }
    }
}
