//! Skeleton data model
//!
//! Joint enumeration, the left/right mirror table, and the raw per-sensor
//! observation structs handed to the merger by acquisition code.

use chrono::{DateTime, Utc};
use nalgebra::{Point3, Vector3};

/// Number of joints in a skeleton.
pub const JOINT_COUNT: usize = 25;

// ============================================================================
// Joint Enumeration
// ============================================================================

/// Anatomical joint. The discriminant is the joint's index in every
/// per-joint array of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JointType {
    HipCenter = 0,
    Spine,
    Neck,
    Head,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
    ShoulderCenter,
    HandTipLeft,
    ThumbLeft,
    HandTipRight,
    ThumbRight,
}

impl JointType {
    /// Every joint, in index order.
    pub const ALL: [JointType; JOINT_COUNT] = [
        JointType::HipCenter,
        JointType::Spine,
        JointType::Neck,
        JointType::Head,
        JointType::ShoulderLeft,
        JointType::ElbowLeft,
        JointType::WristLeft,
        JointType::HandLeft,
        JointType::ShoulderRight,
        JointType::ElbowRight,
        JointType::WristRight,
        JointType::HandRight,
        JointType::HipLeft,
        JointType::KneeLeft,
        JointType::AnkleLeft,
        JointType::FootLeft,
        JointType::HipRight,
        JointType::KneeRight,
        JointType::AnkleRight,
        JointType::FootRight,
        JointType::ShoulderCenter,
        JointType::HandTipLeft,
        JointType::ThumbLeft,
        JointType::HandTipRight,
        JointType::ThumbRight,
    ];

    /// Position of this joint in per-joint arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Joint at the given array index, if any.
    #[inline]
    pub fn from_index(index: usize) -> Option<JointType> {
        Self::ALL.get(index).copied()
    }

    /// The bilateral counterpart of this joint. Central joints map to
    /// themselves, and applying the mapping twice is the identity.
    pub const fn mirror(self) -> JointType {
        use JointType::*;
        match self {
            ShoulderLeft => ShoulderRight,
            ShoulderRight => ShoulderLeft,
            ElbowLeft => ElbowRight,
            ElbowRight => ElbowLeft,
            WristLeft => WristRight,
            WristRight => WristLeft,
            HandLeft => HandRight,
            HandRight => HandLeft,
            HandTipLeft => HandTipRight,
            HandTipRight => HandTipLeft,
            ThumbLeft => ThumbRight,
            ThumbRight => ThumbLeft,
            HipLeft => HipRight,
            HipRight => HipLeft,
            KneeLeft => KneeRight,
            KneeRight => KneeLeft,
            AnkleLeft => AnkleRight,
            AnkleRight => AnkleLeft,
            FootLeft => FootRight,
            FootRight => FootLeft,
            HipCenter | Spine | Neck | Head | ShoulderCenter => self,
        }
    }

    /// Source joint under a track orientation: itself, or its mirror when
    /// the observation is matched left/right swapped.
    #[inline]
    pub const fn resolve(self, mirrored: bool) -> JointType {
        if mirrored {
            self.mirror()
        } else {
            self
        }
    }

    /// True for hand, hand tip and thumb joints.
    pub const fn is_hand(self) -> bool {
        matches!(
            self,
            JointType::HandLeft
                | JointType::HandRight
                | JointType::HandTipLeft
                | JointType::HandTipRight
                | JointType::ThumbLeft
                | JointType::ThumbRight
        )
    }
}

impl core::fmt::Display for JointType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(self, f)
    }
}

/// Which hand a grip reading belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    /// The hand joint carrying this hand's tracking state.
    #[inline]
    pub const fn joint(self) -> JointType {
        match self {
            Hand::Left => JointType::HandLeft,
            Hand::Right => JointType::HandRight,
        }
    }

    /// The opposite hand.
    #[inline]
    pub const fn mirror(self) -> Hand {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }
}

// ============================================================================
// Tracking State
// ============================================================================

/// Confidence a sensor (or the fusion engine) places on a joint or body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrackingState {
    Tracked,
    Inferred,
    #[default]
    NotTracked,
    PositionOnly,
}

impl TrackingState {
    /// Tracked or Inferred: the position carries information worth fusing.
    #[inline]
    pub const fn is_usable(self) -> bool {
        matches!(self, TrackingState::Tracked | TrackingState::Inferred)
    }
}

// ============================================================================
// Raw Observations
// ============================================================================

/// One joint as reported by one sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawJointObservation {
    /// Position in metres, in the shared world frame.
    pub position: Point3<f64>,
    pub tracking_state: TrackingState,
    /// Per-axis standard deviation of the position, in metres.
    pub position_error: Vector3<f64>,
    /// Absolute measurement time.
    pub timestamp: DateTime<Utc>,
}

impl RawJointObservation {
    pub fn new(
        position: Point3<f64>,
        tracking_state: TrackingState,
        position_error: Vector3<f64>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            position,
            tracking_state,
            position_error,
            timestamp,
        }
    }

    /// A joint the sensor did not see.
    pub fn not_tracked(timestamp: DateTime<Utc>) -> Self {
        Self::new(
            Point3::origin(),
            TrackingState::NotTracked,
            Vector3::zeros(),
            timestamp,
        )
    }
}

/// One body in one frame from one sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSkeletonObservation {
    /// Indexed by [`JointType::index`].
    pub joints: [RawJointObservation; JOINT_COUNT],
    pub tracking_state: TrackingState,
    pub left_hand_closed: bool,
    pub right_hand_closed: bool,
    /// Identifier of the originating sensor.
    pub sensor_id: String,
    pub timestamp: DateTime<Utc>,
}

impl RawSkeletonObservation {
    /// An observation with every joint NotTracked and both hands open.
    pub fn empty(sensor_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            joints: [RawJointObservation::not_tracked(timestamp); JOINT_COUNT],
            tracking_state: TrackingState::NotTracked,
            left_hand_closed: false,
            right_hand_closed: false,
            sensor_id: sensor_id.into(),
            timestamp,
        }
    }

    #[inline]
    pub fn joint(&self, joint: JointType) -> &RawJointObservation {
        &self.joints[joint.index()]
    }

    #[inline]
    pub fn joint_mut(&mut self, joint: JointType) -> &mut RawJointObservation {
        &mut self.joints[joint.index()]
    }

    /// Grip reading for a hand.
    #[inline]
    pub fn hand_closed(&self, hand: Hand) -> bool {
        match hand {
            Hand::Left => self.left_hand_closed,
            Hand::Right => self.right_hand_closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        for (i, joint) in JointType::ALL.iter().enumerate() {
            assert_eq!(joint.index(), i);
            assert_eq!(JointType::from_index(i), Some(*joint));
        }
        assert_eq!(JointType::from_index(JOINT_COUNT), None);
    }

    #[test]
    fn test_mirror_is_involution() {
        for joint in JointType::ALL {
            assert_eq!(joint.mirror().mirror(), joint);
        }
    }

    #[test]
    fn test_mirror_pairs() {
        let swapped = JointType::ALL
            .iter()
            .filter(|j| j.mirror() != **j)
            .count();
        assert_eq!(swapped, 20);

        assert_eq!(JointType::ThumbLeft.mirror(), JointType::ThumbRight);
        assert_eq!(JointType::FootRight.mirror(), JointType::FootLeft);
        assert_eq!(JointType::Head.mirror(), JointType::Head);
        assert_eq!(JointType::ShoulderCenter.mirror(), JointType::ShoulderCenter);
    }

    #[test]
    fn test_resolve_under_orientation() {
        assert_eq!(JointType::KneeLeft.resolve(false), JointType::KneeLeft);
        assert_eq!(JointType::KneeLeft.resolve(true), JointType::KneeRight);
        assert_eq!(Hand::Left.mirror().joint(), JointType::HandRight);
    }

    #[test]
    fn test_usable_states() {
        assert!(TrackingState::Tracked.is_usable());
        assert!(TrackingState::Inferred.is_usable());
        assert!(!TrackingState::NotTracked.is_usable());
        assert!(!TrackingState::PositionOnly.is_usable());
    }

    #[test]
    fn test_empty_observation() {
        let obs = RawSkeletonObservation::empty("kinect-0", Utc::now());
        assert_eq!(obs.tracking_state, TrackingState::NotTracked);
        assert!(obs
            .joints
            .iter()
            .all(|j| j.tracking_state == TrackingState::NotTracked));
        assert!(!obs.hand_closed(Hand::Left));
    }
}
