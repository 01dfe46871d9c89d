//! A single fused body track

use chrono::{DateTime, Utc};
use nalgebra::Point3;

use crate::config::FusionConfig;
use crate::filters::{GripFilter, JerkFilter3D};
use crate::orientation;
use crate::tracking::estimate::{FusedJoint, FusedSkeleton};
use crate::types::labels::TrackLabel;
use crate::types::skeleton::{Hand, JointType, RawSkeletonObservation, TrackingState, JOINT_COUNT};
use crate::utils::{ms_between, offset_by_ms};

// ============================================================================
// Classification
// ============================================================================

/// Tracking state reported for a predicted joint.
///
/// # Arguments
/// - `log_norm`: ln of the predicted covariance norm
/// - `tracked_age_ms`: time since the joint was last measured as Tracked
///   (infinite if never)
///
/// A joint can only be reported Tracked while its last Tracked measurement
/// is fresh; after that the covariance alone decides between Inferred and
/// NotTracked.
pub fn classify_joint(log_norm: f64, tracked_age_ms: f64, config: &FusionConfig) -> TrackingState {
    if log_norm < config.tracked_log_norm && tracked_age_ms <= config.fresh_measurement_ms {
        TrackingState::Tracked
    } else if log_norm < config.inferred_log_norm {
        TrackingState::Inferred
    } else {
        TrackingState::NotTracked
    }
}

/// Tracked if any joint is Tracked, else Inferred if any is Inferred.
pub fn overall_state<'a>(states: impl IntoIterator<Item = &'a TrackingState>) -> TrackingState {
    let mut overall = TrackingState::NotTracked;
    for state in states {
        match state {
            TrackingState::Tracked => return TrackingState::Tracked,
            TrackingState::Inferred => overall = TrackingState::Inferred,
            _ => {}
        }
    }
    overall
}

// ============================================================================
// Track
// ============================================================================

/// One person as seen by the fused sensor array.
#[derive(Debug, Clone)]
pub struct Track {
    label: TrackLabel,
    joints: [JerkFilter3D; JOINT_COUNT],
    left_grip: GripFilter,
    right_grip: GripFilter,
    last_tracked: [Option<DateTime<Utc>>; JOINT_COUNT],
    last_inferred: [Option<DateTime<Utc>>; JOINT_COUNT],
}

impl Track {
    /// Creates a track with every filter at its prior.
    pub fn new(label: TrackLabel, config: &FusionConfig) -> Self {
        let joint = JerkFilter3D::from_config(config);
        let grip = GripFilter::from_config(config);
        Self {
            label,
            joints: core::array::from_fn(|_| joint.clone()),
            left_grip: grip.clone(),
            right_grip: grip,
            last_tracked: [None; JOINT_COUNT],
            last_inferred: [None; JOINT_COUNT],
        }
    }

    #[inline]
    pub fn label(&self) -> TrackLabel {
        self.label
    }

    #[inline]
    pub fn joint_filter(&self, joint: JointType) -> &JerkFilter3D {
        &self.joints[joint.index()]
    }

    #[inline]
    pub fn grip(&self, hand: Hand) -> &GripFilter {
        match hand {
            Hand::Left => &self.left_grip,
            Hand::Right => &self.right_grip,
        }
    }

    #[inline]
    pub fn last_tracked(&self, joint: JointType) -> Option<DateTime<Utc>> {
        self.last_tracked[joint.index()]
    }

    #[inline]
    pub fn last_inferred(&self, joint: JointType) -> Option<DateTime<Utc>> {
        self.last_inferred[joint.index()]
    }

    /// Most recent Tracked or Inferred integration of any joint.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_tracked
            .iter()
            .chain(self.last_inferred.iter())
            .flatten()
            .max()
            .copied()
    }

    /// Milliseconds since the most recently updated joint, or infinity if
    /// the track never received a usable joint.
    pub fn age_ms(&self, now: DateTime<Utc>) -> f64 {
        self.last_update()
            .map(|last| ms_between(last, now))
            .unwrap_or(f64::INFINITY)
    }

    /// Folds an observation into the track.
    ///
    /// With `mirrored` set, each joint takes its data from the observation's
    /// opposite-side joint, and each hand's grip from the opposite hand.
    ///
    /// # Returns
    /// Number of joints integrated
    pub fn integrate(&mut self, observation: &RawSkeletonObservation, mirrored: bool) -> usize {
        let mut integrated = 0;
        for joint in JointType::ALL {
            let source = observation.joint(joint.resolve(mirrored));
            let stamps = match source.tracking_state {
                TrackingState::Tracked => &mut self.last_tracked,
                TrackingState::Inferred => &mut self.last_inferred,
                _ => continue,
            };

            let i = joint.index();
            if self.joints[i].integrate(&source.position, source.timestamp, &source.position_error) {
                stamps[i] = stamps[i].max(Some(source.timestamp));
                integrated += 1;
            }
        }

        for hand in [Hand::Left, Hand::Right] {
            let source = if mirrored { hand.mirror() } else { hand };
            if observation.joint(source.joint()).tracking_state != TrackingState::Tracked {
                continue;
            }
            let closed = observation.hand_closed(source);
            let grip = match hand {
                Hand::Left => &mut self.left_grip,
                Hand::Right => &mut self.right_grip,
            };
            grip.integrate(closed, observation.timestamp);
        }

        integrated
    }

    /// Predicted joint positions at an absolute time.
    pub fn predict_positions_only(&self, time: DateTime<Utc>) -> [Point3<f64>; JOINT_COUNT] {
        core::array::from_fn(|i| self.joints[i].predict_at(time).position)
    }

    /// Full pose predicted `offset_ms` after `now`.
    ///
    /// Joint states are classified against `now`, not against the
    /// prediction target, so looking ahead does not age the joints.
    pub fn predict_full(
        &self,
        now: DateTime<Utc>,
        offset_ms: f64,
        config: &FusionConfig,
    ) -> FusedSkeleton {
        let target = offset_by_ms(now, offset_ms);

        let mut positions = [Point3::origin(); JOINT_COUNT];
        let mut states = [TrackingState::NotTracked; JOINT_COUNT];
        for (i, filter) in self.joints.iter().enumerate() {
            let prediction = filter.predict_at(target);
            let tracked_age = self.last_tracked[i]
                .map(|t| ms_between(t, now))
                .unwrap_or(f64::INFINITY);

            positions[i] = prediction.position;
            states[i] = classify_joint(prediction.log_norm(), tracked_age, config);
        }

        let orientations = orientation::reconstruct(&positions, &states, &config.orientation);
        let joints = core::array::from_fn(|i| FusedJoint {
            position: positions[i],
            orientation: orientations[i],
            tracking_state: states[i],
        });

        FusedSkeleton {
            label: self.label,
            position: positions[JointType::HipCenter.index()],
            joints,
            tracking_state: overall_state(states.iter()),
            left_hand_closed: self.left_grip.predict(),
            right_hand_closed: self.right_grip.predict(),
            timestamp: target,
        }
    }
}
