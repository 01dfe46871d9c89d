//! Common test helpers for fusion integration tests

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use nalgebra::{Point3, Vector3};
use skelfuse::prelude::*;

/// Fixed start time for deterministic tests
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 17, 14, 0, 0).unwrap()
}

/// Time of the k-th frame of a 30 Hz sensor
pub fn frame_time(k: i64) -> DateTime<Utc> {
    epoch() + Duration::microseconds(k * 33_333)
}

/// Creates a merger driven by a manual clock at the epoch
pub fn make_merger() -> SkeletonMerger<ManualClock> {
    SkeletonMerger::with_clock(FusionConfig::default(), ManualClock::new(epoch())).unwrap()
}

/// T-pose joint positions with the hip centre at `origin`.
///
/// Left is towards -x, up is +y, the feet point towards -z.
pub fn t_pose(origin: Point3<f64>) -> [Point3<f64>; JOINT_COUNT] {
    use JointType::*;

    let mut p = [origin; JOINT_COUNT];
    let mut put = |j: JointType, x: f64, y: f64, z: f64| {
        p[j.index()] = origin + Vector3::new(x, y, z);
    };

    put(HipCenter, 0.0, 0.0, 0.0);
    put(Spine, 0.0, 0.3, 0.0);
    put(ShoulderCenter, 0.0, 0.5, 0.0);
    put(Neck, 0.0, 0.55, 0.0);
    put(Head, 0.0, 0.7, 0.0);
    for (s, sh, el, wr, ha, tip, th) in [
        (-1.0, ShoulderLeft, ElbowLeft, WristLeft, HandLeft, HandTipLeft, ThumbLeft),
        (1.0, ShoulderRight, ElbowRight, WristRight, HandRight, HandTipRight, ThumbRight),
    ] {
        put(sh, s * 0.2, 0.5, 0.0);
        put(el, s * 0.45, 0.5, 0.0);
        put(wr, s * 0.7, 0.5, 0.0);
        put(ha, s * 0.8, 0.5, 0.0);
        put(tip, s * 0.9, 0.5, 0.0);
        put(th, s * 0.8, 0.55, 0.0);
    }
    for (s, hip, knee, ankle, foot) in [
        (-1.0, HipLeft, KneeLeft, AnkleLeft, FootLeft),
        (1.0, HipRight, KneeRight, AnkleRight, FootRight),
    ] {
        put(hip, s * 0.1, -0.1, 0.0);
        put(knee, s * 0.1, -0.5, 0.0);
        put(ankle, s * 0.1, -0.9, 0.0);
        put(foot, s * 0.1, -0.9, -0.1);
    }
    p
}

/// Wraps positions into a fully Tracked observation
pub fn make_observation(
    positions: &[Point3<f64>; JOINT_COUNT],
    timestamp: DateTime<Utc>,
    sensor: &str,
) -> RawSkeletonObservation {
    let mut obs = RawSkeletonObservation::empty(sensor, timestamp);
    obs.tracking_state = TrackingState::Tracked;
    for (joint, position) in obs.joints.iter_mut().zip(positions.iter()) {
        *joint = RawJointObservation::new(
            *position,
            TrackingState::Tracked,
            Vector3::repeat(0.01),
            timestamp,
        );
    }
    obs
}

/// The same body as reported by a sensor that has left and right swapped
pub fn mirror_labels(obs: &RawSkeletonObservation) -> RawSkeletonObservation {
    let mut mirrored = obs.clone();
    for joint in JointType::ALL {
        mirrored.joints[joint.index()] = *obs.joint(joint.mirror());
    }
    mirrored.left_hand_closed = obs.right_hand_closed;
    mirrored.right_hand_closed = obs.left_hand_closed;
    mirrored
}
