//! Joint orientation reconstruction
//!
//! Derives a rotation frame for every joint from a full set of joint
//! positions. Each frame's y axis runs along the bone into the joint; the
//! other two axes come from the bend plane of the limb where it is well
//! defined and from a parent frame where it is not. Frames are built in
//! anatomical order because children borrow axes from their parents.
//!
//! Every cross product is re-normalized. Normalizing a zero vector yields
//! the zero vector, so degenerate input (coincident joints) produces zero
//! axes rather than NaN.

use nalgebra::{Point3, Vector3};

use crate::config::OrientationThresholds;
use crate::tracking::estimate::JointOrientation;
use crate::types::skeleton::{JointType, TrackingState, JOINT_COUNT};

/// Cross products shorter than this are treated as degenerate.
const DEGENERATE_NORM: f64 = 1e-9;

#[inline]
fn unit(v: Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(DEGENERATE_NORM).unwrap_or_else(Vector3::zeros)
}

/// Unit vector from `from` to `to`.
#[inline]
fn bone(from: &Point3<f64>, to: &Point3<f64>) -> Vector3<f64> {
    unit(to - from)
}

#[inline]
fn is_degenerate(v: &Vector3<f64>) -> bool {
    v.norm() < DEGENERATE_NORM
}

/// Frame with y along `y` and z perpendicular to both `y` and `reference`
/// (z = y × reference, x = y × z).
fn frame_from_reference(y: Vector3<f64>, reference: &Vector3<f64>) -> JointOrientation {
    let z = unit(y.cross(reference));
    let x = unit(y.cross(&z));
    JointOrientation::from_axes(x, y, z)
}

/// Frame with y along `y` whose z axis is pulled towards the parent's x axis
/// (z = parent_x × y, x = y × z).
fn frame_following_x(y: Vector3<f64>, parent_x: &Vector3<f64>) -> JointOrientation {
    let z = unit(parent_x.cross(&y));
    let x = unit(y.cross(&z));
    JointOrientation::from_axes(x, y, z)
}

/// Frame with y along `y` and x perpendicular to the parent's z axis
/// (x = y × parent_z, z = x × y).
fn frame_following_z(y: Vector3<f64>, parent_z: &Vector3<f64>) -> JointOrientation {
    let x = unit(y.cross(parent_z));
    let z = unit(x.cross(&y));
    JointOrientation::from_axes(x, y, z)
}

/// Which side of the body a limb is on. The straight-arm fallback uses
/// opposite cross product orders on the two sides.
#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// Elbow frame. `upper` runs shoulder to elbow, `fore` elbow to wrist.
fn elbow_frame(
    upper: Vector3<f64>,
    fore: &Vector3<f64>,
    side: Side,
    torso_up: &Vector3<f64>,
    torso_lateral: &Vector3<f64>,
    straight_cos: f64,
) -> JointOrientation {
    let cos = upper.dot(fore);
    let z = if cos.abs() < straight_cos {
        // Bent: the bend plane normal fixes the frame.
        let pre_x = unit(upper.cross(fore));
        unit(pre_x.cross(&upper))
    } else {
        let from_lateral = unit(upper.cross(torso_lateral));
        let from_up = unit(match side {
            Side::Left => upper.cross(torso_up),
            Side::Right => torso_up.cross(&upper),
        });
        let (first, second) = if torso_up.dot(&upper) <= 0.0 {
            (from_lateral, from_up)
        } else {
            (from_up, from_lateral)
        };
        if is_degenerate(&first) {
            second
        } else {
            first
        }
    };
    let x = unit(upper.cross(&z));
    JointOrientation::from_axes(x, upper, z)
}

/// Knee and ankle frames, which are computed together because a bent knee
/// borrows its reference from the ankle.
fn leg_frames(
    thigh: Vector3<f64>,
    shin: Vector3<f64>,
    knee_state: TrackingState,
    pelvis_x: &Vector3<f64>,
    straight_cos: f64,
) -> (JointOrientation, JointOrientation) {
    let bent = knee_state == TrackingState::Tracked && thigh.dot(&shin) < straight_cos;
    if bent {
        let ankle = frame_from_reference(shin, pelvis_x);
        let knee = frame_following_x(thigh, &ankle.x_axis());
        (knee, ankle)
    } else {
        let knee = frame_from_reference(thigh, pelvis_x);
        let ankle = frame_following_x(shin, &knee.x_axis());
        (knee, ankle)
    }
}

/// Computes a frame for every joint.
///
/// # Arguments
/// - `positions`: joint positions indexed by [`JointType::index`]
/// - `states`: per-joint tracking states; only the knees are consulted
/// - `thresholds`: straight-limb cosine limits
///
/// # Returns
/// One frame per joint. Neck, hand tips and thumbs have no child bone to
/// orient by and get the identity.
pub fn reconstruct(
    positions: &[Point3<f64>; JOINT_COUNT],
    states: &[TrackingState; JOINT_COUNT],
    thresholds: &OrientationThresholds,
) -> [JointOrientation; JOINT_COUNT] {
    use JointType::*;

    let p = |joint: JointType| positions[joint.index()];
    let mut frames = [JointOrientation::identity(); JOINT_COUNT];
    let mut set = |joint: JointType, frame: JointOrientation| frames[joint.index()] = frame;

    // Pelvis
    let hc = p(HipCenter);
    let z_hc = unit(bone(&p(HipRight), &hc).cross(&bone(&p(HipLeft), &hc)));
    let y_hc = unit((p(HipRight) - p(HipLeft)).cross(&z_hc));
    let x_hc = unit(y_hc.cross(&z_hc));
    set(HipCenter, JointOrientation::from_axes(x_hc, y_hc, z_hc));

    // Torso
    let lateral = bone(&p(ShoulderRight), &p(ShoulderLeft));

    let y_sp = bone(&hc, &p(Spine));
    let z_sp = unit(lateral.cross(&y_sp));
    set(Spine, JointOrientation::from_axes(unit(y_sp.cross(&z_sp)), y_sp, z_sp));

    let y_sc = bone(&p(Spine), &p(ShoulderCenter));
    let z_sc = unit(lateral.cross(&y_sc));
    let x_sc = unit(y_sc.cross(&z_sc));
    set(ShoulderCenter, JointOrientation::from_axes(x_sc, y_sc, z_sc));

    set(Head, frame_following_x(bone(&p(ShoulderCenter), &p(Head)), &x_sc));

    // Arms
    let arms = [
        (Side::Left, ShoulderLeft, ElbowLeft, WristLeft, HandLeft),
        (Side::Right, ShoulderRight, ElbowRight, WristRight, HandRight),
    ];
    for (side, shoulder, elbow, wrist, hand) in arms {
        set(
            shoulder,
            frame_following_z(bone(&p(ShoulderCenter), &p(shoulder)), &z_sc),
        );

        let upper = bone(&p(shoulder), &p(elbow));
        let fore = bone(&p(elbow), &p(wrist));
        let elbow_orientation = elbow_frame(
            upper,
            &fore,
            side,
            &y_sc,
            &x_sc,
            thresholds.upper_limb_straight_cos,
        );
        set(elbow, elbow_orientation);

        let wrist_orientation = frame_following_x(fore, &elbow_orientation.x_axis());
        set(wrist, wrist_orientation);

        set(
            hand,
            frame_following_z(bone(&p(wrist), &p(hand)), &wrist_orientation.z_axis()),
        );
    }

    // Legs
    let legs = [
        (HipLeft, KneeLeft, AnkleLeft, FootLeft),
        (HipRight, KneeRight, AnkleRight, FootRight),
    ];
    for (hip, knee, ankle, foot) in legs {
        set(hip, frame_from_reference(bone(&hc, &p(hip)), &x_hc));

        let (knee_orientation, ankle_orientation) = leg_frames(
            bone(&p(hip), &p(knee)),
            bone(&p(knee), &p(ankle)),
            states[knee.index()],
            &x_hc,
            thresholds.leg_straight_cos,
        );
        set(knee, knee_orientation);
        set(ankle, ankle_orientation);

        set(
            foot,
            frame_following_x(bone(&p(ankle), &p(foot)), &ankle_orientation.x_axis()),
        );
    }

    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    const S: f64 = core::f64::consts::FRAC_1_SQRT_2;

    fn t_pose() -> [Point3<f64>; JOINT_COUNT] {
        use JointType::*;
        let mut p = [Point3::origin(); JOINT_COUNT];
        let mut put = |j: JointType, x: f64, y: f64, z: f64| p[j.index()] = Point3::new(x, y, z);

        put(HipCenter, 0.0, 0.0, 0.0);
        put(Spine, 0.0, 0.3, 0.0);
        put(ShoulderCenter, 0.0, 0.5, 0.0);
        put(Neck, 0.0, 0.55, 0.0);
        put(Head, 0.0, 0.7, 0.0);
        for (sign, sh, el, wr, ha, tip, th) in [
            (-1.0, ShoulderLeft, ElbowLeft, WristLeft, HandLeft, HandTipLeft, ThumbLeft),
            (1.0, ShoulderRight, ElbowRight, WristRight, HandRight, HandTipRight, ThumbRight),
        ] {
            put(sh, sign * 0.2, 0.5, 0.0);
            put(el, sign * 0.45, 0.5, 0.0);
            put(wr, sign * 0.7, 0.5, 0.0);
            put(ha, sign * 0.8, 0.5, 0.0);
            put(tip, sign * 0.9, 0.5, 0.0);
            put(th, sign * 0.8, 0.55, 0.0);
        }
        for (sign, hip, knee, ankle, foot) in [
            (-1.0, HipLeft, KneeLeft, AnkleLeft, FootLeft),
            (1.0, HipRight, KneeRight, AnkleRight, FootRight),
        ] {
            put(hip, sign * 0.1, -0.1, 0.0);
            put(knee, sign * 0.1, -0.5, 0.0);
            put(ankle, sign * 0.1, -0.9, 0.0);
            put(foot, sign * 0.1, -0.9, -0.1);
        }
        p
    }

    fn all_tracked() -> [TrackingState; JOINT_COUNT] {
        [TrackingState::Tracked; JOINT_COUNT]
    }

    fn assert_frame(frame: &JointOrientation, x: [f64; 3], y: [f64; 3], z: [f64; 3]) {
        let expected = JointOrientation::from_axes(x.into(), y.into(), z.into());
        assert!(
            (frame.matrix() - expected.matrix()).norm() < 1e-9,
            "got {:?}, expected {:?}",
            frame.matrix(),
            expected.matrix()
        );
    }

    #[test]
    fn test_t_pose_torso() {
        let frames = reconstruct(&t_pose(), &all_tracked(), &OrientationThresholds::default());
        for joint in [
            JointType::HipCenter,
            JointType::Spine,
            JointType::ShoulderCenter,
            JointType::Head,
        ] {
            assert_frame(
                &frames[joint.index()],
                [-1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, -1.0],
            );
        }
    }

    #[test]
    fn test_t_pose_left_arm() {
        let frames = reconstruct(&t_pose(), &all_tracked(), &OrientationThresholds::default());
        for joint in [
            JointType::ShoulderLeft,
            JointType::ElbowLeft,
            JointType::WristLeft,
            JointType::HandLeft,
        ] {
            assert_frame(
                &frames[joint.index()],
                [0.0, -1.0, 0.0],
                [-1.0, 0.0, 0.0],
                [0.0, 0.0, -1.0],
            );
        }
    }

    #[test]
    fn test_t_pose_right_arm() {
        let frames = reconstruct(&t_pose(), &all_tracked(), &OrientationThresholds::default());
        for joint in [
            JointType::ShoulderRight,
            JointType::ElbowRight,
            JointType::WristRight,
            JointType::HandRight,
        ] {
            assert_frame(
                &frames[joint.index()],
                [0.0, 1.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 0.0, -1.0],
            );
        }
    }

    #[test]
    fn test_t_pose_hips() {
        let frames = reconstruct(&t_pose(), &all_tracked(), &OrientationThresholds::default());
        assert_frame(
            &frames[JointType::HipLeft.index()],
            [S, -S, 0.0],
            [-S, -S, 0.0],
            [0.0, 0.0, -1.0],
        );
        assert_frame(
            &frames[JointType::HipRight.index()],
            [S, S, 0.0],
            [S, -S, 0.0],
            [0.0, 0.0, -1.0],
        );
    }

    #[test]
    fn test_t_pose_straight_legs() {
        let frames = reconstruct(&t_pose(), &all_tracked(), &OrientationThresholds::default());
        for joint in [
            JointType::KneeLeft,
            JointType::AnkleLeft,
            JointType::KneeRight,
            JointType::AnkleRight,
        ] {
            assert_frame(
                &frames[joint.index()],
                [1.0, 0.0, 0.0],
                [0.0, -1.0, 0.0],
                [0.0, 0.0, -1.0],
            );
        }
        for joint in [JointType::FootLeft, JointType::FootRight] {
            assert_frame(
                &frames[joint.index()],
                [1.0, 0.0, 0.0],
                [0.0, 0.0, -1.0],
                [0.0, 1.0, 0.0],
            );
        }
    }

    #[test]
    fn test_leaf_joints_are_identity() {
        let frames = reconstruct(&t_pose(), &all_tracked(), &OrientationThresholds::default());
        for joint in [
            JointType::Neck,
            JointType::HandTipLeft,
            JointType::ThumbLeft,
            JointType::HandTipRight,
            JointType::ThumbRight,
        ] {
            assert_eq!(frames[joint.index()], JointOrientation::identity());
        }
    }

    #[test]
    fn test_frames_are_proper_rotations() {
        let frames = reconstruct(&t_pose(), &all_tracked(), &OrientationThresholds::default());
        for frame in frames.iter() {
            let m = frame.matrix();
            assert!((m.determinant() - 1.0).abs() < 1e-9);
            assert!((m * m.transpose() - nalgebra::Matrix3::identity()).norm() < 1e-9);
        }
    }

    #[test]
    fn test_bent_elbow_uses_bend_plane() {
        let mut pose = t_pose();
        // Forearm raised straight up from the left elbow.
        pose[JointType::WristLeft.index()] = Point3::new(-0.45, 0.75, 0.0);
        pose[JointType::HandLeft.index()] = Point3::new(-0.45, 0.85, 0.0);

        let frames = reconstruct(&pose, &all_tracked(), &OrientationThresholds::default());
        let elbow = &frames[JointType::ElbowLeft.index()];

        // y along the upper arm, z in the bend plane towards the forearm.
        assert!((elbow.y_axis() - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-9);
        assert!((elbow.z_axis() - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-9);
        assert!((elbow.matrix().determinant() - 1.0).abs() < 1e-9);

        let wrist = &frames[JointType::WristLeft.index()];
        assert!((wrist.y_axis() - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-9);
    }

    /// Lays the arm from `shoulder` out along `upper`, then `fore`.
    fn pose_arm(
        pose: &mut [Point3<f64>; JOINT_COUNT],
        (shoulder, elbow, wrist, hand): (JointType, JointType, JointType, JointType),
        upper: Vector3<f64>,
        fore: Vector3<f64>,
    ) {
        let e = pose[shoulder.index()] + upper * 0.25;
        let w = e + fore * 0.25;
        pose[elbow.index()] = e;
        pose[wrist.index()] = w;
        pose[hand.index()] = w + fore * 0.1;
    }

    const LEFT_ARM: (JointType, JointType, JointType, JointType) = (
        JointType::ShoulderLeft,
        JointType::ElbowLeft,
        JointType::WristLeft,
        JointType::HandLeft,
    );
    const RIGHT_ARM: (JointType, JointType, JointType, JointType) = (
        JointType::ShoulderRight,
        JointType::ElbowRight,
        JointType::WristRight,
        JointType::HandRight,
    );

    #[test]
    fn test_hanging_arms_use_shoulder_line() {
        let mut pose = t_pose();
        let down = Vector3::new(0.0, -1.0, 0.0);
        pose_arm(&mut pose, LEFT_ARM, down, down);
        pose_arm(&mut pose, RIGHT_ARM, down, down);

        let frames = reconstruct(&pose, &all_tracked(), &OrientationThresholds::default());
        for elbow in [JointType::ElbowLeft, JointType::ElbowRight] {
            assert_frame(
                &frames[elbow.index()],
                [1.0, 0.0, 0.0],
                [0.0, -1.0, 0.0],
                [0.0, 0.0, -1.0],
            );
        }
    }

    #[test]
    fn test_lowered_forward_arms_use_shoulder_line() {
        // Down and forward: torso-up would give z = ±x instead.
        let mut pose = t_pose();
        let lowered = Vector3::new(0.0, -S, -S);
        pose_arm(&mut pose, LEFT_ARM, lowered, lowered);
        pose_arm(&mut pose, RIGHT_ARM, lowered, lowered);

        let frames = reconstruct(&pose, &all_tracked(), &OrientationThresholds::default());
        for elbow in [JointType::ElbowLeft, JointType::ElbowRight] {
            assert_frame(&frames[elbow.index()], [1.0, 0.0, 0.0], [0.0, -S, -S], [0.0, S, -S]);
        }
    }

    #[test]
    fn test_raised_forward_arms_use_torso_up() {
        let mut pose = t_pose();
        let raised = Vector3::new(0.0, S, -S);
        pose_arm(&mut pose, LEFT_ARM, raised, raised);
        pose_arm(&mut pose, RIGHT_ARM, raised, raised);

        let frames = reconstruct(&pose, &all_tracked(), &OrientationThresholds::default());
        assert_frame(
            &frames[JointType::ElbowLeft.index()],
            [0.0, -S, -S],
            [0.0, S, -S],
            [1.0, 0.0, 0.0],
        );
        assert_frame(
            &frames[JointType::ElbowRight.index()],
            [0.0, S, S],
            [0.0, S, -S],
            [-1.0, 0.0, 0.0],
        );
    }

    /// Left elbow z axis with the forearm lifted so that
    /// upper · fore = `cos`.
    fn left_elbow_z_at(cos: f64) -> Vector3<f64> {
        let mut pose = t_pose();
        let sin = (1.0 - cos * cos).sqrt();
        pose_arm(
            &mut pose,
            LEFT_ARM,
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(-cos, sin, 0.0),
        );
        let frames = reconstruct(&pose, &all_tracked(), &OrientationThresholds::default());
        frames[JointType::ElbowLeft.index()].z_axis()
    }

    #[test]
    fn test_elbow_just_below_straight_cutoff_is_bent() {
        let z = left_elbow_z_at(0.93);
        assert!((z - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_elbow_just_above_straight_cutoff_is_straight() {
        let z = left_elbow_z_at(0.95);
        assert!((z - Vector3::new(0.0, 0.0, -1.0)).norm() < 1e-9);
    }

    #[test]
    fn test_bent_knee_takes_reference_from_ankle() {
        let mut pose = t_pose();
        // Shin swept backwards by 45 degrees.
        pose[JointType::AnkleLeft.index()] = Point3::new(-0.1, -0.5 - 0.4 * S, 0.4 * S);
        pose[JointType::FootLeft.index()] = Point3::new(-0.1, -0.5 - 0.4 * S, 0.4 * S - 0.1);

        let frames = reconstruct(&pose, &all_tracked(), &OrientationThresholds::default());
        let knee = &frames[JointType::KneeLeft.index()];
        let ankle = &frames[JointType::AnkleLeft.index()];

        assert!((ankle.y_axis() - Vector3::new(0.0, -S, S)).norm() < 1e-9);
        // Both frames share the pelvis lateral axis as x when the leg bends
        // in the sagittal plane.
        assert!((ankle.x_axis() - Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-9);
        assert!((knee.x_axis() - Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-9);
        assert!((knee.y_axis() - Vector3::new(0.0, -1.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_untracked_knee_uses_straight_branch() {
        let mut pose = t_pose();
        pose[JointType::AnkleLeft.index()] = Point3::new(-0.1, -0.5 - 0.4 * S, 0.4 * S);
        let mut states = all_tracked();
        states[JointType::KneeLeft.index()] = TrackingState::Inferred;

        let frames = reconstruct(&pose, &states, &OrientationThresholds::default());
        let knee = &frames[JointType::KneeLeft.index()];
        assert_frame(knee, [1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_collapsed_skeleton_is_finite() {
        let pose = [Point3::origin(); JOINT_COUNT];
        let frames = reconstruct(&pose, &all_tracked(), &OrientationThresholds::default());
        for frame in frames.iter() {
            assert!(frame.matrix().iter().all(|v| v.is_finite()));
        }
    }
}
