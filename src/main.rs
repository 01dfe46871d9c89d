//! Example usage of the skelfuse library
//!
//! Two sensors watch the same person walking past, one of them from behind
//! so that its left and right are swapped. Both feed one merger from their
//! own threads; the main thread then reads the fused pose.

use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Duration, Utc};
use nalgebra::{Point3, Vector3};
use skelfuse::prelude::*;

const FRAMES: i64 = 45;
const FRAME_MS: i64 = 33;

/// Rough standing pose around `hip`, arms slightly lowered.
fn standing_pose(hip: Point3<f64>) -> [Point3<f64>; JOINT_COUNT] {
    use JointType::*;

    let mut pose = [hip; JOINT_COUNT];
    let offsets = [
        (HipCenter, [0.0, 0.0, 0.0]),
        (Spine, [0.0, 0.3, 0.0]),
        (ShoulderCenter, [0.0, 0.5, 0.0]),
        (Head, [0.0, 0.7, 0.0]),
        (Neck, [0.0, 0.55, 0.0]),
        (ShoulderLeft, [-0.2, 0.5, 0.0]),
        (ElbowLeft, [-0.35, 0.3, 0.0]),
        (WristLeft, [-0.45, 0.1, 0.05]),
        (HandLeft, [-0.5, 0.05, 0.05]),
        (HandTipLeft, [-0.55, 0.0, 0.05]),
        (ThumbLeft, [-0.5, 0.05, 0.0]),
        (ShoulderRight, [0.2, 0.5, 0.0]),
        (ElbowRight, [0.35, 0.3, 0.0]),
        (WristRight, [0.45, 0.1, 0.05]),
        (HandRight, [0.5, 0.05, 0.05]),
        (HandTipRight, [0.55, 0.0, 0.05]),
        (ThumbRight, [0.5, 0.05, 0.0]),
        (HipLeft, [-0.1, -0.1, 0.0]),
        (KneeLeft, [-0.1, -0.5, -0.02]),
        (AnkleLeft, [-0.1, -0.9, 0.0]),
        (FootLeft, [-0.1, -0.9, -0.1]),
        (HipRight, [0.1, -0.1, 0.0]),
        (KneeRight, [0.1, -0.5, -0.02]),
        (AnkleRight, [0.1, -0.9, 0.0]),
        (FootRight, [0.1, -0.9, -0.1]),
    ];
    for (joint, [x, y, z]) in offsets {
        pose[joint.index()] = hip + Vector3::new(x, y, z);
    }
    pose
}

/// What one sensor reports at frame `k`.
fn sensor_frame(sensor: &str, start: DateTime<Utc>, k: i64, from_behind: bool) -> RawSkeletonObservation {
    let timestamp = start + Duration::milliseconds(k * FRAME_MS);
    // Walking along +x at 0.8 m/s
    let hip = Point3::new(-1.0 + 0.8 * (k * FRAME_MS) as f64 / 1000.0, 1.0, 2.5);
    let pose = standing_pose(hip);

    let mut obs = RawSkeletonObservation::empty(sensor, timestamp);
    obs.tracking_state = TrackingState::Tracked;
    for joint in JointType::ALL {
        // A sensor behind the person labels its left as the person's right.
        let source = if from_behind { joint.mirror() } else { joint };
        *obs.joint_mut(joint) = RawJointObservation::new(
            pose[source.index()],
            TrackingState::Tracked,
            Vector3::repeat(0.01),
            timestamp,
        );
    }

    // The person's right hand closes halfway through.
    let right_closed = k > FRAMES / 2;
    if from_behind {
        obs.left_hand_closed = right_closed;
    } else {
        obs.right_hand_closed = right_closed;
    }
    obs
}

fn main() {
    println!("skelfuse: Multi-Sensor Skeleton Fusion");
    println!("======================================\n");

    let start = Utc::now();
    let clock = ManualClock::new(start);
    let merger = match SkeletonMerger::with_clock(FusionConfig::default(), clock) {
        Ok(merger) => Arc::new(merger),
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return;
        }
    };

    let sensors: Vec<_> = [("front", false), ("rear", true)]
        .into_iter()
        .map(|(sensor, from_behind)| {
            let merger = Arc::clone(&merger);
            thread::spawn(move || {
                let mut matched = 0;
                for k in 0..FRAMES {
                    let obs = sensor_frame(sensor, start, k, from_behind);
                    if let MergeOutcome::Matched { .. } = merger.merge(&obs) {
                        matched += 1;
                    }
                }
                (sensor, matched)
            })
        })
        .collect();

    for handle in sensors {
        match handle.join() {
            Ok((sensor, matched)) => {
                println!("Sensor {sensor}: {matched}/{FRAMES} frames joined an existing track")
            }
            Err(_) => eprintln!("sensor thread panicked"),
        }
    }

    merger
        .clock()
        .set(start + Duration::milliseconds((FRAMES - 1) * FRAME_MS));

    for offset_ms in [0.0, 100.0] {
        println!("\nPrediction {offset_ms} ms ahead:");
        for pose in merger.predict_all(offset_ms) {
            println!(
                "  Track {}: {:?} at ({:.3}, {:.3}, {:.3}), hands L={} R={}",
                pose.label,
                pose.tracking_state,
                pose.position.x,
                pose.position.y,
                pose.position.z,
                if pose.hand_closed(Hand::Left) { "closed" } else { "open" },
                if pose.hand_closed(Hand::Right) { "closed" } else { "open" },
            );
            let head = pose.joint(JointType::Head);
            println!(
                "    Head {:?} at ({:.3}, {:.3}, {:.3})",
                head.tracking_state, head.position.x, head.position.y, head.position.z
            );
        }
    }

    println!("\nDone!");
}
