//! Observation-to-track correspondence
//!
//! Scores how well an observation fits a track's predicted pose, once as
//! seen and once with left and right swapped, and picks the best candidate.
//! Sensors facing each other disagree about which side is left, so the
//! mirrored reading is a first-class candidate.

use nalgebra::Point3;

use crate::types::skeleton::{JointType, RawSkeletonObservation, TrackingState, JOINT_COUNT};
use crate::utils::RunningMean;

/// Mean absolute per-axis deviation between a track and an observation.
///
/// `None` means no joint could be compared in that orientation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MatchScore {
    pub forward: Option<f64>,
    pub reverse: Option<f64>,
}

/// The chosen track and orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate {
    pub index: usize,
    pub mirrored: bool,
    pub deviation: f64,
}

/// Scores an observation against a predicted pose.
///
/// Only joints the observation reports as Tracked contribute. The forward
/// score compares each joint with the same observed joint; the reverse
/// score compares it with the observed mirror joint. Every contributing
/// joint adds its x, y and z deviations as three samples.
pub fn score(
    predicted: &[Point3<f64>; JOINT_COUNT],
    observation: &RawSkeletonObservation,
    include_hands: bool,
) -> MatchScore {
    let mut forward = RunningMean::new();
    let mut reverse = RunningMean::new();

    let accumulate = |mean: &mut RunningMean, joint: JointType, source: JointType| {
        let observed = observation.joint(source);
        if observed.tracking_state != TrackingState::Tracked {
            return;
        }
        let diff = predicted[joint.index()] - observed.position;
        for d in diff.iter() {
            mean.push(d.abs());
        }
    };

    for joint in JointType::ALL {
        if !include_hands && joint.is_hand() {
            continue;
        }
        accumulate(&mut forward, joint, joint);
        accumulate(&mut reverse, joint, joint.mirror());
    }

    MatchScore {
        forward: forward.mean(),
        reverse: reverse.mean(),
    }
}

/// Picks the lowest deviation over all tracks and both orientations.
///
/// All forward scores are scanned before any reverse score, and a later
/// candidate must be strictly better to replace an earlier one, so ties go
/// to the earliest track in the straight orientation.
pub fn select_best(scores: &[MatchScore]) -> Option<MatchCandidate> {
    let forward = scores
        .iter()
        .enumerate()
        .filter_map(|(index, s)| s.forward.map(|d| (index, false, d)));
    let reverse = scores
        .iter()
        .enumerate()
        .filter_map(|(index, s)| s.reverse.map(|d| (index, true, d)));

    let mut best: Option<MatchCandidate> = None;
    for (index, mirrored, deviation) in forward.chain(reverse) {
        if best.map_or(true, |b| deviation < b.deviation) {
            best = Some(MatchCandidate {
                index,
                mirrored,
                deviation,
            });
        }
    }
    best
}
