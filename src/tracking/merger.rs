//! Skeleton merger
//!
//! The public face of the engine. Producer threads push raw observations
//! through [`SkeletonMerger::merge`]; a consumer polls fused poses with
//! [`SkeletonMerger::predict_all`]. Each call runs inside one exclusive
//! [`TrackScope`](super::collection::TrackScope), so observations are
//! integrated in the order their `merge` calls acquire it.

use std::time::Instant;

use crate::config::FusionConfig;
use crate::tracking::collection::TrackCollection;
use crate::tracking::estimate::FusedSkeleton;
use crate::tracking::matcher::{score, select_best, MatchScore};
use crate::types::labels::TrackLabel;
use crate::types::skeleton::RawSkeletonObservation;
use crate::utils::{Clock, SystemClock};
use crate::Result;

/// What `merge` did with an observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MergeOutcome {
    /// The observation's overall state was neither Tracked nor Inferred.
    Discarded,
    /// Integrated into an existing track.
    Matched {
        index: usize,
        label: TrackLabel,
        mirrored: bool,
        deviation: f64,
    },
    /// No track was close enough; a new one was started.
    Created { index: usize, label: TrackLabel },
}

/// Multi-sensor skeleton fusion engine.
///
/// `SkeletonMerger` is `Send + Sync`; share it between sensor threads and
/// the consumer with an `Arc`.
#[derive(Debug)]
pub struct SkeletonMerger<C: Clock = SystemClock> {
    config: FusionConfig,
    clock: C,
    tracks: TrackCollection,
}

impl SkeletonMerger<SystemClock> {
    /// Creates a merger with the default configuration and the system clock.
    pub fn new() -> Self {
        Self {
            config: FusionConfig::default(),
            clock: SystemClock,
            tracks: TrackCollection::new(),
        }
    }

    /// Creates a merger with a custom configuration and the system clock.
    ///
    /// # Errors
    /// Returns [`FusionError::InvalidConfig`](crate::FusionError::InvalidConfig)
    /// if the configuration fails validation.
    pub fn with_config(config: FusionConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for SkeletonMerger<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> SkeletonMerger<C> {
    /// Creates a merger reading time from `clock`.
    ///
    /// # Errors
    /// Returns [`FusionError::InvalidConfig`](crate::FusionError::InvalidConfig)
    /// if the configuration fails validation.
    pub fn with_clock(config: FusionConfig, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            tracks: TrackCollection::new(),
        })
    }

    #[inline]
    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Folds one sensor observation into the best matching track, or into
    /// a new track if none is within the match threshold.
    pub fn merge(&self, observation: &RawSkeletonObservation) -> MergeOutcome {
        if !observation.tracking_state.is_usable() {
            log::debug!(
                "discarding {:?} observation from sensor {}",
                observation.tracking_state,
                observation.sensor_id
            );
            return MergeOutcome::Discarded;
        }

        let mut scope = self.tracks.hold();

        let scores: Vec<MatchScore> = scope
            .tracks()
            .iter()
            .map(|track| {
                let predicted = track.predict_positions_only(observation.timestamp);
                let s = score(&predicted, observation, self.config.include_hands_in_matching);
                log::trace!(
                    "track {} vs sensor {}: forward {:?}, reverse {:?}",
                    track.label(),
                    observation.sensor_id,
                    s.forward,
                    s.reverse
                );
                s
            })
            .collect();

        let best = select_best(&scores).filter(|c| c.deviation < self.config.match_threshold);
        if let Some(candidate) = best {
            if let Some(track) = scope.get_mut(candidate.index) {
                track.integrate(observation, candidate.mirrored);
                return MergeOutcome::Matched {
                    index: candidate.index,
                    label: track.label(),
                    mirrored: candidate.mirrored,
                    deviation: candidate.deviation,
                };
            }
        }

        let (index, label) = scope.create(&self.config);
        if let Some(track) = scope.get_mut(index) {
            track.integrate(observation, false);
        }
        log::debug!(
            "created track {label} at index {index} from sensor {}",
            observation.sensor_id
        );
        MergeOutcome::Created { index, label }
    }

    /// Drops stale tracks and predicts every remaining one `offset_ms`
    /// milliseconds past the current clock time.
    pub fn predict_all(&self, offset_ms: f64) -> Vec<FusedSkeleton> {
        let started = Instant::now();
        let now = self.clock.now();
        let config = &self.config;

        let mut scope = self.tracks.hold();
        let mut poses = Vec::with_capacity(scope.len());
        scope.retain_mut(|track| {
            let age = track.age_ms(now);
            if age > config.stale_track_ms {
                log::debug!("removing track {} idle for {age:.0} ms", track.label());
                return false;
            }
            poses.push(track.predict_full(now, offset_ms, config));
            true
        });
        drop(scope);

        log::trace!(
            "predicted {} skeletons in {:?}",
            poses.len(),
            started.elapsed()
        );
        poses
    }

    /// Number of live tracks, including stale ones not yet swept.
    pub fn track_count(&self) -> usize {
        self.tracks.hold().len()
    }

    /// Forgets every track.
    pub fn clear(&self) {
        self.tracks.hold().clear();
        log::debug!("cleared all tracks");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::skeleton::{JointType, RawJointObservation, TrackingState};
    use crate::utils::ManualClock;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use nalgebra::{Point3, Vector3};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    fn merger() -> SkeletonMerger<ManualClock> {
        SkeletonMerger::with_clock(FusionConfig::default(), ManualClock::new(t0())).unwrap()
    }

    fn body_at(offset_x: f64, t: DateTime<Utc>) -> RawSkeletonObservation {
        let mut obs = RawSkeletonObservation::empty("unit", t);
        obs.tracking_state = TrackingState::Tracked;
        for joint in JointType::ALL {
            let y = joint.index() as f64 * 0.04;
            *obs.joint_mut(joint) = RawJointObservation::new(
                Point3::new(offset_x, y, 2.0),
                TrackingState::Tracked,
                Vector3::repeat(0.01),
                t,
            );
        }
        obs
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_merger_is_send_sync() {
        assert_send_sync::<SkeletonMerger>();
        assert_send_sync::<SkeletonMerger<ManualClock>>();
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = FusionConfig {
            match_threshold: -1.0,
            ..FusionConfig::default()
        };
        assert!(SkeletonMerger::with_config(config).is_err());
    }

    #[test]
    fn test_untracked_observation_is_discarded() {
        let merger = merger();
        let mut obs = body_at(0.0, t0());
        obs.tracking_state = TrackingState::NotTracked;

        assert_eq!(merger.merge(&obs), MergeOutcome::Discarded);
        assert_eq!(merger.track_count(), 0);
    }

    #[test]
    fn test_first_observation_creates_track() {
        let merger = merger();
        match merger.merge(&body_at(0.0, t0())) {
            MergeOutcome::Created { index, label } => {
                assert_eq!(index, 0);
                assert_eq!(label, TrackLabel::new(0));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(merger.track_count(), 1);
    }

    #[test]
    fn test_nearby_observation_matches() {
        let merger = merger();
        merger.merge(&body_at(0.0, t0()));

        let next = t0() + Duration::milliseconds(33);
        match merger.merge(&body_at(0.02, next)) {
            MergeOutcome::Matched {
                index, mirrored, ..
            } => {
                assert_eq!(index, 0);
                assert!(!mirrored);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(merger.track_count(), 1);
    }

    #[test]
    fn test_distant_observation_creates_second_track() {
        let merger = merger();
        merger.merge(&body_at(0.0, t0()));

        let outcome = merger.merge(&body_at(1.5, t0() + Duration::milliseconds(10)));
        assert!(matches!(outcome, MergeOutcome::Created { index: 1, .. }));
        assert_eq!(merger.predict_all(0.0).len(), 2);
    }

    #[test]
    fn test_stale_tracks_are_swept() {
        let merger = merger();
        merger.merge(&body_at(0.0, t0()));

        merger.clock().advance_ms(4000.0);
        assert_eq!(merger.predict_all(0.0).len(), 1);

        merger.clock().advance_ms(1500.0);
        assert!(merger.predict_all(0.0).is_empty());
        assert_eq!(merger.track_count(), 0);
    }

    #[test]
    fn test_huge_offset_saturates_target_time() {
        let merger = merger();
        merger.merge(&body_at(0.0, t0()));

        let poses = merger.predict_all(1e16);
        assert_eq!(poses.len(), 1);
        assert_eq!(poses[0].timestamp, DateTime::<Utc>::MAX_UTC);
        assert_eq!(poses[0].tracking_state, TrackingState::NotTracked);

        let behind = merger.predict_all(-1e16);
        assert_eq!(behind[0].timestamp, DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_clear() {
        let merger = merger();
        merger.merge(&body_at(0.0, t0()));
        merger.clear();
        assert_eq!(merger.track_count(), 0);
    }
}
