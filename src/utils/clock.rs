//! Time source and millisecond helpers
//!
//! Track ages and prediction targets are measured against a [`Clock`] so
//! tests and replays can drive time by hand.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system UTC clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Jumps to an absolute time (backwards is allowed).
    pub fn set(&self, time: DateTime<Utc>) {
        *self.now.lock() = time;
    }

    /// Moves the clock by `ms` milliseconds.
    pub fn advance_ms(&self, ms: f64) {
        let mut now = self.now.lock();
        *now = offset_by_ms(*now, ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

// ============================================================================
// Millisecond Helpers
// ============================================================================

/// Signed milliseconds from `from` to `to`, with microsecond resolution.
pub fn ms_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1000.0,
        None => delta.num_milliseconds() as f64,
    }
}

/// Converts a millisecond offset to a duration, rounded to the microsecond.
/// Non-finite offsets become zero.
pub fn duration_from_ms(ms: f64) -> Duration {
    if !ms.is_finite() {
        return Duration::zero();
    }
    Duration::microseconds((ms * 1000.0).round() as i64)
}

/// `time` shifted by `ms` milliseconds, clamped to the representable range.
pub fn offset_by_ms(time: DateTime<Utc>, ms: f64) -> DateTime<Utc> {
    match time.checked_add_signed(duration_from_ms(ms)) {
        Some(shifted) => shifted,
        None if ms < 0.0 => DateTime::<Utc>::MIN_UTC,
        None => DateTime::<Utc>::MAX_UTC,
    }
}
