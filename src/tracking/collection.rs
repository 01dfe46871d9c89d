//! Shared track storage
//!
//! All tracks live behind one mutex. A [`TrackScope`] is the held lock: every
//! read or structural change of the collection goes through one, so indices
//! stay stable for as long as a scope is alive.

use parking_lot::{Mutex, MutexGuard};

use crate::config::FusionConfig;
use crate::tracking::track::Track;
use crate::types::labels::{LabelGenerator, TrackLabel};

#[derive(Debug, Default)]
struct TrackSet {
    tracks: Vec<Track>,
    labels: LabelGenerator,
}

/// Index-addressable set of tracks, safe to share between threads.
#[derive(Debug, Default)]
pub struct TrackCollection {
    inner: Mutex<TrackSet>,
}

impl TrackCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes exclusive access, blocking until other scopes are released.
    pub fn hold(&self) -> TrackScope<'_> {
        TrackScope {
            set: self.inner.lock(),
        }
    }
}

/// Exclusive access to a [`TrackCollection`], released on drop.
pub struct TrackScope<'a> {
    set: MutexGuard<'a, TrackSet>,
}

impl TrackScope<'_> {
    #[inline]
    pub fn len(&self) -> usize {
        self.set.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.set.tracks.is_empty()
    }

    #[inline]
    pub fn tracks(&self) -> &[Track] {
        &self.set.tracks
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.set.tracks.get_mut(index)
    }

    /// Appends a fresh track and returns its index and label.
    pub fn create(&mut self, config: &FusionConfig) -> (usize, TrackLabel) {
        let label = self.set.labels.next_label();
        self.set.tracks.push(Track::new(label, config));
        (self.set.tracks.len() - 1, label)
    }

    /// Keeps the tracks for which `keep` returns `true`, visiting each once
    /// in index order.
    pub fn retain_mut(&mut self, keep: impl FnMut(&mut Track) -> bool) {
        self.set.tracks.retain_mut(keep);
    }

    /// Removes every track. Labels keep counting up.
    pub fn clear(&mut self) {
        self.set.tracks.clear();
    }
}
