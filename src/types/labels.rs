//! Track labels
//!
//! Labels give fused skeletons a stable identity across polls. Collection
//! indices shift when stale tracks are removed; labels never do.

// ============================================================================
// Track Label
// ============================================================================

/// A unique identifier for a track, assigned once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackLabel(pub u32);

impl TrackLabel {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for TrackLabel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Label Generator
// ============================================================================

/// Hands out monotonically increasing labels.
#[derive(Debug, Clone, Default)]
pub struct LabelGenerator {
    next_id: u32,
}

impl LabelGenerator {
    /// Creates a generator whose first label is `#0`.
    #[inline]
    pub const fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Generates a new unique label.
    #[inline]
    pub fn next_label(&mut self) -> TrackLabel {
        let label = TrackLabel(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        label
    }

    /// Number of labels handed out so far.
    #[inline]
    pub fn issued(&self) -> u32 {
        self.next_id
    }
}
