//! Online incremental mean

/// Mean of a stream of samples, updated one sample at a time with
/// `mean += (x - mean) / n`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningMean {
    mean: f64,
    count: usize,
}

impl RunningMean {
    pub const fn new() -> Self {
        Self {
            mean: 0.0,
            count: 0,
        }
    }

    /// Folds one sample into the mean.
    #[inline]
    pub fn push(&mut self, sample: f64) {
        self.count += 1;
        self.mean += (sample - self.mean) / self.count as f64;
    }

    /// Number of samples seen.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// The mean, or `None` before the first sample.
    #[inline]
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }
}
