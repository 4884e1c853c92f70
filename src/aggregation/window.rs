use std::collections::VecDeque;

use super::StatsSnapshot;

/// Running statistics over a fixed-capacity sliding window of observations.
///
/// Mean and variance are maintained with Welford's algorithm, using the
/// sliding replacement form once the window is full, so `snapshot` never
/// scans the buffer. All accumulation is in `f64` to bound drift over the
/// largest windows. Eviction of an extremal value triggers the one
/// non-constant path: a rescan of the remaining buffer for new extrema.
#[derive(Debug, Clone)]
pub struct WindowAggregator {
    capacity: usize,
    buffer: VecDeque<f64>,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl WindowAggregator {
    /// Create an aggregator holding the last `capacity` observations.
    ///
    /// The buffer grows with the data instead of reserving `capacity` up
    /// front; the largest windows hold 10^8 observations.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "window capacity must be positive");
        Self {
            capacity,
            buffer: VecDeque::new(),
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Window capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of observations currently held
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the window has seen no observations yet
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Append an observation, evicting the oldest when the window is full.
    pub fn add(&mut self, value: f64) {
        if self.buffer.len() == self.capacity {
            if let Some(old) = self.buffer.pop_front() {
                // Sliding replacement: the count stays at capacity, so the
                // Welford update removes `old` and inserts `value` in one step.
                let n = self.capacity as f64;
                let old_mean = self.mean;
                self.mean += (value - old) / n;
                self.m2 += (value - old_mean) * (value - self.mean)
                    - (old - old_mean) * (old - self.mean);

                if old == self.min || old == self.max {
                    self.rescan_extrema();
                }
            }
        } else {
            // Welford insertion for a growing window.
            let n = self.buffer.len() as f64;
            let delta = value - self.mean;
            self.mean += delta / (n + 1.0);
            self.m2 += delta * (value - self.mean);
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.buffer.push_back(value);
    }

    /// Current statistics, or `None` before the first observation.
    pub fn snapshot(&self) -> Option<StatsSnapshot> {
        let last = *self.buffer.back()?;
        let n = self.buffer.len() as f64;
        // Floating error can leave m2 marginally below zero.
        let var = (self.m2 / n).max(0.0);
        Some(StatsSnapshot {
            min: self.min,
            max: self.max,
            last,
            avg: self.mean,
            var,
            count: self.buffer.len(),
        })
    }

    // O(len); reached only when the evicted element was extremal.
    fn rescan_extrema(&mut self) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in &self.buffer {
            min = min.min(v);
            max = max.max(v);
        }
        self.min = min;
        self.max = max;
    }
}
