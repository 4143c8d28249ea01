//! Bounded sample ring.
//!
//! Keeps the most recent samples in insertion order. When full, pushing a new
//! sample evicts the oldest one, so memory stays flat for long simulations.

use std::collections::VecDeque;

/// Default number of retained samples (five minutes at one sample per second).
pub const DEFAULT_RING_CAPACITY: usize = 300;

/// Fixed-capacity FIFO that drops its oldest entry when full.
#[derive(Debug, Clone)]
pub struct MetricsRing<T> {
    capacity: usize,
    samples: VecDeque<T>,
}

impl<T> MetricsRing<T> {
    /// Create a ring holding at most `capacity` samples (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a sample, returning the evicted one if the ring was full.
    pub fn push(&mut self, sample: T) -> Option<T> {
        let evicted = if self.samples.len() >= self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<&T> {
        self.samples.back()
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.samples.iter()
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of retained samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl<T> Default for MetricsRing<T> {
    fn default() -> Self {
        Self::new(DEFAULT_RING_CAPACITY)
    }
}
