//! Fixed-capacity FIFO of integer samples.

use std::collections::VecDeque;

/// Default number of samples kept per channel.
pub const DEFAULT_WINDOW: usize = 10;

/// Rolling window of the most recent `capacity` samples, oldest first.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<i32>,
    capacity: usize,
}

impl SampleWindow {
    /// Create an empty window. A capacity of 0 is bumped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a sample, evicting exactly one sample from the front when the
    /// window overflows.
    pub fn push(&mut self, value: i32) {
        self.samples.push_back(value);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Arithmetic mean of the current samples; `None` when empty.
    ///
    /// Summed in i64 so a full window of extreme values cannot overflow.
    pub fn mean(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: i64 = self.samples.iter().map(|&v| i64::from(v)).sum();
        Some((sum as f64 / self.samples.len() as f64) as f32)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples in push order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.samples.iter().copied()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
