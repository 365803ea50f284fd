use std::collections::VecDeque;

/// Fixed-capacity FIFO sample window.
///
/// Pushing beyond capacity evicts the oldest sample first, so the buffer
/// never grows past its declared capacity.
pub struct SampleWindow<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T> SampleWindow<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: T) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Oldest-first iteration.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buf.iter()
    }

    /// The most recent `n` samples, oldest-first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> {
        let skip = self.buf.len().saturating_sub(n);
        self.buf.iter().skip(skip)
    }
}

impl SampleWindow<f32> {
    /// Mean of all stored samples. None when empty.
    pub fn mean(&self) -> Option<f32> {
        if self.buf.is_empty() {
            return None;
        }
        let sum: f32 = self.buf.iter().sum();
        Some(sum / self.buf.len() as f32)
    }
}
