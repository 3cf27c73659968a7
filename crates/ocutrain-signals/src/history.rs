//! Bounded FIFO history
//!
//! Fixed-capacity buffer used for the deviation, blink, position and
//! gaze-sample histories. Oldest entries are evicted first.

use std::collections::VecDeque;

/// Fixed-capacity ring buffer ordered by arrival time.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create an empty buffer. A capacity of zero is bumped to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, returning the evicted oldest entry if the buffer was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        self.items.iter()
    }

    /// Iterate the newest `n` entries, oldest of those first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> + '_ {
        let skip = self.items.len().saturating_sub(n);
        self.items.iter().skip(skip)
    }

    pub fn oldest(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Remove every entry, handing them back oldest first.
    pub fn drain(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }
}

impl RingBuffer<f32> {
    /// Mean of the newest `n` entries (or fewer if not yet buffered).
    pub fn mean_recent(&self, n: usize) -> Option<f32> {
        let take = n.min(self.items.len());
        if take == 0 {
            return None;
        }
        Some(self.recent(take).sum::<f32>() / take as f32)
    }
}

impl RingBuffer<bool> {
    /// Fraction of `true` entries over the whole buffer.
    pub fn true_fraction(&self) -> f32 {
        if self.items.is_empty() {
            return 0.0;
        }
        self.items.iter().filter(|&&b| b).count() as f32 / self.items.len() as f32
    }
}
