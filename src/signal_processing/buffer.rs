use std::collections::VecDeque;

/// Fixed-capacity FIFO of the most recent values
///
/// Storage is allocated once at construction. Pushing into a full buffer
/// evicts the oldest value, so the length never exceeds the capacity and
/// iteration order is always arrival order (oldest to newest).
#[derive(Debug, Clone)]
pub struct TrailingBuffer<T> {
    values: VecDeque<T>,
    capacity: usize,
}

impl<T: Copy> TrailingBuffer<T> {
    /// Create an empty buffer holding at most `capacity` values (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a value, returning the evicted oldest value when full
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.values.len() == self.capacity {
            self.values.pop_front()
        } else {
            None
        };
        self.values.push_back(value);
        evicted
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently pushed value
    pub fn newest(&self) -> Option<T> {
        self.values.back().copied()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl ExactSizeIterator<Item = T> + '_ {
        self.values.iter().copied()
    }

    /// Iterate over the newest `count` values, oldest first
    ///
    /// Yields fewer values if the buffer holds less than `count`.
    pub fn latest(&self, count: usize) -> impl ExactSizeIterator<Item = T> + '_ {
        let skip = self.values.len().saturating_sub(count);
        self.values.range(skip..).copied()
    }

    /// Copy the contents out in chronological order
    pub fn to_vec(&self) -> Vec<T> {
        self.values.iter().copied().collect()
    }
}
