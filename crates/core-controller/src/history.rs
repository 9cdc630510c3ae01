use std::collections::VecDeque;

/// A fixed-capacity history, most recent entry first.
///
/// Pushing into a full history evicts the oldest entry.
#[derive(Clone, Debug)]
pub struct History<T> {
    capacity: usize,
    entries: VecDeque<T>,
}

impl<T> History<T> {
    /// Create an empty history holding at most `capacity` entries, at least one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);

        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Add the most recent entry, returning the evicted one if the history was full.
    pub fn push(&mut self, entry: T) -> Option<T> {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_back()
        } else {
            None
        };

        self.entries.push_front(entry);
        evicted
    }

    /// Return the most recent entry.
    pub fn latest(&self) -> Option<&T> {
        self.entries.front()
    }

    /// Return the most recent entry matching the predicate.
    pub fn find(&self, f: impl Fn(&T) -> bool) -> Option<&T> {
        self.entries.iter().find(|entry| f(entry))
    }

    /// Return the most recent entry matching the predicate.
    pub fn find_mut(&mut self, f: impl Fn(&T) -> bool) -> Option<&mut T> {
        self.entries.iter_mut().find(|entry| f(entry))
    }

    /// Iterate over the entries, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history holds no entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
