//! Fixed-capacity sliding window
//!
//! A pre-allocated circular buffer that keeps the most recent `capacity`
//! entries. Pushing into a full window evicts the oldest entry. Used by the
//! segment collector to hold the last padding-window's worth of
//! (frame, verdict) pairs.

/// Circular buffer holding at most `capacity` entries, oldest first
#[derive(Debug, Clone)]
pub struct SlidingWindow<T> {
    slots: Vec<Option<T>>,
    /// Index of the oldest entry
    head: usize,
    len: usize,
}

impl<T> SlidingWindow<T> {
    /// Create a new window with storage for `capacity` entries
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            head: 0,
            len: 0,
        }
    }

    /// Returns the fixed capacity of the window
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of entries currently held
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the window holds no entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true once the window holds `capacity` entries
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Append an entry as the newest element
    ///
    /// If the window is already full the oldest entry is removed first and
    /// returned.
    pub fn push(&mut self, item: T) -> Option<T> {
        let capacity = self.capacity();
        if capacity == 0 {
            return Some(item);
        }

        if self.len == capacity {
            let evicted = self.slots[self.head].replace(item);
            self.head = (self.head + 1) % capacity;
            return evicted;
        }

        let tail = (self.head + self.len) % capacity;
        self.slots[tail] = Some(item);
        self.len += 1;
        None
    }

    /// Returns the oldest entry
    pub fn oldest(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        self.slots[self.head].as_ref()
    }

    /// Iterate over entries from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let capacity = self.capacity();
        (0..self.len).filter_map(move |i| self.slots[(self.head + i) % capacity].as_ref())
    }

    /// Number of entries matching `predicate`
    pub fn count_where(&self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        self.iter().filter(|item| predicate(item)).count()
    }

    /// Remove all entries, returning them oldest first
    pub fn drain(&mut self) -> Vec<T> {
        let capacity = self.capacity();
        let mut out = Vec::with_capacity(self.len);
        for i in 0..self.len {
            if let Some(item) = self.slots[(self.head + i) % capacity].take() {
                out.push(item);
            }
        }
        self.head = 0;
        self.len = 0;
        out
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}
