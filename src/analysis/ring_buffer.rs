// src/analysis/ring_buffer.rs
//
// Fixed-capacity history buffer. Storage is allocated once; once full,
// each push overwrites the oldest slot. Logical index 0 is the oldest entry.

#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    capacity: usize,
    /// Slot holding the oldest entry once the buffer has wrapped.
    head: usize,
}

impl<T> RingBuffer<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        }
    }

    pub fn push(&mut self, value: T) {
        if self.slots.len() < self.capacity {
            self.slots.push(value);
        } else {
            self.slots[self.head] = value;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.slots.len() {
            return None;
        }
        self.slots.get((self.head + index) % self.slots.len())
    }

    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn last(&self) -> Option<&T> {
        self.slots.len().checked_sub(1).and_then(|i| self.get(i))
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        (0..self.slots.len()).map(move |i| &self.slots[(self.head + i) % self.slots.len()])
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_below_capacity_keeps_order() {
        let mut buf = RingBuffer::with_capacity(4);
        buf.push(1);
        buf.push(2);
        assert_eq!(buf.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(buf.first(), Some(&1));
        assert_eq!(buf.last(), Some(&2));
        assert!(!buf.is_full());
    }

    #[test]
    fn test_overwrites_oldest_when_full() {
        let mut buf = RingBuffer::with_capacity(3);
        for v in 1..=7 {
            buf.push(v);
        }
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.iter().copied().collect::<Vec<_>>(), vec![5, 6, 7]);
        assert_eq!(buf.get(0), Some(&5));
        assert_eq!(buf.get(2), Some(&7));
        assert_eq!(buf.get(3), None);
        assert_eq!(buf.iter().rev().next(), Some(&7));
    }

    #[test]
    fn test_clear_resets() {
        let mut buf = RingBuffer::with_capacity(2);
        buf.push('a');
        buf.push('b');
        buf.push('c');
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.last(), None);
        buf.push('d');
        assert_eq!(buf.first(), Some(&'d'));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut buf = RingBuffer::with_capacity(0);
        buf.push(10);
        buf.push(11);
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.last(), Some(&11));
    }
}
