//! Restores chunk order when workers finish out of order.

use std::collections::VecDeque;

/// Releases items in sequence-number order.
///
/// Items may be inserted with any sequence number at or after the next one to be
/// released; they come out only once every earlier number has been released.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    /// `buffer[i]` holds the item for sequence number `next_seq + i`
    buffer: VecDeque<Option<T>>,
    next_seq: u64,
    count: usize,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReorderBuffer<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::new(),
            next_seq: 0,
            count: 0,
        }
    }

    /// Buffer an item.
    ///
    /// Sequence numbers that were already released are ignored, as is a second
    /// item for a number still waiting.
    #[allow(clippy::cast_possible_truncation)]
    pub fn insert(&mut self, seq: u64, item: T) {
        debug_assert!(seq >= self.next_seq, "Sequence number {seq} was already released");
        if seq < self.next_seq {
            return;
        }

        let index = (seq - self.next_seq) as usize;
        if self.buffer.len() <= index {
            self.buffer.resize_with(index + 1, || None);
        }

        debug_assert!(self.buffer[index].is_none(), "Duplicate sequence number: {seq}");
        if self.buffer[index].is_none() {
            self.buffer[index] = Some(item);
            self.count += 1;
        }
    }

    /// Pop the next item in sequence, if it has arrived
    #[must_use]
    pub fn try_pop_next(&mut self) -> Option<T> {
        if !self.buffer.front().is_some_and(Option::is_some) {
            return None;
        }
        let item = self.buffer.pop_front().flatten()?;
        self.next_seq += 1;
        self.count -= 1;
        Some(item)
    }

    /// Sequence number that will be released next
    #[must_use]
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Number of items waiting
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
