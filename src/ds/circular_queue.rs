//! Bounded FIFO ring with head/tail indices.
//!
//! Backs both the outbound command queue and the inbound reply queue. The
//! ring reserves one spare slot so that `head == tail` always means empty and
//! `(tail + 1) % slots == head` always means full.
//!
//! ## Architecture
//!
//! ```text
//!   capacity = 3  →  slots = 4
//!
//!   ┌──────┬──────┬──────┬──────┐
//!   │  a   │  b   │  c   │  -   │
//!   └──────┴──────┴──────┴──────┘
//!     ▲                    ▲
//!    head                 tail        (tail + 1) % 4 == head  →  full
//!
//!   dequeue(): take slot[head], then advance head
//!   enqueue(): write slot[tail], then advance tail
//! ```
//!
//! ## Notes
//! - A full ring rejects `enqueue` and hands the item back; nothing is
//!   overwritten and no index moves.
//! - `dequeue` moves the item out of its slot before `head` advances, so the
//!   slot cannot be handed to a producer while its item is still in it.

/// Rejected `enqueue`; carries the item back to the producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueFull<T>(pub T);

impl<T> QueueFull<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Fixed-capacity FIFO ring buffer.
#[derive(Debug)]
pub struct CircularQueue<T> {
    slots: Vec<Option<T>>,
    head: usize,
    tail: usize,
}

impl<T> CircularQueue<T> {
    /// Creates a queue that holds up to `capacity` items.
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity + 1);
        slots.resize_with(capacity + 1, || None);
        Self {
            slots,
            head: 0,
            tail: 0,
        }
    }

    /// Returns the maximum number of queued items.
    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    /// Returns the number of queued items.
    pub fn len(&self) -> usize {
        (self.tail + self.slots.len() - self.head) % self.slots.len()
    }

    /// Returns `true` if `head == tail`.
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Returns `true` if the next `enqueue` would be rejected.
    pub fn is_full(&self) -> bool {
        self.advance(self.tail) == self.head
    }

    /// Appends `item` at `tail`.
    pub fn enqueue(&mut self, item: T) -> Result<(), QueueFull<T>> {
        if self.is_full() {
            return Err(QueueFull(item));
        }
        self.slots[self.tail] = Some(item);
        self.tail = self.advance(self.tail);
        Ok(())
    }

    /// Removes and returns the item at `head`.
    pub fn dequeue(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.head].take();
        self.head = self.advance(self.head);
        item
    }

    /// Returns the item `dequeue` would return, without removing it.
    pub fn peek(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.slots[self.head].as_ref()
    }

    /// Iterates queued items from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let slots = self.slots.len();
        (0..self.len()).filter_map(move |offset| self.slots[(self.head + offset) % slots].as_ref())
    }

    /// Drops every queued item and rewinds both indices.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.head = 0;
        self.tail = 0;
    }

    fn advance(&self, idx: usize) -> usize {
        (idx + 1) % self.slots.len()
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert!(self.head < self.slots.len());
        assert!(self.tail < self.slots.len());
        let occupied = self.slots.iter().filter(|slot| slot.is_some()).count();
        assert_eq!(occupied, self.len());
        assert!(self.slots[self.tail].is_none());
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    proptest! {
        /// Property: the ring behaves like a bounded VecDeque.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_matches_bounded_deque(
            capacity in 1usize..8,
            ops in prop::collection::vec(prop::option::of(any::<u16>()), 0..200)
        ) {
            let mut queue = CircularQueue::new(capacity);
            let mut model = VecDeque::new();

            for op in ops {
                match op {
                    Some(v) => {
                        let result = queue.enqueue(v);
                        if model.len() == capacity {
                            prop_assert_eq!(result, Err(QueueFull(v)));
                        } else {
                            prop_assert!(result.is_ok());
                            model.push_back(v);
                        }
                    }
                    None => prop_assert_eq!(queue.dequeue(), model.pop_front()),
                }
                prop_assert_eq!(queue.len(), model.len());
                prop_assert_eq!(queue.is_empty(), model.is_empty());
                prop_assert_eq!(queue.is_full(), model.len() == capacity);
            }
        }
    }
}
