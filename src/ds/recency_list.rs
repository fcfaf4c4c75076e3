//! Singly linked recency chain backed by a fixed-capacity `SlotArena`.
//!
//! Nodes live in arena slots and point forward by `SlotId`. `head` names the
//! most-recently-used node and `tail` the least-recently-used one; an empty
//! chain has both set to `None`.
//!
//! ## Architecture
//!
//! ```text
//!   arena (SlotArena<Node<T>>, fixed capacity)
//!   ┌────────┬──────────────────────────────────┐
//!   │ SlotId │ Node { value, next }             │
//!   ├────────┼──────────────────────────────────┤
//!   │ 0      │ { value: B, next: Some(2) }      │
//!   │ 1      │ { value: A, next: Some(0) }      │
//!   │ 2      │ { value: C, next: None }         │
//!   │ 3      │ (free)                           │
//!   └────────┴──────────────────────────────────┘
//!
//!   head ─► [1:A] ──► [0:B] ──► [2:C] ◄── tail
//!           MRU                  LRU
//! ```
//!
//! ## Operations
//! - `find(pred)`: scan from head, returns a [`Cursor`] (node + predecessor)
//! - `promote(cursor)`: unlink after the predecessor, relink at head
//! - `push_front(value)`: take a free slot, link at head
//! - `pop_back()`: unlink the tail (predecessor found by scan)
//! - `remove_where(pred)`: unlink the first match, patching head/tail
//!
//! Without back links, finding a predecessor costs a scan. Every scan is
//! bounded by the arena capacity, never by traffic volume.

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;

#[derive(Debug)]
struct Node<T> {
    value: T,
    next: Option<SlotId>,
}

/// Location of a node found by a front-to-back scan.
///
/// `prev` is `None` only for the current head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub prev: Option<SlotId>,
    pub id: SlotId,
}

/// Recency-ordered chain over a fixed set of slots.
#[derive(Debug)]
pub struct RecencyList<T> {
    arena: SlotArena<Node<T>>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl<T> RecencyList<T> {
    /// Creates an empty chain able to hold `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: SlotArena::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    /// Returns the number of linked nodes.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` if no node is linked.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Returns `true` if every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.arena.is_full()
    }

    /// Returns the fixed number of slots.
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Returns the most-recently-used value.
    pub fn front(&self) -> Option<&T> {
        self.head.and_then(|id| self.get(id))
    }

    /// Returns the most-recently-used value mutably.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        let id = self.head?;
        self.get_mut(id)
    }

    pub fn front_id(&self) -> Option<SlotId> {
        self.head
    }

    /// Returns the least-recently-used value.
    pub fn back(&self) -> Option<&T> {
        self.tail.and_then(|id| self.get(id))
    }

    pub fn back_id(&self) -> Option<SlotId> {
        self.tail
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.arena.get(id).map(|node| &node.value)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.arena.get_mut(id).map(|node| &mut node.value)
    }

    /// Scans from head and returns the first node matching `pred`.
    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<Cursor> {
        let mut prev = None;
        let mut current = self.head;
        while let Some(id) = current {
            let node = self.arena.get(id)?;
            if pred(&node.value) {
                return Some(Cursor { prev, id });
            }
            prev = Some(id);
            current = node.next;
        }
        None
    }

    /// Links `value` at head, or hands it back when no slot is free.
    pub fn push_front(&mut self, value: T) -> Result<SlotId, T> {
        let node = Node {
            value,
            next: self.head,
        };
        let id = self.arena.insert(node).map_err(|node| node.value)?;
        if self.head.is_none() {
            self.tail = Some(id);
        }
        self.head = Some(id);
        Ok(id)
    }

    /// Moves the node at `at` to head.
    ///
    /// Promoting the current head leaves the chain unchanged. Returns `false`
    /// if the cursor no longer describes a linked node.
    pub fn promote(&mut self, at: Cursor) -> bool {
        if self.head == Some(at.id) {
            return true;
        }
        let Some(prev) = at.prev else {
            return false;
        };
        let next = match self.arena.get(at.id) {
            Some(node) => node.next,
            None => return false,
        };
        match self.arena.get_mut(prev) {
            Some(prev_node) if prev_node.next == Some(at.id) => prev_node.next = next,
            _ => return false,
        }
        if self.tail == Some(at.id) {
            self.tail = Some(prev);
        }
        let old_head = self.head;
        if let Some(node) = self.arena.get_mut(at.id) {
            node.next = old_head;
        }
        self.head = Some(at.id);
        true
    }

    /// Unlinks and returns the least-recently-used value.
    pub fn pop_back(&mut self) -> Option<T> {
        let tail = self.tail?;
        if self.head == Some(tail) {
            self.head = None;
            self.tail = None;
            return self.arena.remove(tail).map(|node| node.value);
        }

        let mut current = self.head?;
        loop {
            let next = self.arena.get(current)?.next;
            if next == Some(tail) {
                break;
            }
            current = next?;
        }
        self.arena.get_mut(current)?.next = None;
        self.tail = Some(current);
        self.arena.remove(tail).map(|node| node.value)
    }

    /// Unlinks the first node matching `pred` and returns its value.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> Option<T> {
        let head = self.head?;

        // Exactly one node: it either matches or the chain is left alone.
        if self.head == self.tail {
            if !pred(&self.arena.get(head)?.value) {
                return None;
            }
            self.head = None;
            self.tail = None;
            return self.arena.remove(head).map(|node| node.value);
        }

        let head_node = self.arena.get(head)?;
        if pred(&head_node.value) {
            self.head = head_node.next;
            return self.arena.remove(head).map(|node| node.value);
        }

        // Interior or tail: splice around it, tail falls back to the predecessor.
        let mut prev = head;
        let mut current = head_node.next;
        while let Some(id) = current {
            let node = self.arena.get(id)?;
            if pred(&node.value) {
                let after = node.next;
                self.arena.get_mut(prev)?.next = after;
                if self.tail == Some(id) {
                    self.tail = Some(prev);
                }
                return self.arena.remove(id).map(|node| node.value);
            }
            prev = id;
            current = node.next;
        }
        None
    }

    /// Unlinks every node; capacity is unchanged.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
        self.tail = None;
    }

    /// Returns an iterator from MRU to LRU.
    pub fn iter(&self) -> RecencyIter<'_, T> {
        RecencyIter {
            list: self,
            current: self.head,
        }
    }

    /// Returns the chain order as SlotIds from head to tail.
    pub fn ids(&self) -> Vec<SlotId> {
        let mut ids = Vec::with_capacity(self.len());
        let mut current = self.head;
        while let Some(id) = current {
            ids.push(id);
            current = self.arena.get(id).and_then(|node| node.next);
        }
        ids
    }

    /// Verifies that head reaches every occupied slot exactly once and ends at tail.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.head.is_none() || self.tail.is_none() {
            if self.head.is_some() || self.tail.is_some() {
                return Err(InvariantError::new("head and tail disagree on emptiness"));
            }
            if !self.arena.is_empty() {
                return Err(InvariantError::new(format!(
                    "empty chain but {} occupied slots",
                    self.arena.len()
                )));
            }
            return Ok(());
        }

        let mut seen = vec![false; self.arena.capacity()];
        let mut count = 0usize;
        let mut last = None;
        let mut current = self.head;
        while let Some(id) = current {
            let node = self
                .arena
                .get(id)
                .ok_or_else(|| InvariantError::new(format!("slot {} linked but empty", id.0)))?;
            if std::mem::replace(&mut seen[id.0], true) {
                return Err(InvariantError::new(format!("cycle through slot {}", id.0)));
            }
            count += 1;
            last = Some(id);
            current = node.next;
        }

        if last != self.tail {
            return Err(InvariantError::new("chain does not end at tail"));
        }
        if count != self.arena.len() {
            return Err(InvariantError::new(format!(
                "chain length {} != occupied slots {}",
                count,
                self.arena.len()
            )));
        }
        Ok(())
    }
}

/// Iterator over values from MRU to LRU.
pub struct RecencyIter<'a, T> {
    list: &'a RecencyList<T>,
    current: Option<SlotId>,
}

impl<'a, T> Iterator for RecencyIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.list.arena.get(id)?;
        self.current = node.next;
        Some(&node.value)
    }
}
