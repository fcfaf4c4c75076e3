//! Fixed-capacity slot arena with index handles.
//!
//! Slots are allocated once at construction and never grow. A removed slot
//! goes onto a free list and is handed out again by the next `insert`, so an
//! evicted entry's index is reassigned to its replacement.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub(crate) usize);

impl SlotId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
pub struct SlotArena<T> {
    slots: Vec<Option<T>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<T> SlotArena<T> {
    /// Creates an arena with exactly `capacity` empty slots.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            // Lowest index is handed out first.
            free_list: (0..capacity).rev().collect(),
            len: 0,
        }
    }

    /// Stores `value` in a free slot, or gives it back when every slot is taken.
    pub fn insert(&mut self, value: T) -> Result<SlotId, T> {
        let Some(idx) = self.free_list.pop() else {
            return Err(value);
        };
        self.slots[idx] = Some(value);
        self.len += 1;
        Ok(SlotId(idx))
    }

    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let slot = self.slots.get_mut(id.0)?;
        let value = slot.take()?;
        self.free_list.push(id.0);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots.get(id.0).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.slots
            .get(id.0)
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.free_list.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Empties every slot; capacity is unchanged.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.free_list.clear();
        self.free_list.extend((0..self.slots.len()).rev());
        self.len = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|value| (SlotId(idx), value)))
    }
}
