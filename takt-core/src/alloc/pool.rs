//! ## takt-core::alloc::pool
//! **Fixed-capacity slot pools**
//!
//! A `SlotPool` hands out the lowest free slot index, so an index released by
//! `remove` is the next one reused. Timer ids and event server ids are slot
//! indices, which keeps them small and bounded by an explicit capacity instead of
//! the width of a bitmap word.

/// Fixed-capacity arena addressed by slot index.
#[derive(Debug, Clone)]
pub struct SlotPool<T> {
    slots: Vec<Option<T>>,
    len: usize,
}

impl<T> SlotPool<T> {
    /// Creates a pool with `capacity` empty slots.
    ///
    /// # Panics
    ///
    /// A zero capacity is a configuration bug and panics.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");

        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);

        Self { slots, len: 0 }
    }

    /// Stores `value` in the lowest free slot and returns its index.
    ///
    /// Hands the value back when every slot is occupied.
    pub fn insert(&mut self, value: T) -> Result<usize, T> {
        match self.slots.iter().position(Option::is_none) {
            Some(index) => {
                self.slots[index] = Some(value);
                self.len += 1;
                Ok(index)
            }
            None => Err(value),
        }
    }

    /// Frees the slot at `index`, returning what it held.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        let value = self.slots.get_mut(index)?.take()?;
        self.len -= 1;
        Some(value)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)?.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)?.as_mut()
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Total number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Occupied slot indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.iter().map(|(index, _)| index)
    }

    /// Occupied slots in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|value| (index, value)))
    }

    /// Empties every slot, returning the number of values dropped.
    pub fn clear(&mut self) -> usize {
        let cleared = self.len;
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.len = 0;
        cleared
    }
}
