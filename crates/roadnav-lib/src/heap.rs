//! Indexed binary min-heap with decrease-key.
//!
//! Entries are dense node indices in `0..capacity`. A lookup table maps each
//! index to its heap slot so priorities can be changed in `O(log n)`.

use std::cmp::Ordering;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapEntry {
    index: usize,
    priority: f64,
}

impl HeapEntry {
    /// Priority first, then index so equal priorities pop deterministically.
    fn cmp_key(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Min-heap over `(index, priority)` pairs.
#[derive(Debug, Clone)]
pub struct IndexedMinHeap {
    entries: Vec<HeapEntry>,
    slots: Vec<Option<usize>>,
}

impl IndexedMinHeap {
    /// Heap accepting indices in `0..capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(Option::is_some)
    }

    /// Current priority of `index`, if queued.
    pub fn priority(&self, index: usize) -> Option<f64> {
        let slot = (*self.slots.get(index)?)?;
        Some(self.entries[slot].priority)
    }

    /// Minimum entry without removing it.
    pub fn peek_min(&self) -> Option<(usize, f64)> {
        self.entries
            .first()
            .map(|entry| (entry.index, entry.priority))
    }

    pub fn insert(&mut self, index: usize, priority: f64) -> Result<()> {
        self.check_range(index)?;
        if self.contains(index) {
            return Err(Error::HeapIndexPresent { index });
        }
        if self.entries.len() >= self.capacity() {
            return Err(Error::HeapFull {
                capacity: self.capacity(),
            });
        }

        let slot = self.entries.len();
        self.entries.push(HeapEntry { index, priority });
        self.slots[index] = Some(slot);
        self.sift_up(slot);
        Ok(())
    }

    /// Remove and return the index with the lowest priority.
    pub fn extract_min(&mut self) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }

        let last = self.entries.len() - 1;
        self.swap(0, last);
        let min = self.entries.pop()?;
        self.slots[min.index] = None;
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        Some(min.index)
    }

    /// Change the priority of a queued index.
    pub fn update(&mut self, index: usize, priority: f64) -> Result<()> {
        self.check_range(index)?;
        let Some(slot) = self.slots[index] else {
            return Err(Error::HeapIndexAbsent { index });
        };

        let previous = self.entries[slot].priority;
        self.entries[slot].priority = priority;
        if priority < previous {
            self.sift_up(slot);
        } else {
            self.sift_down(slot);
        }
        Ok(())
    }

    pub fn insert_or_update(&mut self, index: usize, priority: f64) -> Result<()> {
        if self.contains(index) {
            self.update(index, priority)
        } else {
            self.insert(index, priority)
        }
    }

    /// Drop every entry, keeping the capacity.
    pub fn clear(&mut self) {
        for entry in self.entries.drain(..) {
            self.slots[entry.index] = None;
        }
    }

    fn check_range(&self, index: usize) -> Result<()> {
        if index >= self.capacity() {
            return Err(Error::HeapIndexOutOfRange {
                index,
                capacity: self.capacity(),
            });
        }
        Ok(())
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.entries[a].cmp_key(&self.entries[b]) == Ordering::Less
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.entries.swap(a, b);
        self.slots[self.entries[a].index] = Some(a);
        self.slots[self.entries[b].index] = Some(b);
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if !self.less(slot, parent) {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut smallest = slot;
            if left < len && self.less(left, smallest) {
                smallest = left;
            }
            if right < len && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == slot {
                break;
            }
            self.swap(slot, smallest);
            slot = smallest;
        }
    }
}
