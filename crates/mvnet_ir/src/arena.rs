//! Generic slot pool for ID-indexed storage of graph entities.
//!
//! The [`Pool`] provides O(1) allocation, lookup, and recycling by opaque
//! [`ArenaId`] handles. Recycled slots are reused by later allocations; every
//! reuse bumps the slot's generation so that a handle to the old occupant no
//! longer resolves.

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Trait for generation-checked handle types used as pool keys.
pub trait ArenaId: Copy {
    /// Creates a handle from a slot index and generation.
    fn from_parts(index: u32, generation: u32) -> Self;

    /// Returns the slot index.
    fn index(self) -> u32;

    /// Returns the slot generation the handle was issued for.
    fn generation(self) -> u32;
}

/// Allocation failed because the pool reached its configured capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("pool capacity of {capacity} entries exhausted")]
pub struct PoolExhausted {
    /// The capacity that was reached.
    pub capacity: usize,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// A recycling, generation-checked container for graph entities.
///
/// Handles stay valid until their entry is recycled. Lookups through a stale
/// handle return `None` (or panic through [`Index`]), so a deleted entry can
/// never be confused with whatever later reuses its slot.
#[derive(Debug, Clone)]
pub struct Pool<I: ArenaId, T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
    capacity: Option<usize>,
    _marker: PhantomData<I>,
}

impl<I: ArenaId, T> Default for Pool<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Pool<I, T> {
    /// Creates a new, empty pool without a capacity limit.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            capacity: None,
            _marker: PhantomData,
        }
    }

    /// Creates a new, empty pool holding at most `capacity` live entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new()
        }
    }

    /// Returns the capacity limit, if any.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Stores `item` in a free slot and returns its handle.
    pub fn alloc(&mut self, item: T) -> Result<I, PoolExhausted> {
        if let Some(capacity) = self.capacity {
            if self.live >= capacity {
                return Err(PoolExhausted { capacity });
            }
        }
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(item);
            return Ok(I::from_parts(index, slot.generation));
        }
        if self.slots.len() >= u32::MAX as usize {
            self.live -= 1;
            return Err(PoolExhausted {
                capacity: self.slots.len(),
            });
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(item),
        });
        Ok(I::from_parts(index, 0))
    }

    /// Removes the entry behind `id` and returns it to the pool.
    ///
    /// Returns `None` if the handle is stale.
    pub fn recycle(&mut self, id: I) -> Option<T> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.live -= 1;
        Some(value)
    }

    /// Returns `true` if `id` refers to a live entry.
    pub fn contains(&self, id: I) -> bool {
        self.get(id).is_some()
    }

    /// Returns a reference to the entry, or `None` for a stale handle.
    pub fn get(&self, id: I) -> Option<&T> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    /// Returns a mutable reference to the entry, or `None` for a stale handle.
    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.value.as_mut()
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if the pool holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterates over `(ID, &T)` pairs of live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value
                .as_ref()
                .map(|value| (I::from_parts(i as u32, slot.generation), value))
        })
    }

    /// Collects the handles of all live entries in slot order.
    pub fn ids(&self) -> Vec<I> {
        self.iter().map(|(id, _)| id).collect()
    }
}

impl<I: ArenaId, T> Index<I> for Pool<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => panic!("stale pool handle (slot {})", id.index()),
        }
    }
}

impl<I: ArenaId, T> IndexMut<I> for Pool<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        match self.get_mut(id) {
            Some(value) => value,
            None => panic!("stale pool handle (slot {})", id.index()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NodeId;

    #[test]
    fn alloc_and_get() {
        let mut pool: Pool<NodeId, String> = Pool::new();
        let id = pool.alloc("hello".to_string()).unwrap();
        assert_eq!(pool[id], "hello");
    }

    #[test]
    fn multiple_allocs() {
        let mut pool: Pool<NodeId, u32> = Pool::new();
        let a = pool.alloc(10).unwrap();
        let b = pool.alloc(20).unwrap();
        let c = pool.alloc(30).unwrap();
        assert_eq!(pool[a], 10);
        assert_eq!(pool[b], 20);
        assert_eq!(pool[c], 30);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn recycled_slot_is_reused_with_new_generation() {
        let mut pool: Pool<NodeId, u32> = Pool::new();
        let a = pool.alloc(1).unwrap();
        assert_eq!(pool.recycle(a), Some(1));
        let b = pool.alloc(2).unwrap();
        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert!(pool.get(a).is_none());
        assert_eq!(pool[b], 2);
    }

    #[test]
    fn double_recycle_is_rejected() {
        let mut pool: Pool<NodeId, u32> = Pool::new();
        let a = pool.alloc(1).unwrap();
        assert!(pool.recycle(a).is_some());
        assert!(pool.recycle(a).is_none());
        assert!(pool.is_empty());
    }

    #[test]
    fn capacity_is_enforced() {
        let mut pool: Pool<NodeId, u32> = Pool::with_capacity(2);
        let a = pool.alloc(1).unwrap();
        pool.alloc(2).unwrap();
        assert_eq!(pool.alloc(3), Err(PoolExhausted { capacity: 2 }));
        pool.recycle(a);
        assert!(pool.alloc(3).is_ok());
    }

    #[test]
    fn iter_skips_recycled() {
        let mut pool: Pool<NodeId, &str> = Pool::new();
        pool.alloc("a").unwrap();
        let b = pool.alloc("b").unwrap();
        pool.alloc("c").unwrap();
        pool.recycle(b);
        let collected: Vec<_> = pool.iter().map(|(_, v)| *v).collect();
        assert_eq!(collected, vec!["a", "c"]);
        assert_eq!(pool.ids().len(), 2);
    }

    #[test]
    #[should_panic(expected = "stale pool handle")]
    fn index_with_stale_handle_panics() {
        let mut pool: Pool<NodeId, u32> = Pool::new();
        let a = pool.alloc(1).unwrap();
        pool.recycle(a);
        let _ = pool[a];
    }
}
