//! Fixed-capacity keyed reservation set.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::hash::Hash;

/// Outcome of a [`KeySlots::reserve`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// The key now holds a slot.
    Reserved,
    /// The key already holds a slot; the set is unchanged.
    AlreadyReserved,
    /// Every slot is taken; the set is unchanged.
    Exhausted,
}

/// At most `capacity` distinct keys held at once, each at most once.
#[derive(Debug)]
pub struct KeySlots<K> {
    live: HashSet<K>,
    capacity: usize,
}

impl<K: Eq + Hash> KeySlots<K> {
    /// Create a set with `capacity` free slots and no live keys.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            live: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Reserve a slot under `key`.
    ///
    /// The duplicate check runs before the capacity check, so a full set
    /// still reports an already-held key as `AlreadyReserved`.
    pub fn reserve(&mut self, key: K) -> ReserveOutcome {
        if self.live.contains(&key) {
            ReserveOutcome::AlreadyReserved
        } else if self.live.len() >= self.capacity {
            ReserveOutcome::Exhausted
        } else {
            self.live.insert(key);
            ReserveOutcome::Reserved
        }
    }

    /// Release the slot held under `key`. Returns `false` when the key does
    /// not hold one.
    pub fn release<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.live.remove(key)
    }

    /// Whether `key` currently holds a slot.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.live.contains(key)
    }

    /// Number of keys currently holding a slot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Number of slots currently free.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.capacity - self.live.len()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over the live keys in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.live.iter()
    }
}
