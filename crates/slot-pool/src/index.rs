//! Fixed-capacity free-index tracker.
//!
//! Indices are acquired lowest-first, so a freed slot's identity (and
//! everything a consumer derives from it) is reissued before the tracker
//! grows into higher indices.

const WORD_BITS: usize = u64::BITS as usize;

/// Bitset over `[0, capacity)` where a set bit means the index is held.
///
/// Bits past `capacity` in the last word are permanently set so the acquire
/// scan can never yield an out-of-range index.
#[derive(Debug)]
pub struct FreeIndexSet {
    words: Vec<u64>,
    capacity: usize,
    free: usize,
}

impl FreeIndexSet {
    /// Create a tracker with all `capacity` indices free.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let word_count = capacity.div_ceil(WORD_BITS);
        let mut words = vec![0u64; word_count];
        let tail = word_count * WORD_BITS - capacity;
        if let Some(last) = words.last_mut().filter(|_| tail > 0) {
            *last = !0u64 << (WORD_BITS - tail);
        }
        Self {
            words,
            capacity,
            free: capacity,
        }
    }

    /// Acquire the lowest free index, or `None` when every index is held.
    pub fn acquire(&mut self) -> Option<usize> {
        if self.free == 0 {
            return None;
        }
        let (word_idx, word) = self
            .words
            .iter_mut()
            .enumerate()
            .find(|(_, word)| **word != u64::MAX)?;
        let bit = word.trailing_ones() as usize;
        *word |= 1u64 << bit;
        self.free -= 1;
        Some(word_idx * WORD_BITS + bit)
    }

    /// Release a held index back to the free set.
    ///
    /// Returns `false` when `index` is out of range or not currently held
    /// (a double free), leaving the tracker unchanged.
    pub fn release(&mut self, index: usize) -> bool {
        if index >= self.capacity {
            return false;
        }
        let Some(word) = self.words.get_mut(index / WORD_BITS) else {
            return false;
        };
        let mask = 1u64 << (index % WORD_BITS);
        if *word & mask == 0 {
            return false;
        }
        *word &= !mask;
        self.free += 1;
        true
    }

    /// Whether `index` is currently held.
    #[must_use]
    pub fn is_held(&self, index: usize) -> bool {
        index < self.capacity
            && self
                .words
                .get(index / WORD_BITS)
                .is_some_and(|word| word & (1u64 << (index % WORD_BITS)) != 0)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of indices currently free.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free
    }
}
