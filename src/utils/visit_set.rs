use sux::bits::BitVec;

/// A set over a bounded universe of `u32` keys with constant-time insertion
/// and membership tests, and iteration over the inserted keys in insertion
/// order.
///
/// BFS engines use this as their frontier: vertices are appended on discovery
/// and scanned by index, so the same structure doubles as queue and
/// visited-set. [`clear`](VisitSet::clear) walks the key list instead of the
/// whole universe, which makes reuse across many small searches cheap.
pub struct VisitSet {
    contained: BitVec,
    keys: Vec<u32>,
}

impl VisitSet {
    /// Creates a set over the key universe `[0, num_keys)`.
    pub fn new(num_keys: usize) -> Self {
        Self {
            contained: BitVec::new(num_keys),
            keys: Vec::new(),
        }
    }

    /// Returns the number of keys currently in the set.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[inline(always)]
    pub fn contains(&self, key: u32) -> bool {
        self.contained[key as usize]
    }

    /// Inserts a key. Inserting a key already in the set is a no-op.
    #[inline(always)]
    pub fn insert(&mut self, key: u32) {
        if !self.contained[key as usize] {
            self.contained.set(key as usize, true);
            self.keys.push(key);
        }
    }

    /// Returns the key at the given position of the insertion order.
    #[inline(always)]
    pub fn key(&self, index: usize) -> u32 {
        self.keys[index]
    }

    /// The inserted keys, in insertion order.
    #[inline(always)]
    pub fn keys(&self) -> &[u32] {
        &self.keys
    }

    /// Removes and returns the key at the given position, moving the last
    /// key into its place.
    pub fn delete_by_index(&mut self, index: usize) -> u32 {
        let key = self.keys.swap_remove(index);
        self.contained.set(key as usize, false);
        key
    }

    /// Removes and returns the most recently inserted key.
    pub fn delete_back(&mut self) -> u32 {
        let key = self.keys.pop().expect("delete_back on an empty set");
        self.contained.set(key as usize, false);
        key
    }

    /// Empties the set in time proportional to its current size.
    pub fn clear(&mut self) {
        for &key in &self.keys {
            self.contained.set(key as usize, false);
        }
        self.keys.clear();
    }
}
