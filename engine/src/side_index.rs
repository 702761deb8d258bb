// Price-sorted index of non-empty levels for one side of the book.
//
// Implemented over an ordered map (spec's option (a), "simplest and used by
// the canonical source" — see original_source/include/core/OrderBook.hpp,
// which keys `std::map<Price, LimitLevel*, std::greater<Price>>` for bids and
// the default ascending `std::map` for asks). `K` carries the ordering: the
// book uses `Price` for asks and `Reverse<Price>` for bids, so the smallest
// key in either map is always the best level — `BTreeMap::first_key_value`
// is O(log n), so a cached copy of it is kept and refreshed on every
// mutation, giving O(1) reads for `best()`.

use std::collections::BTreeMap;

pub struct SideIndex<K: Ord + Copy> {
    levels: BTreeMap<K, usize>,
    best: Option<(K, usize)>,
}

impl<K: Ord + Copy> SideIndex<K> {
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
            best: None,
        }
    }

    /// O(1): the best (lowest-keyed) level, or `None` if the side is empty.
    #[inline]
    pub fn best(&self) -> Option<(K, usize)> {
        self.best
    }

    /// O(log n): the level pool slot index at `key`, if present.
    pub fn find(&self, key: K) -> Option<usize> {
        self.levels.get(&key).copied()
    }

    /// O(log n): inserts a freshly allocated level. `key` must not already
    /// be present.
    pub fn insert(&mut self, key: K, idx: usize) {
        debug_assert!(
            !self.levels.contains_key(&key),
            "SideIndex::insert called with a key that already has a level"
        );
        self.levels.insert(key, idx);
        self.refresh_best();
    }

    /// O(log n): returns the existing level at `key`, or calls `create` to
    /// allocate a new one and inserts it.
    pub fn get_or_create(&mut self, key: K, create: impl FnOnce() -> usize) -> usize {
        if let Some(&idx) = self.levels.get(&key) {
            return idx;
        }
        let idx = create();
        self.levels.insert(key, idx);
        self.refresh_best();
        idx
    }

    /// O(log n): removes the level at `key`, returning its slot index.
    pub fn remove(&mut self, key: K) -> Option<usize> {
        let removed = self.levels.remove(&key);
        if removed.is_some() {
            self.refresh_best();
        }
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// All indexed keys, in ascending order. Diagnostic use only.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.levels.keys().copied()
    }

    fn refresh_best(&mut self) {
        self.best = self.levels.iter().next().map(|(&k, &v)| (k, v));
    }
}

impl<K: Ord + Copy> Default for SideIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}
