// Per-node LRU content store
//
// Backed by `lru::LruCache`, so lookups, refreshes and evictions are O(1)
// whatever the capacity. Leaf stores hold the whole content universe.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::ndn_error::{SimError, SimResult};
use crate::ndn_interface::{ContentId, DataMarker, NodeRole};

/// Hit/miss/eviction counters of one store
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
}

impl CacheCounters {
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// Bounded least-recently-used cache of data markers
///
/// # Capacity by role
/// Capacity is fixed at construction. `for_role` gives infrastructure nodes the
/// configured router capacity and leaves a capacity equal to the content universe,
/// so leaves never evict.
#[derive(Debug)]
pub struct ContentStore {
    entries: LruCache<ContentId, DataMarker>,
    counters: CacheCounters,
}

impl ContentStore {
    pub fn new(capacity: usize) -> SimResult<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or(SimError::CapacityViolation { capacity })?;
        Ok(Self {
            entries: LruCache::new(capacity),
            counters: CacheCounters::default(),
        })
    }

    pub fn for_role(role: NodeRole, router_capacity: usize, universe_size: usize) -> SimResult<Self> {
        if role.is_infrastructure() {
            Self::new(router_capacity)
        } else {
            Self::new(universe_size)
        }
    }

    /// Look up a content; a hit becomes the most recently used entry
    pub fn get(&mut self, content: ContentId) -> Option<DataMarker> {
        match self.entries.get(&content) {
            Some(marker) => {
                self.counters.hits += 1;
                Some(*marker)
            }
            None => {
                self.counters.misses += 1;
                None
            }
        }
    }

    /// Insert or refresh a content as most recently used.
    /// Returns the evicted content, if a new id overflowed the store.
    pub fn put(&mut self, content: ContentId) -> Option<ContentId> {
        self.put_marker(DataMarker::new(content))
    }

    pub fn put_marker(&mut self, marker: DataMarker) -> Option<ContentId> {
        if self.entries.contains(&marker.content) {
            self.entries.put(marker.content, marker);
            return None;
        }

        self.counters.insertions += 1;
        let evicted = self.entries.push(marker.content, marker).map(|(id, _)| id);
        if evicted.is_some() {
            self.counters.evictions += 1;
        }
        evicted
    }

    /// Presence check that does not touch recency or counters
    pub fn contains(&self, content: ContentId) -> bool {
        self.entries.contains(&content)
    }

    /// Content ids from least to most recently used
    pub fn lru_order(&self) -> impl Iterator<Item = ContentId> + '_ {
        self.entries.iter().rev().map(|(&id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn counters(&self) -> CacheCounters {
        self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_get_refreshes_recency() {
        let mut cs = ContentStore::new(2).unwrap();
        cs.put(1); // A
        cs.put(2); // B
        assert!(cs.get(1).is_some());
        let evicted = cs.put(3); // C

        assert_eq!(evicted, Some(2));
        assert!(cs.contains(1));
        assert!(!cs.contains(2));
        assert!(cs.contains(3));
    }

    #[test]
    fn test_put_refreshes_without_eviction() {
        let mut cs = ContentStore::new(2).unwrap();
        cs.put(1);
        cs.put(2);
        assert_eq!(cs.put(1), None);
        assert_eq!(cs.lru_order().collect::<Vec<_>>(), vec![2, 1]);

        assert_eq!(cs.put(3), Some(2));
        assert_eq!(cs.counters().evictions, 1);
        assert_eq!(cs.counters().insertions, 3);
    }

    #[test]
    fn test_miss_and_hit_counters() {
        let mut cs = ContentStore::new(4).unwrap();
        assert_eq!(cs.get(9), None);
        cs.put(9);
        assert_eq!(cs.get(9), Some(DataMarker::new(9)));
        assert_eq!(cs.counters().hits, 1);
        assert_eq!(cs.counters().misses, 1);
        assert_eq!(cs.counters().hit_ratio(), 0.5);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            ContentStore::new(0).unwrap_err(),
            SimError::CapacityViolation { capacity: 0 }
        );
    }

    #[test]
    fn test_role_dependent_capacity() {
        let router = ContentStore::for_role(NodeRole::Router, 3, 100).unwrap();
        let access = ContentStore::for_role(NodeRole::Access, 3, 100).unwrap();
        let consumer = ContentStore::for_role(NodeRole::Consumer, 3, 100).unwrap();
        let producer = ContentStore::for_role(NodeRole::Producer, 3, 100).unwrap();
        assert_eq!(router.capacity(), 3);
        assert_eq!(access.capacity(), 3);
        assert_eq!(consumer.capacity(), 100);
        assert_eq!(producer.capacity(), 100);
    }

    #[test]
    fn test_leaf_store_never_evicts_within_universe() {
        let mut cs = ContentStore::for_role(NodeRole::Consumer, 2, 50).unwrap();
        for c in 0..50 {
            assert_eq!(cs.put(c), None);
        }
        assert_eq!(cs.len(), 50);
        assert_eq!(cs.counters().evictions, 0);
    }

    #[test]
    fn test_large_leaf_store_keeps_lru_order() {
        let universe = 200_000;
        let mut cs = ContentStore::for_role(NodeRole::Producer, 2, universe).unwrap();
        for c in 0..universe as ContentId {
            cs.put(c);
        }
        for c in (0..universe as ContentId).step_by(1_000) {
            assert!(cs.get(c).is_some());
        }
        assert_eq!(cs.len(), universe);
        assert_eq!(cs.counters().hits, 200);
        assert_eq!(cs.lru_order().next(), Some(1));
        assert_eq!(cs.lru_order().last(), Some(199_000));
    }

    // Random put/get sequences checked against a plain recency list
    #[test]
    fn test_random_sequences_match_reference_lru() {
        let mut rng = StdRng::seed_from_u64(5);
        for capacity in 1..6 {
            let mut cs = ContentStore::new(capacity).unwrap();
            let mut reference: Vec<ContentId> = Vec::new();

            for _ in 0..500 {
                let id = rng.gen_range(0..10);
                if rng.gen_bool(0.5) {
                    let hit = cs.get(id).is_some();
                    let position = reference.iter().position(|&c| c == id);
                    assert_eq!(hit, position.is_some());
                    if let Some(pos) = position {
                        reference.remove(pos);
                        reference.push(id);
                    }
                } else {
                    let evicted = cs.put(id);
                    let mut expected = None;
                    if let Some(pos) = reference.iter().position(|&c| c == id) {
                        reference.remove(pos);
                    } else if reference.len() == capacity {
                        expected = Some(reference.remove(0));
                    }
                    reference.push(id);
                    assert_eq!(evicted, expected);
                }

                assert!(cs.len() <= capacity);
                assert_eq!(cs.lru_order().collect::<Vec<_>>(), reference);
            }
        }
    }
}
