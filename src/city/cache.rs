//! Coordinate-keyed caches for characteristics and descriptors.
//!
//! Entries are shared through `Rc` so every holder sees the same instance and
//! the same memoised derived values. Maps are borrowed only for a lookup or an
//! insert, never while an entry is being built, so construction may recurse
//! into the cache freely.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::coords::ChunkCoord;

use super::characteristics::ChunkCharacteristics;
use super::descriptor::ChunkDescriptor;

/// Cache statistics for monitoring
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub characteristics_hits: usize,
    pub characteristics_misses: usize,
    pub descriptor_hits: usize,
    pub descriptor_misses: usize,
    /// Current number of cached characteristics
    pub characteristics_count: usize,
    /// Current number of cached descriptors
    pub descriptor_count: usize,
}

impl CacheStats {
    pub fn hits(&self) -> usize {
        self.characteristics_hits + self.descriptor_hits
    }

    pub fn misses(&self) -> usize {
        self.characteristics_misses + self.descriptor_misses
    }

    /// Calculate hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits() + self.misses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f32 / total as f32
        }
    }

    /// Format as human-readable string
    pub fn summary(&self) -> String {
        format!(
            "Hits: {} | Misses: {} | Rate: {:.1}% | Characteristics: {} | Descriptors: {}",
            self.hits(),
            self.misses(),
            self.hit_rate() * 100.0,
            self.characteristics_count,
            self.descriptor_count
        )
    }
}

/// The two resolution caches of one resolver.
#[derive(Default)]
pub(crate) struct ResolverCache {
    characteristics: RefCell<HashMap<ChunkCoord, Rc<ChunkCharacteristics>>>,
    descriptors: RefCell<HashMap<ChunkCoord, Rc<ChunkDescriptor>>>,
    stats: Cell<CacheStats>,
}

impl ResolverCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn update_stats<F: FnOnce(&mut CacheStats)>(&self, f: F) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    pub fn characteristics(&self, coord: ChunkCoord) -> Option<Rc<ChunkCharacteristics>> {
        let found = self.characteristics.borrow().get(&coord).cloned();
        self.update_stats(|s| match found {
            Some(_) => s.characteristics_hits += 1,
            None => s.characteristics_misses += 1,
        });
        found
    }

    /// Insert unless an entry already exists; returns the entry that stays.
    pub fn insert_characteristics(
        &self,
        coord: ChunkCoord,
        value: Rc<ChunkCharacteristics>,
    ) -> Rc<ChunkCharacteristics> {
        let mut map = self.characteristics.borrow_mut();
        let kept = map.entry(coord).or_insert(value).clone();
        let count = map.len();
        drop(map);
        self.update_stats(|s| s.characteristics_count = count);
        kept
    }

    pub fn descriptor(&self, coord: ChunkCoord) -> Option<Rc<ChunkDescriptor>> {
        let found = self.descriptors.borrow().get(&coord).cloned();
        self.update_stats(|s| match found {
            Some(_) => s.descriptor_hits += 1,
            None => s.descriptor_misses += 1,
        });
        found
    }

    /// Insert unless an entry already exists; returns the entry that stays.
    pub fn insert_descriptor(&self, coord: ChunkCoord, value: Rc<ChunkDescriptor>) -> Rc<ChunkDescriptor> {
        let mut map = self.descriptors.borrow_mut();
        let kept = map.entry(coord).or_insert(value).clone();
        let count = map.len();
        drop(map);
        self.update_stats(|s| s.descriptor_count = count);
        kept
    }

    /// Drop every entry and reset statistics.
    pub fn clear(&self) {
        self.characteristics.borrow_mut().clear();
        self.descriptors.borrow_mut().clear();
        self.stats.set(CacheStats::default());
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetRegistry;
    use crate::coords::DimensionId;

    fn sample(is_city: bool) -> Rc<ChunkCharacteristics> {
        let assets = AssetRegistry::defaults();
        Rc::new(ChunkCharacteristics {
            is_city,
            section: None,
            city_level: 0,
            could_have_building: false,
            city_style: assets.city_style_id("citystyle_standard").unwrap(),
            multi_building: None,
            building: assets.building_id("office").unwrap(),
        })
    }

    #[test]
    fn test_insert_keeps_first_entry() {
        let cache = ResolverCache::new();
        let c = ChunkCoord::new(DimensionId(0), 1, 2);
        let first = cache.insert_characteristics(c, sample(true));
        let second = cache.insert_characteristics(c, sample(false));
        assert!(Rc::ptr_eq(&first, &second));
        assert!(cache.characteristics(c).unwrap().is_city);
    }

    #[test]
    fn test_hit_and_miss_counts() {
        let cache = ResolverCache::new();
        let c = ChunkCoord::new(DimensionId(0), 0, 0);
        assert!(cache.characteristics(c).is_none());
        cache.insert_characteristics(c, sample(true));
        assert!(cache.characteristics(c).is_some());
        let stats = cache.stats();
        assert_eq!(stats.characteristics_hits, 1);
        assert_eq!(stats.characteristics_misses, 1);
        assert_eq!(stats.characteristics_count, 1);
        assert!((stats.hit_rate() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_clear_resets_everything() {
        let cache = ResolverCache::new();
        let c = ChunkCoord::new(DimensionId(0), 0, 0);
        cache.insert_characteristics(c, sample(true));
        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
        assert!(cache.characteristics(c).is_none());
        cache.clear();
        assert_eq!(cache.stats().characteristics_count, 0);
    }
}
