//! Hashed two-level keyed container.
//!
//! Keys are routed to one of `B` buckets by a seeded hash (`B` a power of
//! two, so routing is a mask). An outer [`SumTree`] with exactly `B`
//! leaves holds the bucket totals; each bucket is its own small keyed
//! container. Outer updates cost O(log B) with B fixed at construction,
//! and inner work scales with the expected bucket load `n / B`.
//!
//! A mirror array of bucket totals backs the outer leaves. On every
//! update the touched leaf is overwritten with the mirrored total rather
//! than incremented, so rounding error cannot accumulate at the outer
//! level no matter how many inner updates a bucket absorbs.

use std::hash::Hash;
use std::marker::PhantomData;

use ahash::RandomState;

use crate::core::check_weight;
use crate::core::dense::DenseSums;
use crate::core::error::{Result, WeightError};
use crate::core::hasher_state;
use crate::core::slot_map::SlotMap;
use crate::core::sum_tree::SumTree;
use crate::core::table::WeightTable;

/// Two-level keyed weighted container: outer tree over bucket totals,
/// pluggable keyed container per bucket.
#[derive(Debug, Clone)]
pub struct BucketMap<K, I = SlotMap<K>> {
    outer: SumTree,
    /// Mirrored bucket totals; source of truth for the outer leaves.
    totals: Vec<f64>,
    buckets: Vec<I>,
    hasher: RandomState,
    mask: u64,
    len: usize,
    _key: PhantomData<K>,
}

impl<K, I> BucketMap<K, I>
where
    K: Eq + Hash + Clone,
    I: WeightTable<K> + Default,
{
    /// Create a map with `nbuckets` buckets (a nonzero power of two) and
    /// a hash seed.
    ///
    /// # Errors
    ///
    /// Returns [`WeightError::InvalidCapacity`] when `nbuckets` is zero
    /// or not a power of two.
    pub fn new(nbuckets: usize, seed: u64) -> Result<Self> {
        if nbuckets == 0 || !nbuckets.is_power_of_two() {
            return Err(WeightError::InvalidCapacity(nbuckets));
        }
        Ok(Self {
            outer: SumTree::with_capacity(nbuckets),
            totals: vec![0.0; nbuckets],
            buckets: (0..nbuckets).map(|_| I::default()).collect(),
            hasher: hasher_state(seed),
            mask: (nbuckets - 1) as u64,
            len: 0,
            _key: PhantomData,
        })
    }

    /// Bucket a key routes to; stable for the key's lifetime.
    #[must_use]
    pub fn bucket_of(&self, key: &K) -> usize {
        (self.hasher.hash_one(key) & self.mask) as usize
    }

    /// Number of buckets.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

impl<K, I> WeightTable<K> for BucketMap<K, I>
where
    K: Eq + Hash + Clone,
    I: WeightTable<K> + Default,
{
    fn set(&mut self, key: K, weight: f64) {
        check_weight(weight);
        let bucket = self.bucket_of(&key);
        let old = self.buckets[bucket].get(&key).ok();
        // Inner mutation happens before the mirror and outer tree are
        // touched, so a failure inside the bucket leaves the container in
        // its pre-call state.
        self.buckets[bucket].set(key, weight);
        if old.is_none() {
            self.len += 1;
        }
        let delta = weight - old.unwrap_or(0.0);
        if delta != 0.0 {
            self.totals[bucket] += delta;
            self.outer.update(bucket, self.totals[bucket]);
        }
    }

    fn get(&self, key: &K) -> Result<f64> {
        self.buckets[self.bucket_of(key)].get(key)
    }

    fn erase(&mut self, key: &K) {
        let bucket = self.bucket_of(key);
        let Ok(old) = self.buckets[bucket].get(key) else {
            return;
        };
        self.buckets[bucket].erase(key);
        self.len -= 1;
        if old != 0.0 {
            self.totals[bucket] -= old;
            self.outer.update(bucket, self.totals[bucket]);
        }
    }

    fn total(&mut self) -> f64 {
        self.outer.total()
    }

    fn choose(&mut self, draw: f64) -> Result<(K, f64)> {
        let (bucket, _) = self.outer.choose(draw)?;
        let inner_draw = draw - self.outer.prefix_before(bucket);
        self.buckets[bucket].choose(inner_draw).map_err(|err| {
            match err {
                // The outer tree accepted the draw, so falling off the
                // bucket means the mirror and the bucket disagree.
                WeightError::OutOfRange { .. } => WeightError::Internal {
                    residual: inner_draw,
                },
                other => other,
            }
        })
    }

    fn len(&self) -> usize {
        self.len
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = (&'a K, f64)> + 'a
    where
        K: 'a,
    {
        self.buckets.iter().flat_map(|bucket| bucket.iter())
    }

    fn clear(&mut self) {
        self.outer.clear();
        self.totals.fill(0.0);
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cum_sum::CumSum;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn scenario_map() -> BucketMap<&'static str> {
        let mut map = BucketMap::new(4, 0).unwrap();
        map.set("a", 10.0);
        map.set("b", 20.0);
        map.set("c", 5.0);
        map.set("d", 15.0);
        map
    }

    // -------------------------------------------------------------------------
    // Construction Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_rejects_bad_bucket_counts() {
        assert_eq!(
            BucketMap::<u32>::new(0, 0).unwrap_err(),
            WeightError::InvalidCapacity(0)
        );
        assert_eq!(
            BucketMap::<u32>::new(3, 0).unwrap_err(),
            WeightError::InvalidCapacity(3)
        );
        assert_eq!(
            BucketMap::<u32>::new(12, 0).unwrap_err(),
            WeightError::InvalidCapacity(12)
        );
    }

    #[test]
    fn test_accepts_power_of_two_bucket_counts() {
        for b in [1, 2, 4, 64, 1024] {
            assert_eq!(BucketMap::<u32>::new(b, 7).unwrap().bucket_count(), b);
        }
    }

    // -------------------------------------------------------------------------
    // Contract Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_set_update_erase_totals() {
        let mut map = scenario_map();
        assert!((map.total() - 50.0).abs() < 1e-12);
        assert_eq!(map.len(), 4);

        map.set("a", 25.0);
        assert!((map.total() - 65.0).abs() < 1e-12);
        assert_eq!(map.len(), 4);

        map.erase(&"b");
        assert!((map.total() - 45.0).abs() < 1e-12);
        assert!(!map.has(&"b"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_get_routes_through_buckets() {
        let map = scenario_map();
        assert_eq!(map.get(&"c"), Ok(5.0));
        assert_eq!(map.get(&"zzz"), Err(WeightError::NotFound));
    }

    #[test]
    fn test_erase_absent_key_is_a_noop() {
        let mut map = scenario_map();
        map.erase(&"nope");
        assert!((map.total() - 50.0).abs() < 1e-12);
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn test_bucket_of_is_stable() {
        let mut map: BucketMap<u64> = BucketMap::new(8, 3).unwrap();
        for k in 0..64 {
            map.set(k, 1.0);
        }
        let before: Vec<usize> = (0..64).map(|k| map.bucket_of(&k)).collect();
        for k in 0..64 {
            map.set(k, (k as f64) + 0.5);
        }
        map.erase(&11);
        let after: Vec<usize> = (0..64).map(|k| map.bucket_of(&k)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_choose_covers_every_key() {
        let mut map: BucketMap<u64> = BucketMap::new(4, 1).unwrap();
        for k in 0..32 {
            map.set(k, 1.0 + (k % 5) as f64);
        }
        let total = map.total();
        let mut seen = std::collections::HashSet::new();
        let mut u = 0.0;
        while u < total {
            let (key, weight) = map.choose(u).unwrap();
            assert_eq!(map.get(&key), Ok(weight));
            seen.insert(key);
            u += 0.25;
        }
        assert_eq!(seen.len(), 32);
    }

    #[test]
    fn test_choose_out_of_range() {
        let mut map = scenario_map();
        assert!(matches!(
            map.choose(50.0),
            Err(WeightError::OutOfRange { .. })
        ));
        assert!(matches!(
            map.choose(-1.0),
            Err(WeightError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_zero_weight_keys_stay_resident() {
        let mut map = scenario_map();
        map.set("a", 0.0);
        assert!(map.has(&"a"));
        assert_eq!(map.len(), 4);
        assert!((map.total() - 40.0).abs() < 1e-12);

        let mut u = 0.0;
        let total = map.total();
        while u < total {
            let (key, _) = map.choose(u).unwrap();
            assert_ne!(key, "a");
            u += 0.5;
        }
    }

    #[test]
    fn test_clear() {
        let mut map = scenario_map();
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.total(), 0.0);
        map.set("e", 2.0);
        assert_eq!(map.choose(1.0), Ok(("e", 2.0)));
    }

    #[test]
    fn test_iter_spans_buckets() {
        let map = scenario_map();
        let mut keys: Vec<&str> = map.iter().map(|(&k, _)| k).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["a", "b", "c", "d"]);
        let total: f64 = map.iter().map(|(_, w)| w).sum();
        assert!((total - 50.0).abs() < 1e-12);
    }

    // -------------------------------------------------------------------------
    // Alternate Inner Container Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_flat_scan_inner_buckets() {
        // Tiny buckets work just as well over the lazy prefix array.
        let mut map: BucketMap<u64, SlotMap<u64, CumSum>> = BucketMap::new(2, 9).unwrap();
        for k in 0..10 {
            map.set(k, 1.0);
        }
        assert!((map.total() - 10.0).abs() < 1e-12);
        let (key, weight) = map.choose(9.5).unwrap();
        assert_eq!(weight, 1.0);
        assert!(map.has(&key));
    }

    // -------------------------------------------------------------------------
    // Distribution Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_choose_distribution_matches_weights() {
        let mut map = scenario_map();
        let mut rng = ChaCha8Rng::seed_from_u64(12345);

        let n = 20_000;
        let mut hits = std::collections::HashMap::new();
        for _ in 0..n {
            let u = rng.gen::<f64>() * map.total();
            let (key, _) = map.choose(u).unwrap();
            *hits.entry(key).or_insert(0usize) += 1;
        }

        for (key, expected) in [("a", 0.2), ("b", 0.4), ("c", 0.1), ("d", 0.3)] {
            let observed = hits[key] as f64 / n as f64;
            assert!(
                (observed - expected).abs() < 0.02,
                "{key}: observed {observed}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_heavy_churn_keeps_totals_consistent() {
        let mut map: BucketMap<u64> = BucketMap::new(16, 5).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let mut model = std::collections::HashMap::new();

        for _ in 0..5_000 {
            let key = rng.gen_range(0..200u64);
            if rng.gen_bool(0.3) {
                map.erase(&key);
                model.remove(&key);
            } else {
                let w = rng.gen_range(0.0..10.0);
                map.set(key, w);
                model.insert(key, w);
            }
        }

        let expected: f64 = model.values().sum();
        assert!((map.total() - expected).abs() < 1e-6);
        assert_eq!(map.len(), model.len());
        for (key, &w) in &model {
            assert_eq!(map.get(key), Ok(w));
        }
    }
}
