//! Core weighted-container implementations.
//!
//! Everything in this module answers the same question at high throughput:
//! given a mutable collection of keyed nonnegative weights, draw a key with
//! probability proportional to its weight while absorbing frequent inserts,
//! erasures, and in-place weight updates.
//!
//! The containers layer on each other:
//!
//! - Dense, slot-indexed prefix sums ([`SumTree`], [`CumSum`]) implement
//!   the [`DenseSums`] contract.
//! - Keyed wrappers ([`SlotMap`], [`PinnedSlotMap`]) put a key↔slot
//!   bookkeeping layer over any dense store.
//! - Self-contained keyed structures ([`BucketMap`], [`TreapMap`],
//!   [`SumTrie`]) implement the [`WeightTable`] contract directly.
//!
//! Weighted choice takes a draw in `[0, total())` and walks cached partial
//! sums; [`draw`] pairs that with a uniform draw from a caller-supplied
//! RNG.

pub mod buckets;
pub mod cum_sum;
pub mod dense;
pub mod error;
pub mod pinned;
pub mod slot_map;
pub mod sum_tree;
pub mod table;
pub mod treap;
pub mod trie;

pub use buckets::BucketMap;
pub use cum_sum::CumSum;
pub use dense::DenseSums;
pub use error::{Result, WeightError};
pub use pinned::PinnedSlotMap;
pub use slot_map::SlotMap;
pub use sum_tree::SumTree;
pub use table::{draw, WeightTable};
pub use treap::TreapMap;
pub use trie::SumTrie;

use std::hash::Hash;

use ahash::RandomState;

/// Stride mixed into a seed to derive an independent second seed.
///
/// This is the 64-bit golden-ratio constant; two hash states whose seeds
/// differ by it behave as independent hash functions for the purposes of
/// the 128-bit ordinates used by [`TreapMap`] and [`SumTrie`].
pub(crate) const SEED_STRIDE: u64 = 0x9e37_79b9_7f4a_7c15;

/// Build a deterministic seeded hasher state.
///
/// `ahash` takes four lanes of seed material; spreading one `u64` across
/// them keeps distinct seeds from collapsing onto any single lane.
pub(crate) fn hasher_state(seed: u64) -> RandomState {
    RandomState::with_seeds(seed, seed ^ SEED_STRIDE, seed.rotate_left(32), !seed)
}

/// Hash a key under an explicit seed.
///
/// The seeded hash behind bucket routing and ordinate derivation,
/// exposed for callers that want to pre-compute routing decisions.
/// Deterministic for a given seed within one build of the crate; not
/// stable across `ahash` versions, which the containers never rely on.
pub fn hash_with_seed<K: Hash + ?Sized>(key: &K, seed: u64) -> u64 {
    hasher_state(seed).hash_one(key)
}

/// Assert the caller half of the weight contract.
///
/// Weights must be nonnegative and finite; violations are caller bugs and
/// fail loudly rather than corrupting cached sums.
#[inline]
pub(crate) fn check_weight(weight: f64) {
    assert!(
        weight >= 0.0 && weight.is_finite(),
        "weight must be finite and nonnegative, got {weight}"
    );
}
