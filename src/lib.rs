//! Propensity - keyed weighted-sampling containers
//!
//! Containers for the hot loop of Gillespie-family stochastic simulation:
//! a mutable collection of keyed nonnegative weights (propensities) that
//! can answer "draw a key with probability proportional to its weight" in
//! O(log n) while absorbing constant insert/erase/update churn.
//!
//! All containers share the [`WeightTable`] contract; they differ in how
//! they trade update cost, choose cost, and memory under churn:
//!
//! - [`SlotMap`] / [`PinnedSlotMap`] - a keyed face over a dense prefix
//!   store ([`SumTree`] or [`CumSum`]), recycling or pinning slots.
//! - [`BucketMap`] - hashed two-level: a fixed outer tree over bucket
//!   totals, tiny keyed containers inside.
//! - [`TreapMap`] - randomized BST over hashed ordinates with subtree
//!   sums.
//! - [`SumTrie`] - crit-bit tree over 128-bit hashed ordinates with
//!   cached sums.
//!
//! ```
//! use propensity::{draw, SlotMap, WeightTable};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut propensities: SlotMap<&str> = SlotMap::new();
//! propensities.set("birth", 2.5);
//! propensities.set("death", 1.0);
//! propensities.set("migration", 0.25);
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(1);
//! let (reaction, rate) = draw(&mut propensities, &mut rng).unwrap();
//! assert!(propensities.has(&reaction));
//! assert!(rate > 0.0);
//! ```
//!
//! Containers are single-threaded state: effects take place in call
//! order, and nothing blocks or suspends. Use one container per
//! simulation thread.

#![allow(clippy::redundant_pub_crate)]

pub mod core;

#[cfg(test)]
mod proptests;

pub use crate::core::{
    draw, BucketMap, CumSum, DenseSums, PinnedSlotMap, Result, SlotMap, SumTree, SumTrie,
    TreapMap, WeightError, WeightTable,
};
