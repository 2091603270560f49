//! Keyed wrapper over a dense store that recycles vacated slots.
//!
//! `SlotMap` gives any [`DenseSums`] store a keyed face: a `key → slot`
//! map routes updates to the dense array, a parallel `slot → key` array
//! resolves choices back to keys, and a free-slot stack recycles the slots
//! of erased keys in LIFO order. Under balanced insert/erase churn the
//! slot range stays bounded by the peak number of simultaneously live
//! keys.

use std::collections::HashMap;
use std::hash::Hash;

use crate::core::check_weight;
use crate::core::dense::DenseSums;
use crate::core::error::{Result, WeightError};
use crate::core::sum_tree::SumTree;
use crate::core::table::WeightTable;

/// Keyed weighted container that reuses the slots of erased keys.
#[derive(Debug, Clone)]
pub struct SlotMap<K, S = SumTree> {
    dense: S,
    slot_of: HashMap<K, usize>,
    /// Reverse map; `None` marks a vacated slot.
    key_at: Vec<Option<K>>,
    /// Vacated slots, reused last-in-first-out.
    free: Vec<usize>,
}

impl<K, S> SlotMap<K, S>
where
    K: Eq + Hash + Clone,
    S: DenseSums,
{
    /// Create an empty map with a minimal dense store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(1)
    }

    /// Create an empty map whose dense store has room for `capacity` keys.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            dense: S::with_capacity(capacity),
            slot_of: HashMap::new(),
            key_at: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Number of slots ever allocated (the high-water mark). Bounded by
    /// the peak number of simultaneously live keys.
    #[must_use]
    pub fn allocated_slots(&self) -> usize {
        self.key_at.len()
    }

    /// Pop a recycled slot or open a fresh one past the high-water mark.
    fn take_slot(&mut self) -> usize {
        if let Some(slot) = self.free.pop() {
            return slot;
        }
        let slot = self.key_at.len();
        self.key_at.push(None);
        if slot >= self.dense.capacity() {
            self.dense.grow(slot + 1);
        }
        slot
    }
}

impl<K, S> Default for SlotMap<K, S>
where
    K: Eq + Hash + Clone,
    S: DenseSums,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S> WeightTable<K> for SlotMap<K, S>
where
    K: Eq + Hash + Clone,
    S: DenseSums,
{
    fn set(&mut self, key: K, weight: f64) {
        check_weight(weight);
        if let Some(&slot) = self.slot_of.get(&key) {
            self.dense.update(slot, weight);
            return;
        }
        let slot = self.take_slot();
        self.key_at[slot] = Some(key.clone());
        self.slot_of.insert(key, slot);
        self.dense.update(slot, weight);
    }

    fn get(&self, key: &K) -> Result<f64> {
        self.slot_of
            .get(key)
            .map(|&slot| self.dense.weight(slot))
            .ok_or(WeightError::NotFound)
    }

    fn erase(&mut self, key: &K) {
        if let Some(slot) = self.slot_of.remove(key) {
            self.dense.update(slot, 0.0);
            self.key_at[slot] = None;
            self.free.push(slot);
        }
    }

    fn total(&mut self) -> f64 {
        self.dense.total()
    }

    fn choose(&mut self, draw: f64) -> Result<(K, f64)> {
        let (slot, weight) = self.dense.choose(draw)?;
        match &self.key_at[slot] {
            Some(key) => Ok((key.clone(), weight)),
            // A vacated slot holds weight zero and is unreachable from a
            // valid draw; landing here means a sum invariant broke.
            None => Err(WeightError::Internal { residual: draw }),
        }
    }

    fn len(&self) -> usize {
        self.slot_of.len()
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = (&'a K, f64)> + 'a
    where
        K: 'a,
    {
        self.slot_of
            .iter()
            .map(move |(key, &slot)| (key, self.dense.weight(slot)))
    }

    fn clear(&mut self) {
        self.dense.clear();
        self.slot_of.clear();
        self.key_at.clear();
        self.free.clear();
    }
}
