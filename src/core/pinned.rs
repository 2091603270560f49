//! Keyed wrapper over a dense store that pins a slot to each key.
//!
//! `PinnedSlotMap` never recycles a slot: once a key has been seen, its
//! slot belongs to it for the container's lifetime. Erasure zeroes the
//! slot and marks the key dead; a later `set` of the same key revives the
//! same slot. This wastes slots under open-ended key churn but avoids all
//! free-list traffic when the same key population cycles in and out, the
//! usual shape of a reaction network whose channels switch on and off.

use std::collections::HashMap;
use std::hash::Hash;

use crate::core::check_weight;
use crate::core::dense::DenseSums;
use crate::core::error::{Result, WeightError};
use crate::core::sum_tree::SumTree;
use crate::core::table::WeightTable;

#[derive(Debug, Clone)]
struct Pin {
    slot: usize,
    live: bool,
}

/// Keyed weighted container whose keys keep their slots forever.
#[derive(Debug, Clone)]
pub struct PinnedSlotMap<K, S = SumTree> {
    dense: S,
    pins: HashMap<K, Pin>,
    /// Slot → key, append-only.
    key_at: Vec<K>,
    live: usize,
}

impl<K, S> PinnedSlotMap<K, S>
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
            pins: HashMap::new(),
            key_at: Vec::new(),
            live: 0,
        }
    }

    /// Number of slots held, live or dead.
    #[must_use]
    pub fn pinned_slots(&self) -> usize {
        self.key_at.len()
    }

}

impl<K, S> Default for PinnedSlotMap<K, S>
where
    K: Eq + Hash + Clone,
    S: DenseSums,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S> WeightTable<K> for PinnedSlotMap<K, S>
where
    K: Eq + Hash + Clone,
    S: DenseSums,
{
    fn set(&mut self, key: K, weight: f64) {
        check_weight(weight);
        if let Some(pin) = self.pins.get_mut(&key) {
            if !pin.live {
                pin.live = true;
                self.live += 1;
            }
            self.dense.update(pin.slot, weight);
            return;
        }
        let slot = self.key_at.len();
        self.key_at.push(key.clone());
        if slot >= self.dense.capacity() {
            self.dense.grow(slot + 1);
        }
        self.pins.insert(key, Pin { slot, live: true });
        self.live += 1;
        self.dense.update(slot, weight);
    }

    fn get(&self, key: &K) -> Result<f64> {
        match self.pins.get(key) {
            Some(pin) if pin.live => Ok(self.dense.weight(pin.slot)),
            _ => Err(WeightError::NotFound),
        }
    }

    fn erase(&mut self, key: &K) {
        if let Some(pin) = self.pins.get_mut(key) {
            if pin.live {
                pin.live = false;
                self.live -= 1;
                self.dense.update(pin.slot, 0.0);
            }
        }
    }

    fn total(&mut self) -> f64 {
        self.dense.total()
    }

    fn choose(&mut self, draw: f64) -> Result<(K, f64)> {
        // Dead slots hold weight zero, so a valid draw always lands on a
        // live key.
        let (slot, weight) = self.dense.choose(draw)?;
        Ok((self.key_at[slot].clone(), weight))
    }

    fn len(&self) -> usize {
        self.live
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = (&'a K, f64)> + 'a
    where
        K: 'a,
    {
        self.pins
            .iter()
            .filter(|(_, pin)| pin.live)
            .map(move |(key, pin)| (key, self.dense.weight(pin.slot)))
    }

    fn clear(&mut self) {
        self.dense.clear();
        self.pins.clear();
        self.key_at.clear();
        self.live = 0;
    }
}
