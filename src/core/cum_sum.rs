//! Lazy cumulative-sum array.
//!
//! Keeps raw weights and their running prefix sums side by side, with a
//! dirty watermark marking how far the prefixes are stale. Updates are
//! O(1) writes; the first read-side operation after a burst of updates
//! pays one pass from the watermark to the end. Choose is then a binary
//! search. The sweet spot is a small, update-heavy collection — the inner
//! buckets of a hashed two-level container, for instance — where many
//! writes land between consecutive draws.

use crate::core::check_weight;
use crate::core::dense::DenseSums;
use crate::core::error::{Result, WeightError};

/// Dense indexed prefix-sum store with O(1) updates and lazy refresh.
#[derive(Debug, Clone)]
pub struct CumSum {
    /// Raw slot weights.
    vals: Vec<f64>,
    /// `cums[j]` = sum of `vals[..=j]`, valid below `dirty_from`.
    cums: Vec<f64>,
    /// First index whose prefix sum is stale; `vals.len()` when clean.
    dirty_from: usize,
}

impl CumSum {
    /// Recompute the stale tail of the prefix array.
    fn refresh(&mut self) {
        let n = self.vals.len();
        if self.dirty_from >= n {
            return;
        }
        let mut run = if self.dirty_from == 0 {
            0.0
        } else {
            self.cums[self.dirty_from - 1]
        };
        for j in self.dirty_from..n {
            run += self.vals[j];
            self.cums[j] = run;
        }
        self.dirty_from = n;
    }
}

impl Default for CumSum {
    fn default() -> Self {
        Self::with_capacity(1)
    }
}

impl DenseSums for CumSum {
    fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            vals: vec![0.0; capacity],
            cums: vec![0.0; capacity],
            dirty_from: capacity,
        }
    }

    fn capacity(&self) -> usize {
        self.vals.len()
    }

    fn update(&mut self, slot: usize, weight: f64) {
        assert!(
            slot < self.vals.len(),
            "slot {slot} out of bounds for capacity {}",
            self.vals.len()
        );
        check_weight(weight);
        self.vals[slot] = weight;
        self.dirty_from = self.dirty_from.min(slot);
    }

    fn weight(&self, slot: usize) -> f64 {
        assert!(
            slot < self.vals.len(),
            "slot {slot} out of bounds for capacity {}",
            self.vals.len()
        );
        self.vals[slot]
    }

    fn total(&mut self) -> f64 {
        self.refresh();
        self.cums.last().copied().unwrap_or(0.0)
    }

    fn prefix_before(&mut self, slot: usize) -> f64 {
        assert!(
            slot < self.vals.len(),
            "slot {slot} out of bounds for capacity {}",
            self.vals.len()
        );
        self.refresh();
        if slot == 0 {
            0.0
        } else {
            self.cums[slot - 1]
        }
    }

    fn choose(&mut self, draw: f64) -> Result<(usize, f64)> {
        let total = self.total();
        if !(draw >= 0.0 && draw < total) {
            return Err(WeightError::OutOfRange { draw, total });
        }
        // First slot whose cumulative sum exceeds the draw. Zero-weight
        // slots leave the running sum unchanged and so are never hit.
        let slot = self.cums.partition_point(|&c| c <= draw);
        if slot >= self.vals.len() {
            return Err(WeightError::Internal {
                residual: draw - total,
            });
        }
        Ok((slot, self.vals[slot]))
    }

    fn grow(&mut self, min_capacity: usize) {
        if min_capacity <= self.vals.len() {
            return;
        }
        let mut capacity = self.vals.len();
        while capacity < min_capacity {
            capacity *= 2;
        }
        // New slots carry weight zero; the stale region is unchanged.
        self.vals.resize(capacity, 0.0);
        let tail = self.cums.last().copied().unwrap_or(0.0);
        self.cums.resize(capacity, tail);
        self.dirty_from = self.dirty_from.min(capacity);
    }

    fn clear(&mut self) {
        self.vals.fill(0.0);
        self.cums.fill(0.0);
        self.dirty_from = self.vals.len();
    }
}
