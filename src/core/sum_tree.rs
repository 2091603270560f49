//! Dense segment tree over a fixed-capacity array of weight slots.
//!
//! The tree lives in one flat cell array laid out as a complete binary
//! tree in breadth-first order: cell 1 is the root, cells `2i` and `2i+1`
//! are the children of cell `i`, and the leaves occupy
//! `[offset, offset + capacity)` where `offset` is the smallest power of
//! two at or above the capacity. Internal cells cache the sum of their
//! subtree, so update, choose, and prefix queries are all O(log capacity)
//! and the total is a single root read.

use crate::core::dense::DenseSums;
use crate::core::error::{Result, WeightError};
use crate::core::check_weight;

/// Dense indexed prefix-sum store with logarithmic update and choose.
#[derive(Debug, Clone)]
pub struct SumTree {
    /// Heap-ordered cells; index 0 is unused padding.
    cells: Vec<f64>,
    /// First leaf cell; smallest power of two >= `capacity`.
    offset: usize,
    /// Number of addressable slots.
    capacity: usize,
}

impl SumTree {
    /// Walk from `cell` back to the root, recomputing each ancestor from
    /// both children. Overwriting rather than adding a delta keeps
    /// rounding error bounded at one rounding per ancestor per update.
    fn resum_path(&mut self, mut cell: usize) {
        cell >>= 1;
        while cell >= 1 {
            self.cells[cell] = self.cells[2 * cell] + self.cells[2 * cell + 1];
            cell >>= 1;
        }
    }

    /// Rebuild every internal cell from the leaves, bottom-up.
    fn rebuild(&mut self) {
        for cell in (1..self.offset).rev() {
            self.cells[cell] = self.cells[2 * cell] + self.cells[2 * cell + 1];
        }
    }
}

impl Default for SumTree {
    fn default() -> Self {
        Self::with_capacity(1)
    }
}

impl DenseSums for SumTree {
    fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let offset = capacity.next_power_of_two();
        Self {
            cells: vec![0.0; 2 * offset],
            offset,
            capacity,
        }
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn update(&mut self, slot: usize, weight: f64) {
        assert!(
            slot < self.capacity,
            "slot {slot} out of bounds for capacity {}",
            self.capacity
        );
        check_weight(weight);
        let cell = self.offset + slot;
        self.cells[cell] = weight;
        self.resum_path(cell);
    }

    fn weight(&self, slot: usize) -> f64 {
        assert!(
            slot < self.capacity,
            "slot {slot} out of bounds for capacity {}",
            self.capacity
        );
        self.cells[self.offset + slot]
    }

    fn total(&mut self) -> f64 {
        self.cells[1]
    }

    fn prefix_before(&mut self, slot: usize) -> f64 {
        assert!(
            slot < self.capacity,
            "slot {slot} out of bounds for capacity {}",
            self.capacity
        );
        let mut cell = self.offset + slot;
        let mut before = 0.0;
        while cell > 1 {
            // A right child owes everything under its left sibling.
            if cell & 1 == 1 {
                before += self.cells[cell - 1];
            }
            cell >>= 1;
        }
        before
    }

    fn choose(&mut self, draw: f64) -> Result<(usize, f64)> {
        let total = self.cells[1];
        if !(draw >= 0.0 && draw < total) {
            return Err(WeightError::OutOfRange { draw, total });
        }
        let mut residual = draw;
        let mut cell = 1;
        while cell < self.offset {
            let left = 2 * cell;
            // Strict comparison: a draw equal to the left subtree sum
            // belongs to the right subtree.
            if residual < self.cells[left] {
                cell = left;
            } else {
                residual -= self.cells[left];
                cell = left + 1;
            }
        }
        let slot = cell - self.offset;
        if slot >= self.capacity {
            return Err(WeightError::Internal { residual });
        }
        Ok((slot, self.cells[cell]))
    }

    fn grow(&mut self, min_capacity: usize) {
        if min_capacity <= self.capacity {
            return;
        }
        let mut capacity = self.capacity;
        while capacity < min_capacity {
            capacity *= 2;
        }
        let offset = capacity.next_power_of_two();
        let mut cells = vec![0.0; 2 * offset];
        for slot in 0..self.capacity {
            cells[offset + slot] = self.cells[self.offset + slot];
        }
        self.cells = cells;
        self.offset = offset;
        self.capacity = capacity;
        self.rebuild();
    }

    fn clear(&mut self) {
        self.cells.fill(0.0);
    }
}
