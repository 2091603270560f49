//! Contract for dense, slot-indexed prefix-sum stores.

use crate::core::error::Result;

/// A fixed-capacity array of nonnegative weights with cached partial sums.
///
/// Slots are dense integers in `[0, capacity())`. Implementations keep
/// enough aggregate state to answer [`choose`](DenseSums::choose) in time
/// sub-linear in the capacity; how eagerly they maintain it is up to them,
/// which is why the read-side operations take `&mut self` — a lazy store
/// refreshes its aggregates on first read.
///
/// Choice contract: for `draw ∈ [0, total())`, `choose(draw)` returns the
/// unique slot `i` with `prefix_before(i) <= draw < prefix_before(i) + w_i`
/// under ascending slot order. The descent comparison is strict, so a draw
/// equal to a left-hand subtree sum resolves to the right: zero-weight
/// slots are never returned.
pub trait DenseSums {
    /// Create a store with room for at least `capacity` slots.
    fn with_capacity(capacity: usize) -> Self;

    /// Number of addressable slots.
    fn capacity(&self) -> usize;

    /// Overwrite the weight at `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= capacity()` or the weight is negative, NaN, or
    /// infinite.
    fn update(&mut self, slot: usize, weight: f64);

    /// Read back the weight at `slot`.
    fn weight(&self, slot: usize) -> f64;

    /// Sum of all slot weights.
    fn total(&mut self) -> f64;

    /// Sum of the weights of all slots strictly before `slot`.
    fn prefix_before(&mut self, slot: usize) -> f64;

    /// Find the slot owning position `draw` in the cumulative weight line.
    fn choose(&mut self, draw: f64) -> Result<(usize, f64)>;

    /// Ensure capacity for at least `min_capacity` slots, growing by
    /// doubling. Never shrinks.
    fn grow(&mut self, min_capacity: usize);

    /// Reset every slot to weight zero.
    fn clear(&mut self);
}
