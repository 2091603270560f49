//! Keyed weighted-container contract and the sampler hook.

use rand::Rng;

use crate::core::error::{Result, WeightError};

/// A mutable map from keys to nonnegative weights supporting weighted
/// choice in time sub-linear in the number of keys.
///
/// Semantics shared by every implementation:
///
/// - `set` inserts or updates; a weight of zero keeps the key present but
///   unreachable from `choose`.
/// - `erase` is idempotent and a no-op for absent keys.
/// - `total` is the floating-point sum of live weights, O(1) after any
///   lazy maintenance (hence `&mut self`).
/// - `choose(draw)` for `draw ∈ [0, total())` returns the unique key
///   owning that position on the cumulative weight line, under an
///   ordering fixed by the container; out-of-range draws (including NaN)
///   error rather than clamp.
/// - Effects take place in call order; `total` and `choose` reflect
///   exactly the `set`/`erase` calls that returned before them.
pub trait WeightTable<K> {
    /// Insert `key` or update its weight in place.
    ///
    /// # Panics
    ///
    /// Panics if the weight is negative, NaN, or infinite.
    fn set(&mut self, key: K, weight: f64);

    /// Current weight of `key`, or [`WeightError::NotFound`].
    fn get(&self, key: &K) -> Result<f64>;

    /// Whether `key` is present (a zero weight still counts as present).
    fn has(&self, key: &K) -> bool {
        self.get(key).is_ok()
    }

    /// Remove `key` if present.
    fn erase(&mut self, key: &K);

    /// Sum of all live weights.
    fn total(&mut self) -> f64;

    /// Resolve a draw on the cumulative weight line to `(key, weight)`.
    fn choose(&mut self, draw: f64) -> Result<(K, f64)>;

    /// Number of live keys.
    fn len(&self) -> usize;

    /// Iterate over live `(key, weight)` pairs in the container's own
    /// (unspecified) order.
    fn iter<'a>(&'a self) -> impl Iterator<Item = (&'a K, f64)> + 'a
    where
        K: 'a;

    /// Whether no keys are live.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every key, returning the container to its empty state.
    fn clear(&mut self);
}

/// Draw a key with probability proportional to its weight.
///
/// Samples `u` uniformly from `[0, total())` and resolves it through
/// [`WeightTable::choose`]. Errors with [`WeightError::OutOfRange`] when
/// the table is empty or all weights are zero.
pub fn draw<K, T, R>(table: &mut T, rng: &mut R) -> Result<(K, f64)>
where
    T: WeightTable<K>,
    R: Rng + ?Sized,
{
    let total = table.total();
    if total <= 0.0 {
        return Err(WeightError::OutOfRange { draw: 0.0, total });
    }
    table.choose(rng.gen_range(0.0..total))
}
