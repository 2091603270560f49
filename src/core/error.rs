//! Error surface shared by every container in the crate.

use thiserror::Error;

/// Failure kinds of the weighted-container contract.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WeightError {
    /// `get` was called for a key that is not present.
    #[error("key not present")]
    NotFound,

    /// `choose` was called with a draw outside `[0, total())`.
    ///
    /// NaN draws fail the range check and land here as well.
    #[error("draw {draw} lies outside [0, {total})")]
    OutOfRange { draw: f64, total: f64 },

    /// A bucketed container was constructed with a bucket count that is
    /// zero or not a power of two.
    #[error("bucket count {0} is not a nonzero power of two")]
    InvalidCapacity(usize),

    /// A cumulative walk exhausted the structure even though the draw was
    /// in range. This signals a violated sum invariant — a bug in the
    /// container, not a caller error.
    #[error("sum walk exhausted the container with {residual} left over")]
    Internal { residual: f64 },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, WeightError>;
