pub(crate) mod decomposition;
pub(crate) mod solve;
pub(crate) mod svd;

pub use decomposition::SvdDecomposition;
pub use solve::svd_solve;
pub use svd::{sort_singular_triplets, svd, svd_in_place, SvdOptions, DEFAULT_MAX_ITERATIONS};

use alloc::vec::Vec;

/// Errors from the decomposition and solver.
///
/// Every failure is terminal for the call that produced it and nothing is
/// retried internally. Numeric outputs never carry sentinel values.
///
/// ```
/// use svdls::{svd, Layout, LinalgError, SvdOptions};
///
/// // 1×3 is below the minimum problem size.
/// let a = [1.0_f64, 2.0, 3.0];
/// let mut s = [0.0; 3];
/// let err = svd(Layout::new(1, 3, 3), &a, &mut s, None, None, &SvdOptions::default());
/// assert_eq!(err, Err(LinalgError::InvalidInput));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinalgError {
    /// Malformed dimensions, a short buffer, or a non-positive tolerance.
    /// Detected before any output is written or any workspace allocated.
    InvalidInput,
    /// The internal workspace could not be allocated. No output was written.
    AllocationFailed,
    /// The singular value at `index` did not settle within the iteration
    /// budget. Values and vectors at indices above `index` are correct.
    NotConverged {
        /// 0-based index of the singular value that failed to converge.
        index: usize,
    },
}

impl core::fmt::Display for LinalgError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LinalgError::InvalidInput => write!(f, "invalid input dimensions, buffers or tolerance"),
            LinalgError::AllocationFailed => write!(f, "could not allocate workspace"),
            LinalgError::NotConverged { index } => {
                write!(f, "singular value {index} did not converge")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LinalgError {}

/// Allocate a zeroed scratch vector of length `len`, reporting exhaustion
/// as `AllocationFailed` instead of aborting.
pub(crate) fn try_alloc_work<T: Copy>(len: usize, zero: T) -> Result<Vec<T>, LinalgError> {
    let mut work = Vec::new();
    work.try_reserve_exact(len).map_err(|_| {
        log::warn!("failed to allocate {len}-element workspace");
        LinalgError::AllocationFailed
    })?;
    work.resize(len, zero);
    Ok(work)
}
