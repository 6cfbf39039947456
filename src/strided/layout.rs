use crate::linalg::LinalgError;

/// Shape and row stride shared by the A, U and V buffers of one call.
///
/// Storage is row-major with an explicit leading dimension: element
/// `(i, j)` (0-based) lives at `i * leading_dim + j`. The leading dimension
/// may exceed the logical column count, so a matrix can sit inside a larger
/// allocation.
///
/// ```
/// use svdls::Layout;
///
/// let layout = Layout::new(3, 2, 4);
/// assert_eq!(layout.offset(1, 1), 5);
/// assert_eq!(layout.a_len(), 10); // 2 * 4 + 2
/// assert_eq!(layout.v_len(), 6);  // 1 * 4 + 2
/// assert!(layout.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layout {
    nrows: usize,
    ncols: usize,
    leading_dim: usize,
}

impl Layout {
    /// Describe an `nrows × ncols` matrix with row stride `leading_dim`.
    ///
    /// No checks are made here; see [`Layout::validate`].
    #[inline]
    pub const fn new(nrows: usize, ncols: usize, leading_dim: usize) -> Self {
        Self {
            nrows,
            ncols,
            leading_dim,
        }
    }

    /// Smallest valid layout for an `nrows × ncols` problem: the leading
    /// dimension is `max(nrows, ncols)`.
    ///
    /// ```
    /// use svdls::Layout;
    /// assert_eq!(Layout::compact(4, 3).leading_dim(), 4);
    /// assert_eq!(Layout::compact(2, 5).leading_dim(), 5);
    /// ```
    #[inline]
    pub const fn compact(nrows: usize, ncols: usize) -> Self {
        let ld = if nrows > ncols { nrows } else { ncols };
        Self::new(nrows, ncols, ld)
    }

    /// Number of rows `m` of A and U.
    #[inline]
    pub const fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns `n` of A and U, and the order of V.
    #[inline]
    pub const fn ncols(&self) -> usize {
        self.ncols
    }

    /// Row stride shared by A, U and V.
    #[inline]
    pub const fn leading_dim(&self) -> usize {
        self.leading_dim
    }

    /// Flat offset of element `(row, col)`.
    #[inline]
    pub const fn offset(&self, row: usize, col: usize) -> usize {
        row * self.leading_dim + col
    }

    /// Check the shape preconditions shared by decomposition and solve:
    /// `m >= 2`, `n >= 2`, `leading_dim >= max(m, n)`, and that the largest
    /// region addressed by the layout fits in `usize`.
    pub fn validate(&self) -> Result<(), LinalgError> {
        if self.nrows < 2 || self.ncols < 2 {
            log::debug!(
                "rejecting {}x{} problem: both dimensions must be at least 2",
                self.nrows,
                self.ncols
            );
            return Err(LinalgError::InvalidInput);
        }
        if self.leading_dim < self.nrows.max(self.ncols) {
            log::debug!(
                "rejecting leading dimension {} for a {}x{} problem",
                self.leading_dim,
                self.nrows,
                self.ncols
            );
            return Err(LinalgError::InvalidInput);
        }
        let rows = self.nrows.max(self.ncols);
        if self.checked_len(rows, self.ncols).is_none() {
            log::debug!("rejecting layout whose extent overflows usize");
            return Err(LinalgError::InvalidInput);
        }
        Ok(())
    }

    /// Minimum buffer length holding a `rows × cols` block at this stride.
    ///
    /// Only meaningful for layouts that passed [`Layout::validate`].
    #[inline]
    pub fn required_len(&self, rows: usize, cols: usize) -> usize {
        self.checked_len(rows, cols).unwrap_or(usize::MAX)
    }

    /// Minimum length of the A and U buffers (`m × n`).
    #[inline]
    pub fn a_len(&self) -> usize {
        self.required_len(self.nrows, self.ncols)
    }

    /// Minimum length of the V buffer (`n × n`).
    #[inline]
    pub fn v_len(&self) -> usize {
        self.required_len(self.ncols, self.ncols)
    }

    fn checked_len(&self, rows: usize, cols: usize) -> Option<usize> {
        if rows == 0 || cols == 0 {
            return Some(0);
        }
        (rows - 1)
            .checked_mul(self.leading_dim)?
            .checked_add(cols)
    }

    /// Reject a buffer shorter than `needed`.
    pub(crate) fn check_len(what: &str, len: usize, needed: usize) -> Result<(), LinalgError> {
        if len < needed {
            log::debug!("rejecting {what} buffer: length {len}, need at least {needed}");
            return Err(LinalgError::InvalidInput);
        }
        Ok(())
    }
}
