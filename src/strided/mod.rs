mod layout;

pub use layout::Layout;

use core::ops::{Index, IndexMut};

use crate::linalg::LinalgError;
use crate::traits::{MatrixMut, MatrixRef};

/// Borrowed read-only view of a row-major matrix with an explicit row stride.
///
/// # Example
///
/// ```
/// use svdls::StridedMatrix;
///
/// // 2×2 block embedded in a buffer with row stride 3.
/// let buf = [1.0_f64, 2.0, -1.0, 3.0, 4.0, -1.0];
/// let m = StridedMatrix::new(&buf, 2, 2, 3).unwrap();
/// assert_eq!(m[(1, 0)], 3.0);
/// assert_eq!(m.row(1), &[3.0, 4.0]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StridedMatrix<'a, T> {
    data: &'a [T],
    nrows: usize,
    ncols: usize,
    stride: usize,
}

impl<'a, T> StridedMatrix<'a, T> {
    /// Wrap `data` as an `nrows × ncols` matrix with row stride `stride`.
    ///
    /// Returns `InvalidInput` if `stride < ncols` or the buffer is too short.
    pub fn new(
        data: &'a [T],
        nrows: usize,
        ncols: usize,
        stride: usize,
    ) -> Result<Self, LinalgError> {
        check_extent(data.len(), nrows, ncols, stride)?;
        Ok(Self {
            data,
            nrows,
            ncols,
            stride,
        })
    }

    /// Wrap a buffer already known to cover the block.
    #[inline]
    pub(crate) fn from_parts(data: &'a [T], nrows: usize, ncols: usize, stride: usize) -> Self {
        debug_assert!(check_extent(data.len(), nrows, ncols, stride).is_ok());
        Self {
            data,
            nrows,
            ncols,
            stride,
        }
    }

    /// Row `i` as a contiguous slice of `ncols` elements.
    #[inline]
    pub fn row(&self, i: usize) -> &'a [T] {
        let start = i * self.stride;
        &self.data[start..start + self.ncols]
    }

    /// Row stride of the underlying buffer.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }
}

/// Borrowed mutable view of a row-major matrix with an explicit row stride.
///
/// Elements outside the logical `nrows × ncols` block (the padding between
/// `ncols` and `stride`) are never touched.
#[derive(Debug)]
pub struct StridedMatrixMut<'a, T> {
    data: &'a mut [T],
    nrows: usize,
    ncols: usize,
    stride: usize,
}

impl<'a, T> StridedMatrixMut<'a, T> {
    /// Wrap `data` as an `nrows × ncols` matrix with row stride `stride`.
    ///
    /// Returns `InvalidInput` if `stride < ncols` or the buffer is too short.
    pub fn new(
        data: &'a mut [T],
        nrows: usize,
        ncols: usize,
        stride: usize,
    ) -> Result<Self, LinalgError> {
        check_extent(data.len(), nrows, ncols, stride)?;
        Ok(Self {
            data,
            nrows,
            ncols,
            stride,
        })
    }

    /// Reborrow as a read-only view.
    #[inline]
    pub fn as_view(&self) -> StridedMatrix<'_, T> {
        StridedMatrix {
            data: &*self.data,
            nrows: self.nrows,
            ncols: self.ncols,
            stride: self.stride,
        }
    }

    /// Row `i` as a contiguous mutable slice of `ncols` elements.
    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [T] {
        let start = i * self.stride;
        &mut self.data[start..start + self.ncols]
    }

    /// Copy the logical block of `src` (same shape) into `self`.
    pub(crate) fn copy_from(&mut self, src: &StridedMatrix<'_, T>)
    where
        T: Copy,
    {
        debug_assert_eq!((self.nrows, self.ncols), (src.nrows, src.ncols));
        for i in 0..self.nrows {
            self.row_mut(i).copy_from_slice(src.row(i));
        }
    }
}

fn check_extent(len: usize, nrows: usize, ncols: usize, stride: usize) -> Result<(), LinalgError> {
    if stride < ncols {
        return Err(LinalgError::InvalidInput);
    }
    let needed = if nrows == 0 || ncols == 0 {
        0
    } else {
        (nrows - 1)
            .checked_mul(stride)
            .and_then(|x| x.checked_add(ncols))
            .ok_or(LinalgError::InvalidInput)?
    };
    Layout::check_len("matrix", len, needed)
}

// ── Trait impls ─────────────────────────────────────────────────────

impl<T> MatrixRef<T> for StridedMatrix<'_, T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> &T {
        debug_assert!(row < self.nrows && col < self.ncols);
        &self.data[row * self.stride + col]
    }
}

impl<T> MatrixRef<T> for StridedMatrixMut<'_, T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> &T {
        debug_assert!(row < self.nrows && col < self.ncols);
        &self.data[row * self.stride + col]
    }
}

impl<T> MatrixMut<T> for StridedMatrixMut<'_, T> {
    #[inline]
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        debug_assert!(row < self.nrows && col < self.ncols);
        &mut self.data[row * self.stride + col]
    }
}

impl<T> Index<(usize, usize)> for StridedMatrix<'_, T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        self.get(row, col)
    }
}

impl<T> Index<(usize, usize)> for StridedMatrixMut<'_, T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        self.get(row, col)
    }
}

impl<T> IndexMut<(usize, usize)> for StridedMatrixMut<'_, T> {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        self.get_mut(row, col)
    }
}
