use alloc::vec::Vec;
use num_traits::NumCast;

use crate::linalg::solve::svd_solve;
use crate::linalg::svd::{svd_in_place, SvdOptions};
use crate::linalg::{try_alloc_work, LinalgError};
use crate::strided::{Layout, StridedMatrix, StridedMatrixMut};
use crate::traits::{FloatScalar, MatrixRef};

/// Owned singular value decomposition `A = U · diag(S) · Vᵗ`.
///
/// Holds U (m×n), S (n) and V (n×n) in buffers laid out with
/// [`Layout::compact`], so one decomposition can serve any number of
/// [`solve`](SvdDecomposition::solve) calls.
///
/// # Example
///
/// ```
/// use svdls::{Layout, SvdDecomposition};
///
/// // Least-squares line through (0, 1), (1, 2), (2, 4), (3, 3).
/// let a = [1.0_f64, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0];
/// let svd = SvdDecomposition::new(Layout::new(4, 2, 2), &a);
/// // The leading dimension must cover the row count too.
/// assert!(svd.is_err());
///
/// let layout = Layout::compact(4, 2);
/// let a = [1.0_f64, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 2.0, 0.0, 0.0, 1.0, 3.0];
/// let svd = SvdDecomposition::new(layout, &a).unwrap();
/// let x = svd.solve(&[1.0, 2.0, 4.0, 3.0], svd.default_tolerance()).unwrap();
/// assert!((x[0] - 1.3).abs() < 1e-12);
/// assert!((x[1] - 0.8).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct SvdDecomposition<T> {
    layout: Layout,
    u: Vec<T>,
    singular_values: Vec<T>,
    v: Vec<T>,
}

impl<T: FloatScalar> SvdDecomposition<T> {
    /// Decompose the matrix held in `a` at `layout`.
    pub fn new(layout: Layout, a: &[T]) -> Result<Self, LinalgError> {
        Self::with_options(layout, a, &SvdOptions::default())
    }

    /// Decompose with explicit [`SvdOptions`].
    ///
    /// A `NotConverged` failure discards the partial result; use
    /// [`svd`](crate::svd) directly to keep it.
    pub fn with_options(
        layout: Layout,
        a: &[T],
        options: &SvdOptions,
    ) -> Result<Self, LinalgError> {
        layout.validate()?;
        let (m, n) = (layout.nrows(), layout.ncols());
        let src = StridedMatrix::new(a, m, n, layout.leading_dim())?;

        let own = Layout::compact(m, n);
        let zero = T::zero();
        let mut u = try_alloc_work(own.a_len(), zero)?;
        let mut singular_values = try_alloc_work(n, zero)?;
        let mut v = try_alloc_work(own.v_len(), zero)?;

        StridedMatrixMut::new(&mut u, m, n, own.leading_dim())?.copy_from(&src);
        svd_in_place(own, &mut u, &mut singular_values, true, Some(&mut v), options)?;

        Ok(Self {
            layout: own,
            u,
            singular_values,
            v,
        })
    }

    /// Layout of the owned U and V buffers.
    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Row count `m` of the decomposed matrix.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.layout.nrows()
    }

    /// Column count `n` of the decomposed matrix.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.layout.ncols()
    }

    /// The n singular values, in the order the decomposition produced them.
    #[inline]
    pub fn singular_values(&self) -> &[T] {
        &self.singular_values
    }

    /// Left singular vectors U (m×n); column `j` pairs with `S[j]`.
    #[inline]
    pub fn u(&self) -> StridedMatrix<'_, T> {
        let l = self.layout;
        StridedMatrix::from_parts(&self.u, l.nrows(), l.ncols(), l.leading_dim())
    }

    /// Right singular vectors V (n×n); column `j` pairs with `S[j]`.
    #[inline]
    pub fn v(&self) -> StridedMatrix<'_, T> {
        let l = self.layout;
        StridedMatrix::from_parts(&self.v, l.ncols(), l.ncols(), l.leading_dim())
    }

    /// Least-squares / minimum-norm solution of `A·x = b`, ignoring
    /// singular values below `tolerance`. See [`svd_solve`].
    pub fn solve(&self, b: &[T], tolerance: T) -> Result<Vec<T>, LinalgError> {
        let mut x = try_alloc_work(self.ncols(), T::zero())?;
        svd_solve(
            self.layout,
            &self.u,
            &self.singular_values,
            &self.v,
            b,
            &mut x,
            tolerance,
        )?;
        Ok(x)
    }

    /// Largest singular value (zero for the zero matrix).
    pub fn max_singular_value(&self) -> T {
        self.singular_values
            .iter()
            .fold(T::zero(), |acc, &s| acc.max(s))
    }

    /// Usual numerical-rank cutoff `max(m, n) · ε · max(S)`.
    ///
    /// Falls back to the smallest positive normal number for the zero
    /// matrix so the result is always a valid solve tolerance.
    pub fn default_tolerance(&self) -> T {
        let dim = <T as NumCast>::from(self.nrows().max(self.ncols())).unwrap_or_else(T::max_value);
        let tol = dim * T::epsilon() * self.max_singular_value();
        if tol > T::zero() {
            tol
        } else {
            T::min_positive_value()
        }
    }

    /// Number of singular values `>= tolerance` (the ones [`solve`] keeps).
    ///
    /// [`solve`]: SvdDecomposition::solve
    pub fn rank(&self, tolerance: T) -> usize {
        self.singular_values.iter().filter(|&&s| s >= tolerance).count()
    }

    /// Condition number `max(S) / min(S)`; infinite when `min(S)` is zero.
    pub fn condition_number(&self) -> T {
        let s_min = self
            .singular_values
            .iter()
            .fold(T::infinity(), |acc, &s| acc.min(s));
        if s_min == T::zero() {
            T::infinity()
        } else {
            self.max_singular_value() / s_min
        }
    }

    /// Dense row-major `U · diag(S) · Vᵗ` (m×n, stride n).
    pub fn reconstruct(&self) -> Result<Vec<T>, LinalgError> {
        let (m, n) = (self.nrows(), self.ncols());
        let u = self.u();
        let v = self.v();
        let mut out = try_alloc_work(m * n, T::zero())?;
        for i in 0..m {
            for j in 0..n {
                let mut sum = T::zero();
                for k in 0..n {
                    sum = sum + *u.get(i, k) * self.singular_values[k] * *v.get(j, k);
                }
                out[i * n + j] = sum;
            }
        }
        Ok(out)
    }
}
