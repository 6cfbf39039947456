use crate::linalg::{try_alloc_work, LinalgError};
use crate::strided::{Layout, StridedMatrix};
use crate::traits::{FloatScalar, MatrixRef};

/// Solve `A·x = b` from a decomposition `A = U·diag(S)·Vᵗ` by truncated
/// pseudo-inverse: `x = V · diag(1/S[j] or 0) · Uᵗ · b`.
///
/// Components with `S[j] < tolerance` contribute nothing instead of being
/// divided by a near-zero value. The result is the least-squares solution
/// for overdetermined systems and the minimum-norm one for underdetermined
/// or rank-deficient systems.
///
/// `u`, `s`, `v` are typically the output of [`svd`](crate::svd) with the
/// same `layout`. Nothing but `x[0..n]` is written, and `x` is only written
/// once the whole solution is available.
///
/// # Errors
///
/// - `InvalidInput` for a bad layout, a short buffer, or `tolerance <= 0`
///   (including NaN)
/// - `AllocationFailed` if the workspace cannot be allocated
///
/// # Example
///
/// ```
/// use svdls::{svd, svd_solve, Layout, SvdOptions};
///
/// let layout = Layout::compact(3, 3);
/// let a = [2.0_f64, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 4.0];
/// let (mut s, mut u, mut v) = ([0.0; 3], [0.0; 9], [0.0; 9]);
/// svd(layout, &a, &mut s, Some(&mut u), Some(&mut v), &SvdOptions::default()).unwrap();
///
/// let mut x = [0.0; 3];
/// svd_solve(layout, &u, &s, &v, &[2.0, 3.0, 4.0], &mut x, 1e-12).unwrap();
/// for xi in x {
///     assert!((xi - 1.0).abs() < 1e-12);
/// }
/// ```
pub fn svd_solve<T: FloatScalar>(
    layout: Layout,
    u: &[T],
    s: &[T],
    v: &[T],
    b: &[T],
    x: &mut [T],
    tolerance: T,
) -> Result<(), LinalgError> {
    layout.validate()?;
    // Written as a negation so that NaN is rejected too.
    if !(tolerance > T::zero()) {
        log::debug!("rejecting non-positive solve tolerance {tolerance:?}");
        return Err(LinalgError::InvalidInput);
    }
    let (m, n, ld) = (layout.nrows(), layout.ncols(), layout.leading_dim());
    let u = StridedMatrix::new(u, m, n, ld)?;
    let v = StridedMatrix::new(v, n, n, ld)?;
    Layout::check_len("S", s.len(), n)?;
    Layout::check_len("b", b.len(), m)?;
    Layout::check_len("x", x.len(), n)?;

    let mut tv = try_alloc_work(n, T::zero())?;
    let mut xv = try_alloc_work(n, T::zero())?;
    pseudo_inverse_apply(&u, &s[..n], &v, &b[..m], tolerance, &mut tv, &mut xv);
    x[..n].copy_from_slice(&xv);
    Ok(())
}

/// `x = V · diag(1/S[j] or 0) · Uᵗ · b`, with `t` as scratch for `Uᵗ·b`.
pub(crate) fn pseudo_inverse_apply<T: FloatScalar>(
    u: &impl MatrixRef<T>,
    s: &[T],
    v: &impl MatrixRef<T>,
    b: &[T],
    tolerance: T,
    t: &mut [T],
    x: &mut [T],
) {
    let m = u.nrows();
    let n = u.ncols();

    for j in 0..n {
        let mut acc = T::zero();
        // Only significant singular values contribute.
        if s[j] >= tolerance {
            for i in 0..m {
                acc = acc + *u.get(i, j) * b[i];
            }
            acc = acc / s[j];
        }
        t[j] = acc;
    }

    for j in 0..n {
        let mut acc = T::zero();
        for i in 0..n {
            acc = acc + *v.get(j, i) * t[i];
        }
        x[j] = acc;
    }
}
