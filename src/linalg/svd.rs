use crate::linalg::{try_alloc_work, LinalgError};
use crate::strided::{Layout, StridedMatrix, StridedMatrixMut};
use crate::traits::{FloatScalar, MatrixMut, MatrixRef};

/// QR sweeps allowed per singular value before giving up.
pub const DEFAULT_MAX_ITERATIONS: usize = 30;

/// Tuning knobs for [`svd`] and [`svd_in_place`].
///
/// ```
/// use svdls::SvdOptions;
///
/// let opts = SvdOptions::default();
/// assert_eq!(opts.max_iterations, 30);
/// assert!(!opts.sort);
///
/// let opts = SvdOptions::new().with_max_iterations(75).sorted(true);
/// assert_eq!(opts.max_iterations, 75);
/// assert!(opts.sort);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SvdOptions {
    /// Implicit-shift QR sweeps allowed for each singular value.
    pub max_iterations: usize,
    /// Sort singular values descending (permuting U and V columns with
    /// them) after a successful run. Off by default: output is unordered.
    pub sort: bool,
}

impl Default for SvdOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            sort: false,
        }
    }
}

impl SvdOptions {
    /// Same as [`SvdOptions::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-value sweep budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Enable or disable the descending sort pass.
    pub fn sorted(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }
}

// ── Householder bidiagonalization ───────────────────────────────────

/// Reduce the m×n working matrix to upper bidiagonal form in place.
///
/// On return:
/// - `w[0..n]` holds the bidiagonal diagonal
/// - `rv1[1..n]` holds the superdiagonal (`rv1[i]` couples `w[i-1]`, `w[i]`);
///   `rv1[0]` is zero
/// - the left Householder vectors sit in the columns of `u` on and below
///   the diagonal, the right ones in the rows of `u` right of the
///   superdiagonal
///
/// Each reflector is built from the column (row) scaled by its L1 norm to
/// keep the sum of squares in range. Returns `anorm`, the largest
/// `|w[i]| + |rv1[i]|`, which sets the scale of the negligibility tests.
pub(crate) fn bidiagonalize<T: FloatScalar>(
    u: &mut impl MatrixMut<T>,
    w: &mut [T],
    rv1: &mut [T],
) -> T {
    let m = u.nrows();
    let n = u.ncols();
    debug_assert!(w.len() >= n && rv1.len() >= n);
    let zero = T::zero();

    let mut g = zero;
    let mut scale = zero;
    let mut anorm = zero;

    for i in 0..n {
        let l = i + 1;
        rv1[i] = scale * g;
        g = zero;
        scale = zero;

        // ── Left reflection: zero u[i+1..m, i] ──
        if i < m {
            for k in i..m {
                scale = scale + u.get(k, i).abs();
            }

            if scale != zero {
                let mut s = zero;
                for k in i..m {
                    let t = *u.get(k, i) / scale;
                    *u.get_mut(k, i) = t;
                    s = s + t * t;
                }

                let f = *u.get(i, i);
                g = -T::sign(s.sqrt(), f);
                let h = f * g - s;
                *u.get_mut(i, i) = f - g;

                for j in l..n {
                    let mut s = zero;
                    for k in i..m {
                        s = s + *u.get(k, i) * *u.get(k, j);
                    }
                    let f = s / h;
                    for k in i..m {
                        let t = *u.get(k, i);
                        *u.get_mut(k, j) = *u.get(k, j) + f * t;
                    }
                }

                for k in i..m {
                    let t = *u.get(k, i);
                    *u.get_mut(k, i) = t * scale;
                }
            }
        }

        w[i] = scale * g;
        g = zero;
        scale = zero;

        // ── Right reflection: zero u[i, i+2..n] ──
        if i < m && l < n {
            for k in l..n {
                scale = scale + u.get(i, k).abs();
            }

            if scale != zero {
                let mut s = zero;
                for k in l..n {
                    let t = *u.get(i, k) / scale;
                    *u.get_mut(i, k) = t;
                    s = s + t * t;
                }

                let f = *u.get(i, l);
                g = -T::sign(s.sqrt(), f);
                let h = f * g - s;
                *u.get_mut(i, l) = f - g;

                for k in l..n {
                    rv1[k] = *u.get(i, k) / h;
                }
                for j in l..m {
                    let mut s = zero;
                    for k in l..n {
                        s = s + *u.get(j, k) * *u.get(i, k);
                    }
                    for k in l..n {
                        *u.get_mut(j, k) = *u.get(j, k) + s * rv1[k];
                    }
                }

                for k in l..n {
                    let t = *u.get(i, k);
                    *u.get_mut(i, k) = t * scale;
                }
            }
        }

        anorm = anorm.max(w[i].abs() + rv1[i].abs());
    }

    anorm
}

// ── Accumulation of the orthogonal factors ──────────────────────────

/// Form V (n×n) as the product of the right reflections left in `u` by
/// [`bidiagonalize`], applying them backwards onto the identity.
pub(crate) fn accumulate_right<T: FloatScalar>(
    u: &impl MatrixRef<T>,
    rv1: &[T],
    v: &mut impl MatrixMut<T>,
) {
    let n = v.nrows();
    let zero = T::zero();
    let mut g = zero;

    for i in (0..n).rev() {
        let l = i + 1;
        if l < n {
            // g = rv1[i + 1] is zero for every row the reduction never
            // reached, so `u` is only read at rows i < m.
            if g != zero {
                // Double division avoids possible underflow.
                for j in l..n {
                    *v.get_mut(j, i) = (*u.get(i, j) / *u.get(i, l)) / g;
                }
                for j in l..n {
                    let mut s = zero;
                    for k in l..n {
                        s = s + *u.get(i, k) * *v.get(k, j);
                    }
                    for k in l..n {
                        let t = *v.get(k, i);
                        *v.get_mut(k, j) = *v.get(k, j) + s * t;
                    }
                }
            }
            for j in l..n {
                *v.get_mut(i, j) = zero;
                *v.get_mut(j, i) = zero;
            }
        }
        *v.get_mut(i, i) = T::one();
        g = rv1[i];
    }
}

/// Overwrite `u` with the product of the left reflections stored in its
/// columns, walking backwards from column `min(m, n) - 1`.
pub(crate) fn accumulate_left<T: FloatScalar>(u: &mut impl MatrixMut<T>, w: &[T]) {
    let m = u.nrows();
    let n = u.ncols();
    let mn = m.min(n);
    let zero = T::zero();

    for i in (0..mn).rev() {
        let l = i + 1;
        let g = w[i];
        for j in l..n {
            *u.get_mut(i, j) = zero;
        }

        if g != zero {
            if l < mn {
                for j in l..n {
                    let mut s = zero;
                    for k in l..m {
                        s = s + *u.get(k, i) * *u.get(k, j);
                    }
                    // Double division avoids possible underflow.
                    let f = (s / *u.get(i, i)) / g;
                    for k in i..m {
                        let t = *u.get(k, i);
                        *u.get_mut(k, j) = *u.get(k, j) + f * t;
                    }
                }
            }
            for j in i..m {
                let t = *u.get(j, i);
                *u.get_mut(j, i) = t / g;
            }
        } else {
            for j in i..m {
                *u.get_mut(j, i) = zero;
            }
        }

        let t = *u.get(i, i);
        *u.get_mut(i, i) = t + T::one();
    }
}

// ── Diagonalization of the bidiagonal form ──────────────────────────

/// Outcome of the splitting test for the trailing index `k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// `rv1[k]` is negligible: `w[k]` has converged.
    Converged,
    /// `w[l - 1]` is negligible: chase `rv1[l]` away before shifting.
    NeedsCancellation(usize),
    /// `rv1[l]` is negligible with `l < k`: run a shifted QR sweep on the
    /// unreduced block `l..=k`.
    NeedsShift(usize),
}

/// Implicit-shift QR on the bidiagonal `(w, rv1)`, with the rotations
/// optionally accumulated into U and V.
pub(crate) struct Diagonalizer<'a, T, U, V> {
    pub(crate) w: &'a mut [T],
    pub(crate) rv1: &'a mut [T],
    pub(crate) anorm: T,
    pub(crate) u: Option<&'a mut U>,
    pub(crate) v: Option<&'a mut V>,
}

impl<T, U, V> Diagonalizer<'_, T, U, V>
where
    T: FloatScalar,
    U: MatrixMut<T>,
    V: MatrixMut<T>,
{
    /// Drive every singular value, from the last one up, to convergence.
    ///
    /// On failure at index `k`, entries `k + 1..n` of `w` (and the matching
    /// columns of U and V) are final.
    pub(crate) fn run(&mut self, max_iterations: usize) -> Result<(), LinalgError> {
        let n = self.w.len();

        for k in (0..n).rev() {
            let mut its = 0;
            loop {
                let l = match self.split_test(k) {
                    Step::Converged => break,
                    Step::NeedsShift(l) => l,
                    Step::NeedsCancellation(l) => {
                        self.cancel(l, k);
                        if l == k {
                            break;
                        }
                        l
                    }
                };

                if its == max_iterations {
                    log::warn!(
                        "singular value {k} not converged after {max_iterations} QR sweeps"
                    );
                    return Err(LinalgError::NotConverged { index: k });
                }
                its += 1;
                self.shift_sweep(l, k);
            }

            self.converge(k);
            log::trace!("singular value {k} converged after {its} QR sweeps");
        }

        Ok(())
    }

    /// Scan upward from `k` for the top of the unreduced block.
    ///
    /// `rv1[0]` is treated as zero, so the scan always terminates.
    pub(crate) fn split_test(&self, k: usize) -> Step {
        let mut l = k;
        loop {
            if l == 0 || T::negligible(self.rv1[l], self.anorm) {
                return if l == k {
                    Step::Converged
                } else {
                    Step::NeedsShift(l)
                };
            }
            if T::negligible(self.w[l - 1], self.anorm) {
                return Step::NeedsCancellation(l);
            }
            l -= 1;
        }
    }

    /// `w[l - 1]` is negligible: rotate rows `l - 1` and `l..=k` to zero
    /// `rv1[l]`, folding the rotations into U.
    pub(crate) fn cancel(&mut self, l: usize, k: usize) {
        debug_assert!(l >= 1);
        let l1 = l - 1;
        let mut c = T::zero();
        let mut s = T::one();

        for i in l..=k {
            let f = s * self.rv1[i];
            self.rv1[i] = c * self.rv1[i];
            if T::negligible(f, self.anorm) {
                break;
            }
            let g = self.w[i];
            let h = f.hypot(g);
            self.w[i] = h;
            c = g / h;
            s = -f / h;
            if let Some(u) = self.u.as_deref_mut() {
                u.rotate_cols(l1, i, c, s);
            }
        }
    }

    /// Make the converged `w[k]` non-negative, flipping V's column with it.
    pub(crate) fn converge(&mut self, k: usize) {
        let z = self.w[k];
        if z < T::zero() {
            self.w[k] = -z;
            if let Some(v) = self.v.as_deref_mut() {
                v.negate_col(k);
            }
        }
    }

    /// One implicit-shift QR sweep over the block `l..=k` (`l < k`), with
    /// the shift taken from the trailing 2×2 minor.
    pub(crate) fn shift_sweep(&mut self, l: usize, k: usize) {
        debug_assert!(l < k);
        let one = T::one();
        let two = one + one;
        let w = &mut *self.w;
        let rv1 = &mut *self.rv1;

        let mut x = w[l];
        let mut y = w[k - 1];
        let mut g = rv1[k - 1];
        let mut h = rv1[k];
        let z = w[k];

        let mut f = ((y - z) * (y + z) + (g - h) * (g + h)) / (two * h * y);
        g = f.hypot(one);
        f = ((x - z) * (x + z) + h * (y / (f + T::sign(g, f)) - h)) / x;

        // Next QR transformation.
        let mut c = one;
        let mut s = one;
        for i1 in l..k {
            let i = i1 + 1;
            g = rv1[i];
            y = w[i];
            h = s * g;
            g = c * g;

            let z = f.hypot(h);
            rv1[i1] = z;
            c = f / z;
            s = h / z;
            f = x * c + g * s;
            g = g * c - x * s;
            h = y * s;
            y = y * c;
            if let Some(v) = self.v.as_deref_mut() {
                v.rotate_cols(i1, i, c, s);
            }

            let z = f.hypot(h);
            w[i1] = z;
            // Rotation can be arbitrary if z is zero.
            if z != T::zero() {
                c = f / z;
                s = h / z;
            }
            f = c * g + s * y;
            x = c * y - s * g;
            if let Some(u) = self.u.as_deref_mut() {
                u.rotate_cols(i1, i, c, s);
            }
        }

        rv1[l] = T::zero();
        rv1[k] = f;
        w[k] = x;
    }
}

// ── Sorting ─────────────────────────────────────────────────────────

/// Selection sort of `w` into descending order, swapping the matching
/// columns of U and V alongside.
pub(crate) fn sort_descending<T, U, V>(w: &mut [T], mut u: Option<&mut U>, mut v: Option<&mut V>)
where
    T: FloatScalar,
    U: MatrixMut<T>,
    V: MatrixMut<T>,
{
    let n = w.len();
    for i in 0..n {
        let mut max_idx = i;
        for j in (i + 1)..n {
            if w[j] > w[max_idx] {
                max_idx = j;
            }
        }
        if max_idx != i {
            w.swap(i, max_idx);
            if let Some(u) = u.as_deref_mut() {
                u.swap_cols(i, max_idx);
            }
            if let Some(v) = v.as_deref_mut() {
                v.swap_cols(i, max_idx);
            }
        }
    }
}

/// Sort a finished decomposition so that `s` is descending, permuting the
/// columns of whichever of U and V are supplied so the triple stays
/// consistent.
///
/// ```
/// use svdls::{sort_singular_triplets, svd, Layout, SvdOptions};
///
/// let layout = Layout::compact(2, 2);
/// let a = [1.0_f64, 0.0, 0.0, 3.0];
/// let (mut s, mut u, mut v) = ([0.0; 2], [0.0; 4], [0.0; 4]);
/// svd(layout, &a, &mut s, Some(&mut u), Some(&mut v), &SvdOptions::default()).unwrap();
/// sort_singular_triplets(layout, &mut s, Some(&mut u), Some(&mut v)).unwrap();
/// assert!((s[0] - 3.0).abs() < 1e-12 && (s[1] - 1.0).abs() < 1e-12);
/// ```
pub fn sort_singular_triplets<T: FloatScalar>(
    layout: Layout,
    s: &mut [T],
    u: Option<&mut [T]>,
    v: Option<&mut [T]>,
) -> Result<(), LinalgError> {
    layout.validate()?;
    let (m, n, ld) = (layout.nrows(), layout.ncols(), layout.leading_dim());
    Layout::check_len("S", s.len(), n)?;
    let mut u = u.map(|u| StridedMatrixMut::new(u, m, n, ld)).transpose()?;
    let mut v = v.map(|v| StridedMatrixMut::new(v, n, n, ld)).transpose()?;
    sort_descending(&mut s[..n], u.as_mut(), v.as_mut());
    Ok(())
}

// ── Public entry points ─────────────────────────────────────────────

/// Singular value decomposition `A = U · diag(S) · Vᵗ` of an m×n matrix.
///
/// - `a` is read only; it holds A at the stride given by `layout`
/// - `s` receives the n non-negative singular values, **unordered** unless
///   [`SvdOptions::sort`] is set
/// - `u`, when supplied, receives U (m×n); otherwise an internal scratch
///   copy of A is used and released before returning
/// - `v`, when supplied, receives V (n×n); otherwise it is not computed
///
/// Index `j` of `s` matches column `j` of U and of V.
///
/// # Errors
///
/// - `InvalidInput` for `m < 2`, `n < 2`, `leading_dim < max(m, n)` or a
///   buffer too short for its block; nothing is written
/// - `AllocationFailed` if the workspace cannot be allocated; nothing is
///   written
/// - `NotConverged { index }` if a value exceeds the sweep budget; entries
///   above `index` (and their U/V columns) are valid
///
/// # Example
///
/// ```
/// use svdls::{svd, Layout, SvdOptions};
///
/// let layout = Layout::compact(3, 2);
/// #[rustfmt::skip]
/// let a = [
///     1.0_f64, 0.0, 0.0,
///     0.0,     2.0, 0.0,
///     0.0,     0.0,
/// ];
/// let mut s = [0.0; 2];
/// let mut u = [0.0; 8];
/// let mut v = [0.0; 5];
/// svd(layout, &a, &mut s, Some(&mut u), Some(&mut v), &SvdOptions::default()).unwrap();
///
/// let mut sorted = s;
/// sorted.sort_by(|x, y| y.partial_cmp(x).unwrap());
/// assert!((sorted[0] - 2.0).abs() < 1e-12);
/// assert!((sorted[1] - 1.0).abs() < 1e-12);
/// ```
pub fn svd<T: FloatScalar>(
    layout: Layout,
    a: &[T],
    s: &mut [T],
    u: Option<&mut [T]>,
    v: Option<&mut [T]>,
    options: &SvdOptions,
) -> Result<(), LinalgError> {
    layout.validate()?;
    let (m, n, ld) = (layout.nrows(), layout.ncols(), layout.leading_dim());
    let a = StridedMatrix::new(a, m, n, ld)?;
    Layout::check_len("S", s.len(), n)?;
    let u = u.map(|u| StridedMatrixMut::new(u, m, n, ld)).transpose()?;
    let v = v.map(|v| StridedMatrixMut::new(v, n, n, ld)).transpose()?;

    let mut rv1 = try_alloc_work(n, T::zero())?;
    match u {
        Some(mut u) => {
            u.copy_from(&a);
            decompose(&mut u, true, &mut s[..n], &mut rv1, v, options)
        }
        None => {
            let mut scratch = try_alloc_work(m * n, T::zero())?;
            let mut u = StridedMatrixMut::new(&mut scratch, m, n, n)?;
            u.copy_from(&a);
            decompose(&mut u, false, &mut s[..n], &mut rv1, v, options)
        }
    }
}

/// In-place variant of [`svd`]: `a` holds A on entry and is overwritten
/// with U when `compute_u` is set, or left with unspecified contents
/// otherwise.
///
/// ```
/// use svdls::{svd_in_place, Layout, SvdOptions};
///
/// let layout = Layout::compact(2, 2);
/// let mut a = [3.0_f64, 2.0, 2.0, 3.0];
/// let mut s = [0.0; 2];
/// svd_in_place(layout, &mut a, &mut s, true, None, &SvdOptions::new().sorted(true)).unwrap();
/// assert!((s[0] - 5.0).abs() < 1e-12);
/// assert!((s[1] - 1.0).abs() < 1e-12);
/// ```
pub fn svd_in_place<T: FloatScalar>(
    layout: Layout,
    a: &mut [T],
    s: &mut [T],
    compute_u: bool,
    v: Option<&mut [T]>,
    options: &SvdOptions,
) -> Result<(), LinalgError> {
    layout.validate()?;
    let (m, n, ld) = (layout.nrows(), layout.ncols(), layout.leading_dim());
    let mut u = StridedMatrixMut::new(a, m, n, ld)?;
    Layout::check_len("S", s.len(), n)?;
    let v = v.map(|v| StridedMatrixMut::new(v, n, n, ld)).transpose()?;

    let mut rv1 = try_alloc_work(n, T::zero())?;
    decompose(&mut u, compute_u, &mut s[..n], &mut rv1, v, options)
}

/// Run all three phases on a working copy of A held in `u`.
fn decompose<T: FloatScalar>(
    u: &mut StridedMatrixMut<'_, T>,
    compute_u: bool,
    w: &mut [T],
    rv1: &mut [T],
    mut v: Option<StridedMatrixMut<'_, T>>,
    options: &SvdOptions,
) -> Result<(), LinalgError> {
    let anorm = bidiagonalize(u, w, rv1);

    if let Some(v) = v.as_mut() {
        accumulate_right(&*u, rv1, v);
    }
    if compute_u {
        accumulate_left(u, w);
    }

    let mut diag = Diagonalizer {
        w: &mut *w,
        rv1,
        anorm,
        u: if compute_u { Some(&mut *u) } else { None },
        v: v.as_mut(),
    };
    diag.run(options.max_iterations)?;

    if options.sort {
        let u = if compute_u { Some(u) } else { None };
        sort_descending(w, u, v.as_mut());
    }
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────
