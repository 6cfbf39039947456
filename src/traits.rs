use core::fmt::Debug;
use num_traits::Float;

/// Trait for floating-point matrix elements.
///
/// Blanket-implemented for every `Float + Debug` type, which covers `f32`
/// and `f64`. The decomposition and solver are written against this bound;
/// `f64` is the primary target.
pub trait FloatScalar: Float + Debug {
    /// `|a|` carrying the sign of `b` (`b == 0` counts as positive).
    #[inline]
    fn sign(a: Self, b: Self) -> Self {
        if b >= Self::zero() {
            a.abs()
        } else {
            -a.abs()
        }
    }

    /// `true` when `x` vanishes relative to `norm` at working precision,
    /// i.e. `|x| + norm` rounds back to `norm`.
    #[inline]
    fn negligible(x: Self, norm: Self) -> bool {
        x.abs() + norm == norm
    }
}

impl<T: Float + Debug> FloatScalar for T {}

/// Read-only access to a matrix-like type.
///
/// Lets the decomposition phases run over strided caller buffers and
/// internal dense scratch alike.
pub trait MatrixRef<T> {
    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
    fn get(&self, row: usize, col: usize) -> &T;
}

/// Mutable access to a matrix-like type.
///
/// Extends `MatrixRef` with mutable element access, enabling
/// the in-place reductions and rotation sweeps to work generically.
pub trait MatrixMut<T>: MatrixRef<T> {
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T;

    /// Apply the plane rotation `[c s; -s c]` to columns `p` and `q`:
    /// `col_p ← c·col_p + s·col_q`, `col_q ← c·col_q − s·col_p`.
    fn rotate_cols(&mut self, p: usize, q: usize, c: T, s: T)
    where
        T: FloatScalar,
    {
        for row in 0..self.nrows() {
            let x = *self.get(row, p);
            let y = *self.get(row, q);
            *self.get_mut(row, p) = x * c + y * s;
            *self.get_mut(row, q) = y * c - x * s;
        }
    }

    /// Negate every entry of column `col`.
    fn negate_col(&mut self, col: usize)
    where
        T: FloatScalar,
    {
        for row in 0..self.nrows() {
            let x = *self.get(row, col);
            *self.get_mut(row, col) = -x;
        }
    }

    /// Exchange columns `p` and `q`.
    fn swap_cols(&mut self, p: usize, q: usize)
    where
        T: Copy,
    {
        if p == q {
            return;
        }
        for row in 0..self.nrows() {
            let tmp = *self.get(row, p);
            *self.get_mut(row, p) = *self.get(row, q);
            *self.get_mut(row, q) = tmp;
        }
    }
}
