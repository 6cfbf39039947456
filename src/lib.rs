//! # svdls
//!
//! Singular value decomposition and least-squares solving over caller-owned,
//! row-major buffers. `no_std` compatible (needs `alloc` for the `O(n)`
//! workspace).
//!
//! The decomposition is the Golub–Reinsch algorithm: Householder reduction
//! to bidiagonal form, backward accumulation of the orthogonal factors, then
//! implicit-shift QR on the bidiagonal with a per-value sweep budget. The
//! solver applies the truncated pseudo-inverse of a finished decomposition
//! to any number of right-hand sides.
//!
//! ## Quick start
//!
//! ```
//! use svdls::{svd, svd_solve, Layout, SvdOptions};
//!
//! // Solve A x = b for a 3×3 system.
//! let layout = Layout::compact(3, 3);
//! let a = [
//!     2.0_f64, 1.0, -1.0,
//!     -3.0, -1.0, 2.0,
//!     -2.0, 1.0, 2.0,
//! ];
//! let mut s = [0.0; 3];
//! let mut u = [0.0; 9];
//! let mut v = [0.0; 9];
//! svd(layout, &a, &mut s, Some(&mut u), Some(&mut v), &SvdOptions::default()).unwrap();
//!
//! let mut x = [0.0; 3];
//! svd_solve(layout, &u, &s, &v, &[8.0, -11.0, -3.0], &mut x, 1e-12).unwrap();
//! assert!((x[0] - 2.0).abs() < 1e-10);
//! assert!((x[1] - 3.0).abs() < 1e-10);
//! assert!((x[2] + 1.0).abs() < 1e-10);
//! ```
//!
//! ## Modules
//!
//! - [`strided`]: [`Layout`] (rows, columns, leading dimension) and the
//!   borrowed [`StridedMatrix`] / [`StridedMatrixMut`] views. Element
//!   `(i, j)` lives at `i * leading_dim + j`, so a matrix may be embedded in
//!   a larger allocation. A, U and V share one layout per call.
//!
//! - [`linalg`]: [`svd`], [`svd_in_place`] (A overwritten by U),
//!   [`svd_solve`], [`sort_singular_triplets`] and the owned
//!   [`SvdDecomposition`] wrapper. Singular values come back non-negative
//!   and unordered unless [`SvdOptions::sort`] is set.
//!
//! - [`traits`]: [`FloatScalar`] (`f32`, `f64`) and the
//!   [`MatrixRef`] / [`MatrixMut`] access traits the phases run over.
//!
//! ## Errors
//!
//! Every entry point returns `Result<_, LinalgError>`: `InvalidInput`
//! (caught before anything is written), `AllocationFailed`, or
//! `NotConverged { index }`, after which values above `index` are still
//! valid in the caller's buffers.
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade: rejected
//! inputs at `debug`, per-value convergence at `trace`, non-convergence at
//! `warn`. Nothing is printed unless the host installs a logger.
//!
//! ## Cargo features
//!
//! | Feature | Default  | Description |
//! |---------|----------|-------------|
//! | `std`   | yes      | Hardware FPU via system libm, `std::error::Error` for `LinalgError` |
//! | `libm`  | baseline | Pure-Rust software float fallback |

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod linalg;
pub mod strided;
pub mod traits;

pub use linalg::{
    sort_singular_triplets, svd, svd_in_place, svd_solve, LinalgError, SvdDecomposition,
    SvdOptions, DEFAULT_MAX_ITERATIONS,
};
pub use strided::{Layout, StridedMatrix, StridedMatrixMut};
pub use traits::{FloatScalar, MatrixMut, MatrixRef};
