use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use svdls::{sort_singular_triplets, svd, svd_in_place, Layout, LinalgError, SvdOptions};

/// Fills the padding columns so stray writes show up.
const SENTINEL: f64 = 1234.5;

fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
    assert!(
        (a - b).abs() < tol,
        "{}: {} vs {} (diff {})",
        msg,
        a,
        b,
        (a - b).abs()
    );
}

/// Random m×n matrix at `layout`, padding set to `SENTINEL`.
fn random_matrix(rng: &mut StdRng, layout: Layout) -> Vec<f64> {
    let mut a = vec![SENTINEL; layout.a_len()];
    for i in 0..layout.nrows() {
        for j in 0..layout.ncols() {
            a[layout.offset(i, j)] = rng.gen_range(-1.0..1.0);
        }
    }
    a
}

struct Full {
    s: Vec<f64>,
    u: Vec<f64>,
    v: Vec<f64>,
}

fn full_svd(layout: Layout, a: &[f64], opts: &SvdOptions) -> Full {
    let mut s = vec![0.0; layout.ncols()];
    let mut u = vec![SENTINEL; layout.a_len()];
    let mut v = vec![SENTINEL; layout.v_len()];
    svd(layout, a, &mut s, Some(&mut u), Some(&mut v), opts).unwrap();
    Full { s, u, v }
}

fn frobenius(layout: Layout, a: &[f64]) -> f64 {
    let mut sum = 0.0;
    for i in 0..layout.nrows() {
        for j in 0..layout.ncols() {
            sum += a[layout.offset(i, j)].powi(2);
        }
    }
    sum.sqrt()
}

fn check_reconstruction(layout: Layout, a: &[f64], f: &Full) {
    let (m, n) = (layout.nrows(), layout.ncols());
    let tol = 1e-13 * frobenius(layout, a).max(1.0) * (m.max(n) as f64);
    for i in 0..m {
        for j in 0..n {
            let mut sum = 0.0;
            for k in 0..n {
                sum += f.u[layout.offset(i, k)] * f.s[k] * f.v[layout.offset(j, k)];
            }
            assert_near(sum, a[layout.offset(i, j)], tol, &format!("UΣVᵗ[({},{})]", i, j));
        }
    }
}

fn check_orthonormal_cols(layout: Layout, buf: &[f64], rows: usize, tol: f64, name: &str) {
    let n = layout.ncols();
    for p in 0..n {
        for q in 0..n {
            let dot: f64 = (0..rows)
                .map(|r| buf[layout.offset(r, p)] * buf[layout.offset(r, q)])
                .sum();
            let expected = if p == q { 1.0 } else { 0.0 };
            assert_near(dot, expected, tol, &format!("{}ᵗ{}[({},{})]", name, name, p, q));
        }
    }
}

fn check_padding(layout: Layout, buf: &[f64], rows: usize) {
    for i in 0..rows {
        for j in layout.ncols()..layout.leading_dim() {
            let idx = layout.offset(i, j);
            if idx < buf.len() {
                assert_eq!(buf[idx], SENTINEL, "padding at ({}, {}) overwritten", i, j);
            }
        }
    }
}

const SHAPES: [(usize, usize); 8] = [
    (2, 2),
    (3, 3),
    (5, 3),
    (3, 5),
    (6, 6),
    (10, 7),
    (7, 10),
    (2, 9),
];

#[test]
fn random_reconstruction_and_orthogonality() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for &(m, n) in &SHAPES {
        // Extra stride exercises matrices embedded in wider buffers.
        let layout = Layout::new(m, n, m.max(n) + 2);
        let a = random_matrix(&mut rng, layout);
        let a_before = a.clone();
        let f = full_svd(layout, &a, &SvdOptions::default());

        assert_eq!(a, a_before, "input mutated for {}x{}", m, n);
        assert!(f.s.iter().all(|&s| s >= 0.0), "negative σ for {}x{}", m, n);
        check_reconstruction(layout, &a, &f);
        check_orthonormal_cols(layout, &f.v, n, 1e-12, "V");
        if m >= n {
            check_orthonormal_cols(layout, &f.u, m, 1e-12, "U");
        }
        check_padding(layout, &f.u, m);
        check_padding(layout, &f.v, n);
    }
}

#[test]
fn singular_values_match_nalgebra() {
    let mut rng = StdRng::seed_from_u64(42);
    for &(m, n) in &SHAPES {
        let layout = Layout::compact(m, n);
        let a = random_matrix(&mut rng, layout);
        let mut s = vec![0.0; n];
        svd(layout, &a, &mut s, None, None, &SvdOptions::default()).unwrap();
        s.sort_by(|x, y| y.partial_cmp(x).unwrap());

        let dense = nalgebra::DMatrix::from_fn(m, n, |i, j| a[layout.offset(i, j)]);
        let mut expected: Vec<f64> = dense.singular_values().iter().copied().collect();
        expected.sort_by(|x, y| y.partial_cmp(x).unwrap());

        for (k, want) in expected.iter().enumerate() {
            assert_near(s[k], *want, 1e-12, &format!("σ[{}] of {}x{}", k, m, n));
        }
        // A wide matrix has at most m nonzero singular values.
        for (k, extra) in s.iter().enumerate().skip(expected.len()) {
            assert!(extra.abs() < 1e-12, "σ[{}] of {}x{} should vanish", k, m, n);
        }
    }
}

#[test]
fn in_place_matches_out_of_place() {
    let mut rng = StdRng::seed_from_u64(7);
    let layout = Layout::new(5, 4, 6);
    let a = random_matrix(&mut rng, layout);
    let f = full_svd(layout, &a, &SvdOptions::default());

    let mut a_u = a.clone();
    let mut s = vec![0.0; 4];
    let mut v = vec![SENTINEL; layout.v_len()];
    svd_in_place(layout, &mut a_u, &mut s, true, Some(&mut v), &SvdOptions::default()).unwrap();

    assert_eq!(s, f.s);
    assert_eq!(a_u, f.u);
    assert_eq!(v, f.v);
}

#[test]
fn values_only_paths_agree() {
    let mut rng = StdRng::seed_from_u64(11);
    let layout = Layout::compact(6, 4);
    let a = random_matrix(&mut rng, layout);
    let f = full_svd(layout, &a, &SvdOptions::default());

    let mut s_scratch = vec![0.0; 4];
    svd(layout, &a, &mut s_scratch, None, None, &SvdOptions::default()).unwrap();

    let mut a_copy = a.clone();
    let mut s_in_place = vec![0.0; 4];
    svd_in_place(layout, &mut a_copy, &mut s_in_place, false, None, &SvdOptions::default())
        .unwrap();

    // The rotations applied to U and V never feed back into the values.
    assert_eq!(s_scratch, f.s);
    assert_eq!(s_in_place, f.s);
}

#[test]
fn rejects_bad_shapes_without_touching_buffers() {
    let cases = [
        Layout::new(1, 3, 3),
        Layout::new(3, 1, 3),
        Layout::new(1, 1, 1),
        Layout::new(3, 2, 2),
        Layout::new(2, 3, 2),
    ];
    for layout in cases {
        let a = vec![1.0; 16];
        let mut s = vec![SENTINEL; 4];
        let mut u = vec![SENTINEL; 16];
        let mut v = vec![SENTINEL; 16];
        let res = svd(layout, &a, &mut s, Some(&mut u), Some(&mut v), &SvdOptions::default());
        assert_eq!(res, Err(LinalgError::InvalidInput), "{:?}", layout);
        assert!(s.iter().chain(&u).chain(&v).all(|&x| x == SENTINEL));
    }
}

#[test]
fn rejects_short_buffers_without_touching_others() {
    let layout = Layout::compact(3, 3);
    let a = vec![1.0; 9];
    let opts = SvdOptions::default();

    let mut s = vec![SENTINEL; 2];
    let mut u = vec![SENTINEL; 9];
    let res = svd(layout, &a, &mut s, Some(&mut u), None, &opts);
    assert_eq!(res, Err(LinalgError::InvalidInput));
    assert!(u.iter().all(|&x| x == SENTINEL));

    let mut s = vec![SENTINEL; 3];
    let mut v = vec![SENTINEL; 8];
    let res = svd(layout, &a, &mut s, Some(&mut u), Some(&mut v), &opts);
    assert_eq!(res, Err(LinalgError::InvalidInput));
    assert!(s.iter().chain(&u).chain(&v).all(|&x| x == SENTINEL));

    let res = svd(layout, &a[..8], &mut s, None, None, &opts);
    assert_eq!(res, Err(LinalgError::InvalidInput));

    let mut short = vec![SENTINEL; 8];
    let res = svd_in_place(layout, &mut short, &mut s, true, None, &opts);
    assert_eq!(res, Err(LinalgError::InvalidInput));
    assert!(short.iter().all(|&x| x == SENTINEL));
}

#[test]
fn non_convergence_keeps_trailing_values() {
    // Block diagonal: the trailing 2×2 diagonal block decouples during the
    // reduction and settles without a sweep, the leading 2×2 block does not.
    let layout = Layout::new(4, 4, 5);
    #[rustfmt::skip]
    let dense = [
        1.0, 2.0, 0.0, 0.0,
        3.0, 4.0, 0.0, 0.0,
        0.0, 0.0, 6.0, 0.0,
        0.0, 0.0, 0.0, -7.0,
    ];
    let mut a = vec![0.0; layout.a_len()];
    for i in 0..4 {
        for j in 0..4 {
            a[layout.offset(i, j)] = dense[i * 4 + j];
        }
    }
    let mut s = vec![0.0; 4];
    let mut u = vec![0.0; layout.a_len()];
    let mut v = vec![0.0; layout.v_len()];
    let opts = SvdOptions::new().with_max_iterations(0);
    let err = svd(layout, &a, &mut s, Some(&mut u), Some(&mut v), &opts).unwrap_err();
    assert_eq!(err, LinalgError::NotConverged { index: 1 });

    assert_near(s[2], 6.0, 1e-12, "σ[2]");
    assert_near(s[3], 7.0, 1e-12, "σ[3]");
    // The settled triplets are usable: u_kᵗ A v_k = σ_k.
    for k in 2..4 {
        let mut dot = 0.0;
        for r in 0..4 {
            for c in 0..4 {
                dot += u[layout.offset(r, k)] * dense[r * 4 + c] * v[layout.offset(c, k)];
            }
        }
        assert_near(dot, s[k], 1e-12, &format!("u_kᵗ A v_k for k = {}", k));
    }

    // With the default budget the same input converges.
    let f = full_svd(layout, &a, &SvdOptions::default());
    check_reconstruction(layout, &a, &f);
}

#[test]
fn nan_input_reports_non_convergence() {
    let layout = Layout::compact(3, 3);
    let mut a = vec![1.0; 9];
    a[0] = f64::NAN;
    let mut s = vec![0.0; 3];
    let res = svd(layout, &a, &mut s, None, None, &SvdOptions::default());
    assert_eq!(res, Err(LinalgError::NotConverged { index: 2 }));
}

#[test]
fn sorted_triplets_stay_consistent() {
    let mut rng = StdRng::seed_from_u64(99);
    let layout = Layout::new(7, 5, 8);
    let a = random_matrix(&mut rng, layout);

    let sorted = full_svd(layout, &a, &SvdOptions::new().sorted(true));
    assert!(sorted.s.windows(2).all(|w| w[0] >= w[1]));
    check_reconstruction(layout, &a, &sorted);

    // Sorting after the fact gives the same triple as sorting inside.
    let mut f = full_svd(layout, &a, &SvdOptions::default());
    sort_singular_triplets(layout, &mut f.s, Some(&mut f.u), Some(&mut f.v)).unwrap();
    assert_eq!(f.s, sorted.s);
    assert_eq!(f.u, sorted.u);
    assert_eq!(f.v, sorted.v);

    let mut short = vec![0.0; 4];
    assert_eq!(
        sort_singular_triplets::<f64>(layout, &mut short, None, None),
        Err(LinalgError::InvalidInput)
    );
}

#[test]
fn single_precision() {
    let layout = Layout::compact(3, 2);
    let a = [1.0_f32, 2.0, 0.0, 3.0, 4.0, 0.0, 5.0, 6.0];
    let mut s = [0.0_f32; 2];
    let mut u = [0.0_f32; 8];
    let mut v = [0.0_f32; 5];
    svd(layout, &a, &mut s, Some(&mut u), Some(&mut v), &SvdOptions::new().sorted(true)).unwrap();
    // AᵗA = [[35, 44], [44, 56]]
    let tr = 91.0_f32;
    let det = 35.0_f32 * 56.0 - 44.0 * 44.0;
    let disc = (tr * tr - 4.0 * det).sqrt();
    assert!((s[0] - ((tr + disc) / 2.0).sqrt()).abs() < 1e-4);
    assert!((s[1] - ((tr - disc) / 2.0).sqrt()).abs() < 1e-4);
}
