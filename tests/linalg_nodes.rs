//! Integration tests for matrix operations and decompositions

mod common;

use common::{assert_rows_close, real_dense, scalar};
use lindag::container::{Complex64, Terminal};
use lindag::dispatch::{to_real_array, to_terminal};
use lindag::error::Error;
use lindag::graph::build::{
    ctranspose, inv, lu, mldivide, mtimes, norm2, pinv, qr, sumcols, sumrows, svd, terminal,
    transpose,
};
use lindag::graph::Tag;

#[test]
fn svd_reconstruction_is_maths_equal_to_the_input() {
    let a = real_dense(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);
    let f = svd(&a);

    // U * S * V^T via result-view accessors and matrix-multiply composition
    let reconstructed = mtimes(&mtimes(&f.u(), &f.s()), &f.vt());
    let back = to_terminal(&reconstructed).unwrap();
    let original = to_terminal(&a).unwrap();
    assert!(back.maths_equals_with(&original, 1e-14, 1e-14));

    // S materializes as a diagonal with descending entries
    let s = to_terminal(&f.s()).unwrap();
    assert_eq!(s.tag(), Tag::RealDiagonalMatrix);
    let s_rows = to_real_array(&f.s()).unwrap();
    assert!(s_rows[0][0] >= s_rows[1][1]);
}

#[test]
fn lu_and_qr_reconstruct_their_input() {
    let a = real_dense(&[4.0, 3.0, 2.0, 6.0, 3.0, 1.0, 8.0, 2.0, 9.0], 3, 3);
    let original = to_terminal(&a).unwrap();

    let f = lu(&a);
    let back = to_terminal(&mtimes(&f.l(), &f.u())).unwrap();
    assert!(back.maths_equals_with(&original, 1e-12, 1e-12));

    let f = qr(&a);
    let back = to_terminal(&mtimes(&f.q(), &f.r())).unwrap();
    assert!(back.maths_equals_with(&original, 1e-12, 1e-12));

    // Q is orthogonal: Q^T Q == I
    let qtq = to_real_array(&mtimes(&transpose(&f.q()), &f.q())).unwrap();
    assert_rows_close(
        &qtq,
        &[
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ],
        1e-12,
        "Q^T Q",
    );
}

#[test]
fn inverse_and_left_division_solve_systems() {
    let a = real_dense(&[4.0, 7.0, 2.0, 6.0], 2, 2);

    let eye = to_real_array(&mtimes(&a, &inv(&a))).unwrap();
    assert_rows_close(&eye, &[vec![1.0, 0.0], vec![0.0, 1.0]], 1e-12, "A inv(A)");

    // square solve
    let b = real_dense(&[1.0, 2.0], 2, 1);
    let x = mldivide(&a, &b);
    let ax = to_real_array(&mtimes(&a, &x)).unwrap();
    assert_rows_close(&ax, &[vec![1.0], vec![2.0]], 1e-12, "A x = b");

    // least squares: y = 2t + 1 sampled exactly
    let t = real_dense(&[1.0, 1.0, 2.0, 1.0, 3.0, 1.0, 4.0, 1.0], 4, 2);
    let y = real_dense(&[3.0, 5.0, 7.0, 9.0], 4, 1);
    let coeffs = to_real_array(&mldivide(&t, &y)).unwrap();
    assert_rows_close(&coeffs, &[vec![2.0], vec![1.0]], 1e-10, "least squares");
}

#[test]
fn singular_systems_fail_with_computation_errors() {
    let a = real_dense(&[1.0, 2.0, 2.0, 4.0], 2, 2);
    let b = real_dense(&[1.0, 1.0], 2, 1);
    let err = to_real_array(&mldivide(&a, &b)).unwrap_err();
    assert!(matches!(err, Error::NativeComputation { .. }));
    assert!(err.to_string().contains("singular"));

    let err = to_real_array(&inv(&a)).unwrap_err();
    assert!(matches!(err, Error::NativeComputation { .. }));
}

#[test]
fn pinv_inverts_tall_matrices_from_the_left() {
    let a = real_dense(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);
    let pa = to_real_array(&mtimes(&pinv(&a), &a)).unwrap();
    assert_rows_close(&pa, &[vec![1.0, 0.0], vec![0.0, 1.0]], 1e-10, "pinv(A) A");
}

#[test]
fn norm2_follows_vector_and_matrix_conventions() {
    let v = real_dense(&[3.0, 4.0], 1, 2);
    let out = to_real_array(&norm2(&v)).unwrap();
    assert_rows_close(&out, &[vec![5.0]], 1e-12, "vector norm");

    let s = scalar(-2.0);
    let out = to_real_array(&norm2(&s)).unwrap();
    assert_rows_close(&out, &[vec![2.0]], 1e-12, "scalar norm");

    // the matrix 2-norm is the largest singular value
    let m = real_dense(&[3.0, 0.0, 0.0, -2.0], 2, 2);
    let out = to_real_array(&norm2(&m)).unwrap();
    assert_rows_close(&out, &[vec![3.0]], 1e-10, "matrix norm");
}

#[test]
fn transpose_and_conjugate_transpose() {
    let a = real_dense(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
    let t = to_real_array(&transpose(&a)).unwrap();
    assert_eq!(t, vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]);

    // real ctranspose is plain transpose
    let ct = to_real_array(&ctranspose(&a)).unwrap();
    assert_eq!(ct, t);

    // complex ctranspose conjugates
    let z = terminal(
        Terminal::complex_dense(
            vec![Complex64::new(1.0, 2.0), Complex64::new(3.0, -4.0)],
            1,
            2,
        )
        .unwrap(),
    );
    let parts = lindag::dispatch::to_complex_parts(&ctranspose(&z)).unwrap();
    assert_eq!(parts.real(), &[vec![1.0], vec![3.0]]);
    assert_eq!(parts.imag(), &[vec![-2.0], vec![4.0]]);
}

#[test]
fn row_and_column_sums() {
    let a = real_dense(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
    assert_eq!(
        to_real_array(&sumcols(&a)).unwrap(),
        vec![vec![5.0, 7.0, 9.0]]
    );
    assert_eq!(
        to_real_array(&sumrows(&a)).unwrap(),
        vec![vec![6.0], vec![15.0]]
    );
}

#[test]
fn mtimes_respects_shapes_and_scalars() {
    let a = real_dense(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
    let b = real_dense(&[7.0, 8.0, 9.0, 10.0, 11.0, 12.0], 3, 2);
    let out = to_real_array(&mtimes(&a, &b)).unwrap();
    assert_eq!(out, vec![vec![58.0, 64.0], vec![139.0, 154.0]]);

    // scalar scaling through the matrix-multiply node
    let scaled = to_real_array(&mtimes(&scalar(2.0), &a)).unwrap();
    assert_eq!(scaled[0], vec![2.0, 4.0, 6.0]);

    // inner dimension mismatch
    let err = to_real_array(&mtimes(&a, &a)).unwrap_err();
    assert!(matches!(err, Error::NativeComputation { .. }));
}

#[test]
fn complex_decompositions_are_reported_as_computation_failures() {
    let z = terminal(
        Terminal::complex_dense(
            vec![
                Complex64::new(1.0, 1.0),
                Complex64::new(2.0, 0.0),
                Complex64::new(0.0, -1.0),
                Complex64::new(3.0, 2.0),
            ],
            2,
            2,
        )
        .unwrap(),
    );
    let err = to_terminal(&svd(&z).u()).unwrap_err();
    assert!(matches!(err, Error::NativeComputation { .. }));

    // complex square systems still solve through LU
    let b = terminal(
        Terminal::complex_dense(
            vec![Complex64::new(1.0, 0.0), Complex64::new(0.0, 1.0)],
            2,
            1,
        )
        .unwrap(),
    );
    let x = mldivide(&z, &b);
    let back = lindag::dispatch::to_complex_parts(&mtimes(&z, &x)).unwrap();
    assert!((back.real()[0][0] - 1.0).abs() < 1e-12);
    assert!(back.imag()[0][0].abs() < 1e-12);
    assert!(back.real()[1][0].abs() < 1e-12);
    assert!((back.imag()[1][0] - 1.0).abs() < 1e-12);
}

#[test]
fn projections_can_be_taken_directly_by_index() {
    let a = real_dense(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);
    let view = lindag::graph::result::ResultView::new(svd(&a).node().clone()).unwrap();
    let u = to_terminal(&view.get(0).unwrap()).unwrap();
    assert_eq!(u.shape(), (3, 2));
    let s = to_terminal(&view.get(1).unwrap()).unwrap();
    assert_eq!(s.shape(), (2, 2));
    let vt = to_terminal(&view.get(2).unwrap()).unwrap();
    assert_eq!(vt.shape(), (2, 2));
}
