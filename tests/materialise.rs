//! Integration tests for the materialization entry points

mod common;

use common::{assert_rows_close, real_dense, scalar};
use lindag::container::{Complex64, Terminal};
use lindag::dispatch::{to_boolean, to_complex_parts, to_real_array, to_terminal};
use lindag::error::Error;
use lindag::graph::build::{copy, exp, minus, negate, plus, sin, terminal, times};

#[test]
fn round_trip_for_every_concrete_variant() {
    let variants = [
        Terminal::real_scalar(2.5),
        Terminal::complex_scalar(1.5, -0.5),
        Terminal::integer_scalar(7),
        Terminal::real_dense(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap(),
        Terminal::complex_dense(
            vec![
                Complex64::new(1.0, 1.0),
                Complex64::new(2.0, -2.0),
                Complex64::new(3.0, 3.0),
                Complex64::new(4.0, -4.0),
            ],
            2,
            2,
        )
        .unwrap(),
        Terminal::real_sparse(3, 3, &[(0, 1, 4.0), (2, 0, -2.0)]).unwrap(),
        Terminal::complex_sparse(2, 2, &[(0, 0, Complex64::new(1.0, 2.0))]).unwrap(),
        Terminal::real_diagonal(vec![1.0, 2.0, 3.0], 3, 3).unwrap(),
        Terminal::complex_diagonal(vec![Complex64::new(0.0, 1.0)], 2, 2).unwrap(),
        Terminal::logical(vec![1, 0, 1, 1], 2, 2).unwrap(),
    ];
    for t in variants {
        let once = to_terminal(&terminal(t.clone())).unwrap();
        let twice = to_terminal(&terminal(once)).unwrap();
        assert!(
            twice.fuzzy_equals(&t),
            "round trip changed {:?}",
            t.tag().name()
        );
    }
}

#[test]
fn repeated_materialization_is_idempotent() {
    let a = real_dense(&[1.0, 2.0, 3.0, 4.0], 2, 2);
    let graph = times(&plus(&a, &scalar(1.0)), &a);
    let first = to_terminal(&graph).unwrap();
    for _ in 0..5 {
        let again = to_terminal(&graph).unwrap();
        assert!(again.fuzzy_equals(&first));
    }
}

#[test]
fn long_left_folded_chain_sums_within_tolerance() {
    // plus(plus(...plus(x1, x2)...), x499) over 499 terms
    let mut chain = scalar(1.0);
    for i in 2..=499 {
        chain = plus(&chain, &scalar(f64::from(i)));
    }
    let out = to_real_array(&chain).unwrap();
    let expected = f64::from(499 * 500 / 2);
    assert_rows_close(&out, &[vec![expected]], 1e-9, "chain sum");
}

#[test]
fn shared_node_referenced_twice_by_its_final_parent() {
    // A = RealDense(4x3 ints 1..12), B = ComplexSparse
    let a = real_dense(
        &[
            1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0,
        ],
        4,
        3,
    );
    let b = terminal(
        Terminal::complex_sparse(
            4,
            3,
            &[
                (0, 0, Complex64::new(1.0, 2.0)),
                (2, 1, Complex64::new(-3.0, 0.5)),
            ],
        )
        .unwrap(),
    );

    // C = copy(A); C = minus(B, C); C = plus(A, C); C = plus(C, C)
    let c = copy(&a);
    let c = minus(&b, &c);
    let c = plus(&a, &c);
    let c = plus(&c, &c);

    let result = to_terminal(&c).unwrap();
    // expected: 2 * (A + (B - A)) = 2 * B
    let parts = to_complex_parts(&terminal(result)).unwrap();
    assert!(parts.any_imaginary());
    assert_eq!(parts.real()[0][0], 2.0);
    assert_eq!(parts.imag()[0][0], 4.0);
    assert_eq!(parts.real()[2][1], -6.0);
    assert_eq!(parts.imag()[2][1], 1.0);
    assert_eq!(parts.real()[3][2], 0.0);
}

#[test]
fn to_real_array_returns_rectangular_rows() {
    let a = real_dense(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
    let out = to_real_array(&plus(&a, &scalar(10.0))).unwrap();
    assert_eq!(out, vec![vec![11.0, 12.0, 13.0], vec![14.0, 15.0, 16.0]]);
}

#[test]
fn to_real_array_rejects_results_with_imaginary_components() {
    let z = terminal(Terminal::complex_scalar(1.0, 2.0));
    let err = to_real_array(&copy(&z)).unwrap_err();
    assert!(matches!(err, Error::NativeComputation { .. }));

    // complex-domain values whose imaginary part is exactly zero pass
    let z0 = terminal(Terminal::complex_scalar(3.0, 0.0));
    let out = to_real_array(&copy(&z0)).unwrap();
    assert_eq!(out, vec![vec![3.0]]);
}

#[test]
fn to_complex_parts_scans_every_cell_for_the_flag() {
    let z = terminal(
        Terminal::complex_dense(
            vec![
                Complex64::new(1.0, 0.0),
                Complex64::new(2.0, -0.0),
                Complex64::new(3.0, 0.0),
                Complex64::new(4.0, 0.0),
            ],
            2,
            2,
        )
        .unwrap(),
    );
    let parts = to_complex_parts(&copy(&z)).unwrap();
    assert!(!parts.any_imaginary()); // signed zero is still zero
    assert_eq!(parts.real(), &[vec![1.0, 2.0], vec![3.0, 4.0]]);

    let real_graph = real_dense(&[1.0, 2.0], 1, 2);
    let parts = to_complex_parts(&real_graph).unwrap();
    assert!(!parts.any_imaginary());
    assert_eq!(parts.imag(), &[vec![0.0, 0.0]]);
}

#[test]
fn complex_elementwise_arithmetic_round_trips() {
    let z = terminal(Terminal::complex_scalar(1.0, 2.0));
    let w = terminal(Terminal::complex_scalar(3.0, -1.0));
    let parts = to_complex_parts(&times(&z, &w)).unwrap();
    // (1 + 2i)(3 - i) = 5 + 5i
    assert_eq!(parts.real()[0][0], 5.0);
    assert_eq!(parts.imag()[0][0], 5.0);
    assert!(parts.any_imaginary());
}

#[test]
fn to_boolean_requires_a_one_by_one_real_result() {
    assert!(to_boolean(&scalar(1.0)).unwrap());
    assert!(to_boolean(&scalar(-2.5)).unwrap());
    assert!(!to_boolean(&scalar(0.0)).unwrap());
    assert!(!to_boolean(&terminal(Terminal::logical(vec![0], 1, 1).unwrap())).unwrap());

    let m = real_dense(&[1.0, 2.0], 1, 2);
    assert!(matches!(
        to_boolean(&m),
        Err(Error::NativeComputation { .. })
    ));
}

#[test]
fn elementwise_transforms_apply_cell_by_cell() {
    let a = real_dense(&[0.0, 1.0], 1, 2);
    let out = to_real_array(&exp(&a)).unwrap();
    assert_rows_close(&out, &[vec![1.0, std::f64::consts::E]], 1e-12, "exp");

    let out = to_real_array(&negate(&sin(&a))).unwrap();
    assert_rows_close(&out, &[vec![0.0, -(1.0f64.sin())]], 1e-12, "negate sin");
}

#[test]
fn non_conformant_shapes_fail_with_computation_errors() {
    let a = real_dense(&[1.0, 2.0], 1, 2);
    let b = real_dense(&[1.0, 2.0, 3.0], 1, 3);
    let err = to_real_array(&plus(&a, &b)).unwrap_err();
    assert!(matches!(err, Error::NativeComputation { .. }));
    // the message survives the boundary translation
    assert!(err.to_string().contains("conform"));
}

#[test]
fn sparse_and_diagonal_operands_widen_in_arithmetic() {
    let sparse = terminal(Terminal::real_sparse(2, 2, &[(0, 0, 1.0), (1, 1, 2.0)]).unwrap());
    let diag = terminal(Terminal::real_diagonal(vec![1.0, 2.0], 2, 2).unwrap());
    let out = to_real_array(&minus(&sparse, &diag)).unwrap();
    assert_eq!(out, vec![vec![0.0, 0.0], vec![0.0, 0.0]]);
}
