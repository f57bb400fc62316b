//! Integration tests for the expression node model

mod common;

use common::{real_dense, scalar};
use lindag::container::Terminal;
use lindag::error::Error;
use lindag::graph::build::{mtimes, plus, sin, svd, terminal};
use lindag::graph::result::ResultView;
use lindag::graph::{select_result, Expression, Tag};
use std::sync::Arc;

#[test]
fn empty_argument_lists_fail_for_every_arity() {
    for tag in [Tag::Sin, Tag::Plus, Tag::Svd, Tag::Mtimes, Tag::SelectResult] {
        let err = Expression::new(tag, vec![]).unwrap_err();
        assert!(
            matches!(err, Error::InvalidArgument { .. }),
            "{} accepted an empty argument list",
            tag.name()
        );
    }
}

#[test]
fn arity_mismatches_fail() {
    let a = scalar(1.0);
    let b = scalar(2.0);
    // unary op with two arguments
    let err = Expression::new(Tag::Sin, vec![a.clone(), b.clone()]).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
    // binary op with one argument
    let err = Expression::new(Tag::Plus, vec![a.clone()]).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
}

#[test]
fn container_tags_are_not_operations() {
    let a = scalar(1.0);
    let err = Expression::new(Tag::RealDenseMatrix, vec![a]).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
}

#[test]
fn argument_reads_are_bounds_checked() {
    let a = scalar(1.0);
    let b = scalar(2.0);
    let e = Expression::new(Tag::Plus, vec![a.clone(), b]).unwrap();
    assert_eq!(e.tag(), Tag::Plus);
    assert_eq!(e.arg_count(), 2);
    assert!(Arc::ptr_eq(e.arg(0).unwrap(), &a));
    assert!(matches!(e.arg(2), Err(Error::InvalidArgument { .. })));
}

#[test]
fn projection_indices_are_validated_against_declared_result_count() {
    let a = real_dense(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);

    // SVD declares 3 results: accepts {0, 1, 2}, rejects {-1, 3}
    let svd_node = svd(&a).node().clone();
    for idx in 0..3 {
        assert!(select_result(&svd_node, idx).is_ok());
    }
    for idx in [-1, 3] {
        let err = select_result(&svd_node, idx).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    // LU declares 2 results: accepts {0, 1}, rejects {-1, 2}
    let lu_node = lindag::graph::build::lu(&a).node().clone();
    for idx in 0..2 {
        assert!(select_result(&lu_node, idx).is_ok());
    }
    for idx in [-1, 2] {
        assert!(select_result(&lu_node, idx).is_err());
    }
}

#[test]
fn single_result_nodes_cannot_be_projected() {
    let a = scalar(1.0);
    let s = sin(&a);
    assert!(matches!(
        select_result(&s, 0),
        Err(Error::InvalidArgument { .. })
    ));
    assert!(matches!(
        select_result(&a, 0),
        Err(Error::InvalidArgument { .. })
    ));
}

#[test]
fn projections_are_two_argument_expressions_over_an_integer_index() {
    let a = real_dense(&[1.0, 2.0, 3.0, 4.0], 2, 2);
    let node = svd(&a).node().clone();
    let proj = select_result(&node, 1).unwrap();
    let e = proj.as_expression().unwrap();
    assert_eq!(e.tag(), Tag::SelectResult);
    assert_eq!(e.arg_count(), 2);
    assert!(Arc::ptr_eq(e.arg(0).unwrap(), &node));
    assert_eq!(
        e.arg(1).unwrap().as_terminal(),
        Some(&Terminal::integer_scalar(1))
    );
}

#[test]
fn node_identity_is_reference_identity() {
    let a = scalar(1.0);
    let b = scalar(2.0);

    // structurally identical, independently built: distinct nodes
    let e1 = plus(&a, &b);
    let e2 = plus(&a, &b);
    assert!(!Arc::ptr_eq(&e1, &e2));

    // sharing happens only through explicit reference reuse
    let shared = plus(&a, &b);
    let parent = mtimes(&shared, &shared);
    let pe = parent.as_expression().unwrap();
    assert!(Arc::ptr_eq(pe.arg(0).unwrap(), pe.arg(1).unwrap()));
}

#[test]
fn arguments_are_fixed_at_construction() {
    let a = scalar(1.0);
    let e = plus(&a, &a);
    let expr = e.as_expression().unwrap();
    // the argument list observed through every accessor is the same
    assert_eq!(expr.args().len(), expr.arg_count());
    assert_eq!(expr.result_count(), 1);
    assert!(!expr.is_variadic_result());
}

#[test]
fn result_views_require_variadic_targets() {
    let a = scalar(1.0);
    let err = ResultView::new(sin(&a)).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));

    let m = real_dense(&[1.0, 2.0, 3.0, 4.0], 2, 2);
    let view = ResultView::new(svd(&m).node().clone()).unwrap();
    assert_eq!(view.result_count(), 3);
    assert!(view.get(2).is_ok());
    assert!(view.get(3).is_err());
}

#[test]
fn terminals_expose_their_registry_tags() {
    assert_eq!(scalar(1.0).tag(), Tag::RealScalar);
    assert_eq!(
        terminal(Terminal::complex_scalar(0.0, 1.0)).tag(),
        Tag::ComplexScalar
    );
    assert_eq!(
        real_dense(&[1.0, 2.0], 1, 2).tag(),
        Tag::RealDenseMatrix
    );
    let spars = Terminal::real_sparse(2, 2, &[(0, 0, 1.0)]).unwrap();
    assert_eq!(terminal(spars).tag(), Tag::RealSparseMatrix);
}

#[test]
fn deep_chains_build_without_canonicalization() {
    // graph growth proportional to chain length is expected behavior
    let mut node = scalar(0.0);
    for i in 1..=1000 {
        node = plus(&node, &scalar(f64::from(i)));
    }
    let mut depth = 0;
    let mut cursor = node;
    while let Some(e) = cursor.as_expression() {
        depth += 1;
        cursor = e.arg(0).unwrap().clone();
    }
    assert_eq!(depth, 1000);
}
