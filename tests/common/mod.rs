//! Common test utilities
#![allow(dead_code)]

use lindag::container::Terminal;
use lindag::graph::build::terminal;
use lindag::graph::NodeRef;

/// Wrap a row-major real dense matrix as a graph node
pub fn real_dense(data: &[f64], rows: usize, cols: usize) -> NodeRef {
    terminal(Terminal::real_dense(data.to_vec(), rows, cols).expect("consistent test shape"))
}

/// Wrap a real scalar as a graph node
pub fn scalar(v: f64) -> NodeRef {
    terminal(Terminal::real_scalar(v))
}

/// Assert two rectangular arrays are close within an absolute tolerance
pub fn assert_rows_close(a: &[Vec<f64>], b: &[Vec<f64>], tol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{msg}: row count mismatch");
    for (i, (ra, rb)) in a.iter().zip(b).enumerate() {
        assert_eq!(ra.len(), rb.len(), "{msg}: row {i} length mismatch");
        for (j, (x, y)) in ra.iter().zip(rb).enumerate() {
            assert!(
                (x - y).abs() <= tol,
                "{msg}: cell ({i}, {j}) differs: {x} vs {y}"
            );
        }
    }
}
