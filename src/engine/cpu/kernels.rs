//! Dense kernels for the reference engine
//!
//! All kernels take and produce row-major [`DenseMatrix`] buffers. Shape
//! conformance failures are computation-kind engine failures; the engine
//! ran, the request was invalid.

use super::field::Field;
use crate::container::DenseMatrix;
use crate::engine::{EngineFailure, EngineResult};
use crate::graph::Tag;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

fn non_conformant(op: &str, a: (usize, usize), b: (usize, usize)) -> EngineFailure {
    EngineFailure::computation(format!(
        "{op}: shapes {}x{} and {}x{} do not conform",
        a.0, a.1, b.0, b.1
    ))
}

#[inline]
fn shape<T: Copy>(m: &DenseMatrix<T>) -> (usize, usize) {
    (m.rows(), m.cols())
}

fn is_scalar<T: Copy>(m: &DenseMatrix<T>) -> bool {
    m.rows() == 1 && m.cols() == 1
}

/// Apply a function to every cell
pub(crate) fn map<T: Field>(a: &DenseMatrix<T>, f: impl Fn(T) -> T) -> DenseMatrix<T> {
    let data = a.data().iter().map(|&v| f(v)).collect();
    DenseMatrix::from_raw(a.rows(), a.cols(), data)
}

/// Elementwise binary arithmetic with scalar broadcast.
///
/// Operands must have equal shapes, or one of them must be 1x1.
pub(crate) fn elementwise<T: Field>(
    op: Tag,
    a: &DenseMatrix<T>,
    b: &DenseMatrix<T>,
) -> EngineResult<DenseMatrix<T>> {
    let f = |x: T, y: T| -> T {
        match op {
            Tag::Plus => x + y,
            Tag::Minus => x - y,
            Tag::Times => x * y,
            Tag::Rdivide => x / y,
            _ => unreachable!("not an elementwise operation"),
        }
    };
    if shape(a) == shape(b) {
        let data = a
            .data()
            .iter()
            .zip(b.data())
            .map(|(&x, &y)| f(x, y))
            .collect();
        Ok(DenseMatrix::from_raw(a.rows(), a.cols(), data))
    } else if is_scalar(a) {
        let x = a.data()[0];
        Ok(map(b, |y| f(x, y)))
    } else if is_scalar(b) {
        let y = b.data()[0];
        Ok(map(a, |x| f(x, y)))
    } else {
        Err(non_conformant(op.name(), shape(a), shape(b)))
    }
}

/// Matrix multiply; a 1x1 operand scales the other side
pub(crate) fn matmul<T: Field>(
    a: &DenseMatrix<T>,
    b: &DenseMatrix<T>,
) -> EngineResult<DenseMatrix<T>> {
    if is_scalar(a) {
        let x = a.data()[0];
        return Ok(map(b, |y| x * y));
    }
    if is_scalar(b) {
        let y = b.data()[0];
        return Ok(map(a, |x| x * y));
    }
    let (m, k) = shape(a);
    let (k2, n) = shape(b);
    if k != k2 {
        return Err(non_conformant("mtimes", shape(a), shape(b)));
    }

    let compute_row = |i: usize, out_row: &mut [T]| {
        for p in 0..k {
            let aip = a.get(i, p);
            let b_row = &b.data()[p * n..(p + 1) * n];
            for (o, &bpj) in out_row.iter_mut().zip(b_row) {
                *o = *o + aip * bpj;
            }
        }
    };

    let mut data = vec![T::zero(); m * n];
    #[cfg(feature = "rayon")]
    {
        data.par_chunks_mut(n)
            .enumerate()
            .for_each(|(i, row)| compute_row(i, row));
    }
    #[cfg(not(feature = "rayon"))]
    {
        for (i, row) in data.chunks_mut(n).enumerate() {
            compute_row(i, row);
        }
    }
    Ok(DenseMatrix::from_raw(m, n, data))
}

/// Transpose
pub(crate) fn transpose<T: Field>(a: &DenseMatrix<T>) -> DenseMatrix<T> {
    let (m, n) = shape(a);
    let mut data = vec![T::zero(); m * n];
    for i in 0..m {
        for j in 0..n {
            data[j * m + i] = a.get(i, j);
        }
    }
    DenseMatrix::from_raw(n, m, data)
}

/// Conjugate transpose
pub(crate) fn conj_transpose<T: Field>(a: &DenseMatrix<T>) -> DenseMatrix<T> {
    map(&transpose(a), T::conj)
}

/// Column sums, producing a 1 x n row vector
pub(crate) fn sumcols<T: Field>(a: &DenseMatrix<T>) -> DenseMatrix<T> {
    let (m, n) = shape(a);
    let mut data = vec![T::zero(); n];
    for i in 0..m {
        for (j, acc) in data.iter_mut().enumerate() {
            *acc = *acc + a.get(i, j);
        }
    }
    DenseMatrix::from_raw(1, n, data)
}

/// Row sums, producing an m x 1 column vector
pub(crate) fn sumrows<T: Field>(a: &DenseMatrix<T>) -> DenseMatrix<T> {
    let (m, n) = shape(a);
    let mut data = vec![T::zero(); m];
    for (i, acc) in data.iter_mut().enumerate() {
        for j in 0..n {
            *acc = *acc + a.get(i, j);
        }
    }
    DenseMatrix::from_raw(m, 1, data)
}

/// Euclidean norm of a vector shape (1 x n, m x 1, or 1 x 1)
pub(crate) fn vector_norm2<T: Field>(a: &DenseMatrix<T>) -> f64 {
    a.data()
        .iter()
        .map(|&v| {
            let m = v.modulus();
            m * m
        })
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FailureKind;

    fn dense(data: &[f64], rows: usize, cols: usize) -> DenseMatrix<f64> {
        DenseMatrix::new(data.to_vec(), rows, cols).unwrap()
    }

    #[test]
    fn elementwise_broadcasts_scalars() {
        let a = dense(&[1.0, 2.0, 3.0, 4.0], 2, 2);
        let s = dense(&[10.0], 1, 1);
        let out = elementwise(Tag::Plus, &a, &s).unwrap();
        assert_eq!(out.data(), &[11.0, 12.0, 13.0, 14.0]);
        let out = elementwise(Tag::Minus, &s, &a).unwrap();
        assert_eq!(out.data(), &[9.0, 8.0, 7.0, 6.0]);
    }

    #[test]
    fn elementwise_rejects_non_conformant_shapes() {
        let a = dense(&[1.0, 2.0], 1, 2);
        let b = dense(&[1.0, 2.0, 3.0], 1, 3);
        let err = elementwise(Tag::Plus, &a, &b).unwrap_err();
        assert_eq!(err.kind, FailureKind::Computation);
    }

    #[test]
    fn matmul_matches_hand_computation() {
        let a = dense(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        let b = dense(&[7.0, 8.0, 9.0, 10.0, 11.0, 12.0], 3, 2);
        let out = matmul(&a, &b).unwrap();
        assert_eq!(shape(&out), (2, 2));
        assert_eq!(out.data(), &[58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn matmul_inner_dimension_mismatch_fails() {
        let a = dense(&[1.0, 2.0, 3.0, 4.0], 2, 2);
        let b = dense(&[1.0, 2.0, 3.0], 3, 1);
        let err = matmul(&a, &b).unwrap_err();
        assert_eq!(err.kind, FailureKind::Computation);
    }

    #[test]
    fn transpose_and_sums() {
        let a = dense(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        let t = transpose(&a);
        assert_eq!(shape(&t), (3, 2));
        assert_eq!(t.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(sumcols(&a).data(), &[5.0, 7.0, 9.0]);
        assert_eq!(sumrows(&a).data(), &[6.0, 15.0]);
    }
}
