//! Representation widening for terminals
//!
//! Every concrete variant knows how to widen itself to a canonical dense
//! form. Widening to dense complex always succeeds; widening to dense real
//! is a narrowing for complex-domain variants and fails with a coercion
//! error. The engine and the maths-equality model both build on these.

use super::{Complex64, DenseMatrix, Terminal};
use crate::error::{Error, Result};

impl Terminal {
    /// Widen to a dense real matrix.
    ///
    /// # Errors
    ///
    /// [`Error::Coercion`] for complex-domain variants; representing complex
    /// space in a real container is an illegal narrowing regardless of the
    /// stored imaginary values.
    pub fn to_real_dense(&self) -> Result<DenseMatrix<f64>> {
        match self {
            Self::RealScalar(v) => Ok(DenseMatrix::from_raw(1, 1, vec![*v])),
            Self::IntegerScalar(v) => Ok(DenseMatrix::from_raw(1, 1, vec![*v as f64])),
            Self::RealDense(m) => Ok(m.clone()),
            Self::RealSparse(m) => {
                let mut data = vec![0.0; m.rows() * m.cols()];
                for i in 0..m.rows() {
                    for k in m.indptr()[i]..m.indptr()[i + 1] {
                        data[i * m.cols() + m.indices()[k]] = m.data()[k];
                    }
                }
                Ok(DenseMatrix::from_raw(m.rows(), m.cols(), data))
            }
            Self::RealDiagonal(m) => {
                let mut data = vec![0.0; m.rows() * m.cols()];
                for (i, &v) in m.data().iter().enumerate() {
                    data[i * m.cols() + i] = v;
                }
                Ok(DenseMatrix::from_raw(m.rows(), m.cols(), data))
            }
            Self::Logical(m) => Ok(DenseMatrix::from_raw(
                m.rows(),
                m.cols(),
                m.data().iter().map(|&v| f64::from(v)).collect(),
            )),
            Self::ComplexScalar(_)
            | Self::ComplexDense(_)
            | Self::ComplexSparse(_)
            | Self::ComplexDiagonal(_) => Err(Error::coercion(format!(
                "cannot convert complex space type {} to real space",
                self.tag().name()
            ))),
        }
    }

    /// Widen to a dense complex matrix; always succeeds
    pub fn to_complex_dense(&self) -> DenseMatrix<Complex64> {
        match self {
            Self::ComplexScalar(v) => DenseMatrix::from_raw(1, 1, vec![*v]),
            Self::ComplexDense(m) => m.clone(),
            Self::ComplexSparse(m) => {
                let mut data = vec![Complex64::ZERO; m.rows() * m.cols()];
                for i in 0..m.rows() {
                    for k in m.indptr()[i]..m.indptr()[i + 1] {
                        data[i * m.cols() + m.indices()[k]] = m.data()[k];
                    }
                }
                DenseMatrix::from_raw(m.rows(), m.cols(), data)
            }
            Self::ComplexDiagonal(m) => {
                let mut data = vec![Complex64::ZERO; m.rows() * m.cols()];
                for (i, &v) in m.data().iter().enumerate() {
                    data[i * m.cols() + i] = v;
                }
                DenseMatrix::from_raw(m.rows(), m.cols(), data)
            }
            // real-domain variants promote elementwise
            _ => {
                let real = self
                    .to_real_dense()
                    .expect("real-domain terminal widens to real dense");
                let data = real.data().iter().map(|&v| Complex64::from(v)).collect();
                DenseMatrix::from_raw(real.rows(), real.cols(), data)
            }
        }
    }
}
