//! Scalar field abstraction for the generic dense kernels
//!
//! The reference engine computes in dense space over `f64` or
//! [`Complex64`]; kernels that are domain-agnostic (elementwise
//! arithmetic, matrix multiply, LU) are written once against this trait.

use crate::container::{Complex64, DenseMatrix, Terminal};
use num_traits::{One, Zero};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A scalar field the dense kernels can compute over
pub(crate) trait Field:
    Copy
    + PartialEq
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Send
    + Sync
    + 'static
{
    /// Domain name for failure messages
    const DOMAIN: &'static str;

    /// Embed a real value
    fn from_real(v: f64) -> Self;

    /// Modulus `|x|` as a real value
    fn modulus(self) -> f64;

    /// Complex conjugate; identity over the reals
    fn conj(self) -> Self;

    /// Wrap a dense buffer in the matching terminal variant
    fn dense_terminal(rows: usize, cols: usize, data: Vec<Self>) -> Terminal;
}

impl Field for f64 {
    const DOMAIN: &'static str = "real";

    #[inline]
    fn from_real(v: f64) -> Self {
        v
    }

    #[inline]
    fn modulus(self) -> f64 {
        self.abs()
    }

    #[inline]
    fn conj(self) -> Self {
        self
    }

    fn dense_terminal(rows: usize, cols: usize, data: Vec<Self>) -> Terminal {
        Terminal::RealDense(DenseMatrix::from_raw(rows, cols, data))
    }
}

impl Field for Complex64 {
    const DOMAIN: &'static str = "complex";

    #[inline]
    fn from_real(v: f64) -> Self {
        Complex64::from(v)
    }

    #[inline]
    fn modulus(self) -> f64 {
        self.abs()
    }

    #[inline]
    fn conj(self) -> Self {
        Complex64::conj(self)
    }

    fn dense_terminal(rows: usize, cols: usize, data: Vec<Self>) -> Terminal {
        Terminal::ComplexDense(DenseMatrix::from_raw(rows, cols, data))
    }
}
