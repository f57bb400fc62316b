//! Fuzzy and maths equality
//!
//! Fuzzy equality accounts for floating-point error: two values are equal
//! when their difference is within an absolute bound, or within a relative
//! bound scaled by the larger magnitude. The rules are:
//!
//! - NaN never equals anything, not even itself (IEEE 754 "unordered")
//! - +0 and -0 are equal
//! - infinities are equal only when same-signed
//!
//! Maths equality additionally coerces both operands to a common canonical
//! dense representation first, so structurally different but numerically
//! identical containers (a diagonal matrix and a dense matrix holding the
//! same values) compare equal.

use super::{Complex64, DenseMatrix, Terminal};

/// Default absolute and relative tolerance for fuzzy comparison.
///
/// Ten machine epsilons; tight enough to catch real divergence, loose
/// enough to absorb the rounding of a handful of arithmetic operations.
pub const DEFAULT_TOLERANCE: f64 = 10.0 * f64::EPSILON;

/// Compare two doubles for fuzzy equality.
///
/// `max_abs_error` bounds "equal" for values small in magnitude;
/// `max_rel_error` bounds the relative difference regardless of magnitude.
pub fn single_fuzzy_equals(val1: f64, val2: f64, max_abs_error: f64, max_rel_error: f64) -> bool {
    // IEEE754 NaNs are not comparable
    if val1.is_nan() || val2.is_nan() {
        return false;
    }

    if val1 == val2 {
        return true; // (+/-)inf compares ==, as does (+/-)0
    }

    let diff = val1 - val2;
    if max_abs_error > diff.abs() {
        return true;
    }

    // relative bound: divide the difference by the larger magnitude
    let divisor = if val1.abs() > val2.abs() { val1 } else { val2 };
    let rel_error = (diff / divisor).abs();
    max_rel_error > rel_error
}

/// Compare two complex values for fuzzy equality, part by part
pub fn complex_fuzzy_equals(
    val1: Complex64,
    val2: Complex64,
    max_abs_error: f64,
    max_rel_error: f64,
) -> bool {
    single_fuzzy_equals(val1.re, val2.re, max_abs_error, max_rel_error)
        && single_fuzzy_equals(val1.im, val2.im, max_abs_error, max_rel_error)
}

/// Compare two real buffers cell by cell
pub fn array_fuzzy_equals(a: &[f64], b: &[f64], max_abs_error: f64, max_rel_error: f64) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(&x, &y)| single_fuzzy_equals(x, y, max_abs_error, max_rel_error))
}

fn complex_array_fuzzy_equals(
    a: &[Complex64],
    b: &[Complex64],
    max_abs_error: f64,
    max_rel_error: f64,
) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(&x, &y)| complex_fuzzy_equals(x, y, max_abs_error, max_rel_error))
}

// Diagonal buffers may differ in stored length; compare the implied
// diagonal, padding the shorter buffer with zeros.
fn padded<'a, T: Copy + Default + 'a>(data: &'a [T], len: usize) -> impl Iterator<Item = T> + 'a {
    data.iter()
        .copied()
        .chain(std::iter::repeat(T::default()))
        .take(len)
}

impl Terminal {
    /// Fuzzy comparison with default tolerances.
    ///
    /// Requires the same concrete variant; see [`Terminal::maths_equals`]
    /// for the representation-coercing notion.
    pub fn fuzzy_equals(&self, other: &Terminal) -> bool {
        self.fuzzy_equals_with(other, DEFAULT_TOLERANCE, DEFAULT_TOLERANCE)
    }

    /// Fuzzy comparison with caller-supplied tolerances
    pub fn fuzzy_equals_with(
        &self,
        other: &Terminal,
        max_abs_error: f64,
        max_rel_error: f64,
    ) -> bool {
        use Terminal::*;
        if self.shape() != other.shape() {
            return false;
        }
        match (self, other) {
            (RealScalar(a), RealScalar(b)) => {
                single_fuzzy_equals(*a, *b, max_abs_error, max_rel_error)
            }
            (ComplexScalar(a), ComplexScalar(b)) => {
                complex_fuzzy_equals(*a, *b, max_abs_error, max_rel_error)
            }
            (IntegerScalar(a), IntegerScalar(b)) => a == b,
            (RealDense(a), RealDense(b)) => {
                array_fuzzy_equals(a.data(), b.data(), max_abs_error, max_rel_error)
            }
            (ComplexDense(a), ComplexDense(b)) => {
                complex_array_fuzzy_equals(a.data(), b.data(), max_abs_error, max_rel_error)
            }
            // Sparse operands must agree on the stored pattern exactly
            (RealSparse(a), RealSparse(b)) => {
                a.indptr() == b.indptr()
                    && a.indices() == b.indices()
                    && array_fuzzy_equals(a.data(), b.data(), max_abs_error, max_rel_error)
            }
            (ComplexSparse(a), ComplexSparse(b)) => {
                a.indptr() == b.indptr()
                    && a.indices() == b.indices()
                    && complex_array_fuzzy_equals(a.data(), b.data(), max_abs_error, max_rel_error)
            }
            (RealDiagonal(a), RealDiagonal(b)) => {
                let len = a.rows().min(a.cols());
                padded(a.data(), len)
                    .zip(padded(b.data(), len))
                    .all(|(x, y)| single_fuzzy_equals(x, y, max_abs_error, max_rel_error))
            }
            (ComplexDiagonal(a), ComplexDiagonal(b)) => {
                let len = a.rows().min(a.cols());
                padded(a.data(), len)
                    .zip(padded(b.data(), len))
                    .all(|(x, y)| complex_fuzzy_equals(x, y, max_abs_error, max_rel_error))
            }
            (Logical(a), Logical(b)) => a.data() == b.data(),
            _ => false,
        }
    }

    /// Maths comparison with default tolerances.
    ///
    /// Both operands are widened to a common canonical dense form — dense
    /// real when neither is a complex-domain variant, dense complex
    /// otherwise — and the canonical forms are compared fuzzily.
    pub fn maths_equals(&self, other: &Terminal) -> bool {
        self.maths_equals_with(other, DEFAULT_TOLERANCE, DEFAULT_TOLERANCE)
    }

    /// Maths comparison with caller-supplied tolerances
    pub fn maths_equals_with(
        &self,
        other: &Terminal,
        max_abs_error: f64,
        max_rel_error: f64,
    ) -> bool {
        if self.shape() != other.shape() {
            return false;
        }
        if self.is_complex_domain() || other.is_complex_domain() {
            let a = self.to_complex_dense();
            let b = other.to_complex_dense();
            complex_array_fuzzy_equals(a.data(), b.data(), max_abs_error, max_rel_error)
        } else {
            // both real-domain: widening cannot fail
            let a = self
                .to_real_dense()
                .expect("real-domain terminal widens to real dense");
            let b = other
                .to_real_dense()
                .expect("real-domain terminal widens to real dense");
            array_fuzzy_equals(a.data(), b.data(), max_abs_error, max_rel_error)
        }
    }
}

/// Fuzzy comparison of two dense real matrices, used by engine tests
pub fn dense_fuzzy_equals(
    a: &DenseMatrix<f64>,
    b: &DenseMatrix<f64>,
    max_abs_error: f64,
    max_rel_error: f64,
) -> bool {
    a.rows() == b.rows()
        && a.cols() == b.cols()
        && array_fuzzy_equals(a.data(), b.data(), max_abs_error, max_rel_error)
}
