//! Concrete data containers (terminals) and the equality model
//!
//! A [`Terminal`] holds already-materialized numeric data: one of ten
//! concrete variants over the real and complex domains. Shape and buffer
//! length are checked at construction and can never change afterward; the
//! payload structs keep their fields private so the invariants hold for the
//! lifetime of the value.
//!
//! Three equality notions are provided (see [`equality`]):
//! - strict (`==`): same variant, byte-identical buffers
//! - fuzzy: same variant, tolerance-based cell comparison
//! - maths: representation-coercing tolerance-based comparison

mod complex;
pub mod convert;
pub mod equality;

pub use complex::Complex64;

use crate::error::{Error, Result};
use crate::graph::Tag;
use std::hash::{Hash, Hasher};

/// A dense row-major matrix buffer.
///
/// `data.len() == rows * cols`, enforced at construction.
#[derive(Debug, Clone)]
pub struct DenseMatrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy> DenseMatrix<T> {
    /// Create a dense matrix from a row-major buffer
    pub fn new(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::invalid_argument(format!(
                "dense buffer length {} does not match shape {}x{}",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Create a dense matrix from nested rows; every row must have the same length
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != ncols) {
            return Err(Error::invalid_argument("array data cannot be ragged"));
        }
        let mut data = Vec::with_capacity(nrows * ncols);
        for row in rows {
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: nrows,
            cols: ncols,
            data,
        })
    }

    // Internal constructor for kernel outputs whose shape is correct by
    // construction.
    pub(crate) fn from_raw(rows: usize, cols: usize, data: Vec<T>) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { rows, cols, data }
    }

    // Decompose into shape and buffer without copying.
    pub(crate) fn into_raw(self) -> (usize, usize, Vec<T>) {
        (self.rows, self.cols, self.data)
    }

    /// Number of rows
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The row-major backing buffer
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Element at (i, j); panics on out-of-range indices
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[i * self.cols + j]
    }
}

/// A sparse matrix in compressed-sparse-row form.
///
/// `indptr` has `rows + 1` entries; row `i` owns the half-open slice
/// `indptr[i]..indptr[i+1]` of `indices`/`data`, with column indices
/// strictly increasing within each row.
#[derive(Debug, Clone)]
pub struct SparseMatrix<T> {
    rows: usize,
    cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<T>,
}

impl<T: Copy> SparseMatrix<T> {
    /// Create a CSR matrix from its three arrays
    pub fn new(
        rows: usize,
        cols: usize,
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<T>,
    ) -> Result<Self> {
        if indptr.len() != rows + 1 {
            return Err(Error::invalid_argument(format!(
                "indptr length {} does not match {} rows",
                indptr.len(),
                rows
            )));
        }
        if indptr[0] != 0 || *indptr.last().expect("indptr is non-empty") != data.len() {
            return Err(Error::invalid_argument(
                "indptr must start at 0 and end at the stored entry count",
            ));
        }
        if indices.len() != data.len() {
            return Err(Error::invalid_argument(
                "indices and data must have the same length",
            ));
        }
        for i in 0..rows {
            if indptr[i] > indptr[i + 1] {
                return Err(Error::invalid_argument("indptr must be non-decreasing"));
            }
            let row = &indices[indptr[i]..indptr[i + 1]];
            for w in row.windows(2) {
                if w[0] >= w[1] {
                    return Err(Error::invalid_argument(
                        "column indices must be strictly increasing within each row",
                    ));
                }
            }
            if row.last().is_some_and(|&c| c >= cols) {
                return Err(Error::invalid_argument("column index out of range"));
            }
        }
        Ok(Self {
            rows,
            cols,
            indptr,
            indices,
            data,
        })
    }

    /// Create a CSR matrix from (row, col, value) triplets
    pub fn from_triplets(rows: usize, cols: usize, entries: &[(usize, usize, T)]) -> Result<Self> {
        let mut sorted: Vec<(usize, usize, T)> = entries.to_vec();
        sorted.sort_by_key(|&(r, c, _)| (r, c));
        for w in sorted.windows(2) {
            if w[0].0 == w[1].0 && w[0].1 == w[1].1 {
                return Err(Error::invalid_argument(format!(
                    "duplicate entry at ({}, {})",
                    w[0].0, w[0].1
                )));
            }
        }
        let mut indptr = vec![0usize; rows + 1];
        let mut indices = Vec::with_capacity(sorted.len());
        let mut data = Vec::with_capacity(sorted.len());
        for &(r, c, v) in &sorted {
            if r >= rows || c >= cols {
                return Err(Error::invalid_argument(format!(
                    "entry ({r}, {c}) outside {rows}x{cols}"
                )));
            }
            indptr[r + 1] += 1;
            indices.push(c);
            data.push(v);
        }
        for i in 0..rows {
            indptr[i + 1] += indptr[i];
        }
        Self::new(rows, cols, indptr, indices, data)
    }

    /// Number of rows
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row pointer array (`rows + 1` entries)
    #[inline]
    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    /// Column indices of the stored entries
    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Values of the stored entries
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }
}

/// A diagonal matrix storing only its diagonal.
///
/// The buffer may be shorter than `min(rows, cols)`; missing trailing
/// entries are implicitly zero.
#[derive(Debug, Clone)]
pub struct DiagonalMatrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy> DiagonalMatrix<T> {
    /// Create a diagonal matrix from its diagonal values
    pub fn new(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() > rows.min(cols) {
            return Err(Error::invalid_argument(format!(
                "diagonal length {} exceeds min({rows}, {cols})",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Number of rows
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The stored diagonal values
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }
}

/// A logical (boolean) matrix with 0/1 cells.
#[derive(Debug, Clone)]
pub struct LogicalMatrix {
    rows: usize,
    cols: usize,
    data: Vec<u8>,
}

impl LogicalMatrix {
    /// Create a logical matrix from a row-major 0/1 buffer
    pub fn new(data: Vec<u8>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::invalid_argument(format!(
                "logical buffer length {} does not match shape {rows}x{cols}",
                data.len()
            )));
        }
        if data.iter().any(|&v| v > 1) {
            return Err(Error::invalid_argument("logical cells must be 0 or 1"));
        }
        Ok(Self { rows, cols, data })
    }

    /// Number of rows
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The row-major 0/1 buffer
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// A node holding already-materialized data.
///
/// Strict equality (`==`) requires the same concrete variant with a
/// byte-identical backing buffer, and `Hash` is consistent with it, so
/// terminals can serve as canonical identities in maps and sets. For
/// numeric comparison use [`Terminal::fuzzy_equals`] or
/// [`Terminal::maths_equals`].
#[derive(Debug, Clone)]
pub enum Terminal {
    /// Real scalar
    RealScalar(f64),
    /// Complex scalar
    ComplexScalar(Complex64),
    /// Integer scalar (projection indices)
    IntegerScalar(i64),
    /// Real dense matrix
    RealDense(DenseMatrix<f64>),
    /// Complex dense matrix
    ComplexDense(DenseMatrix<Complex64>),
    /// Real CSR sparse matrix
    RealSparse(SparseMatrix<f64>),
    /// Complex CSR sparse matrix
    ComplexSparse(SparseMatrix<Complex64>),
    /// Real diagonal matrix
    RealDiagonal(DiagonalMatrix<f64>),
    /// Complex diagonal matrix
    ComplexDiagonal(DiagonalMatrix<Complex64>),
    /// Logical matrix
    Logical(LogicalMatrix),
}

impl Terminal {
    /// Real scalar terminal
    pub fn real_scalar(value: f64) -> Self {
        Self::RealScalar(value)
    }

    /// Complex scalar terminal
    pub fn complex_scalar(re: f64, im: f64) -> Self {
        Self::ComplexScalar(Complex64::new(re, im))
    }

    /// Integer scalar terminal
    pub fn integer_scalar(value: i64) -> Self {
        Self::IntegerScalar(value)
    }

    /// Real dense matrix terminal from a row-major buffer
    pub fn real_dense(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        Ok(Self::RealDense(DenseMatrix::new(data, rows, cols)?))
    }

    /// Real dense matrix terminal from nested rows
    pub fn real_dense_from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        Ok(Self::RealDense(DenseMatrix::from_rows(rows)?))
    }

    /// Complex dense matrix terminal from a row-major buffer
    pub fn complex_dense(data: Vec<Complex64>, rows: usize, cols: usize) -> Result<Self> {
        Ok(Self::ComplexDense(DenseMatrix::new(data, rows, cols)?))
    }

    /// Real sparse matrix terminal from (row, col, value) triplets
    pub fn real_sparse(rows: usize, cols: usize, entries: &[(usize, usize, f64)]) -> Result<Self> {
        Ok(Self::RealSparse(SparseMatrix::from_triplets(
            rows, cols, entries,
        )?))
    }

    /// Complex sparse matrix terminal from (row, col, value) triplets
    pub fn complex_sparse(
        rows: usize,
        cols: usize,
        entries: &[(usize, usize, Complex64)],
    ) -> Result<Self> {
        Ok(Self::ComplexSparse(SparseMatrix::from_triplets(
            rows, cols, entries,
        )?))
    }

    /// Real diagonal matrix terminal
    pub fn real_diagonal(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        Ok(Self::RealDiagonal(DiagonalMatrix::new(data, rows, cols)?))
    }

    /// Complex diagonal matrix terminal
    pub fn complex_diagonal(data: Vec<Complex64>, rows: usize, cols: usize) -> Result<Self> {
        Ok(Self::ComplexDiagonal(DiagonalMatrix::new(data, rows, cols)?))
    }

    /// Logical matrix terminal from a row-major 0/1 buffer
    pub fn logical(data: Vec<u8>, rows: usize, cols: usize) -> Result<Self> {
        Ok(Self::Logical(LogicalMatrix::new(data, rows, cols)?))
    }

    /// The registry tag of this variant
    pub fn tag(&self) -> Tag {
        match self {
            Self::RealScalar(_) => Tag::RealScalar,
            Self::ComplexScalar(_) => Tag::ComplexScalar,
            Self::IntegerScalar(_) => Tag::IntegerScalar,
            Self::RealDense(_) => Tag::RealDenseMatrix,
            Self::ComplexDense(_) => Tag::ComplexDenseMatrix,
            Self::RealSparse(_) => Tag::RealSparseMatrix,
            Self::ComplexSparse(_) => Tag::ComplexSparseMatrix,
            Self::RealDiagonal(_) => Tag::RealDiagonalMatrix,
            Self::ComplexDiagonal(_) => Tag::ComplexDiagonalMatrix,
            Self::Logical(_) => Tag::LogicalMatrix,
        }
    }

    /// Shape as (rows, cols); scalars are 1x1
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Self::RealScalar(_) | Self::ComplexScalar(_) | Self::IntegerScalar(_) => (1, 1),
            Self::RealDense(m) => (m.rows(), m.cols()),
            Self::ComplexDense(m) => (m.rows(), m.cols()),
            Self::RealSparse(m) => (m.rows(), m.cols()),
            Self::ComplexSparse(m) => (m.rows(), m.cols()),
            Self::RealDiagonal(m) => (m.rows(), m.cols()),
            Self::ComplexDiagonal(m) => (m.rows(), m.cols()),
            Self::Logical(m) => (m.rows(), m.cols()),
        }
    }

    /// True for variants that can represent numbers in complex space
    pub fn is_complex_domain(&self) -> bool {
        matches!(
            self,
            Self::ComplexScalar(_)
                | Self::ComplexDense(_)
                | Self::ComplexSparse(_)
                | Self::ComplexDiagonal(_)
        )
    }
}

fn bits(values: &[f64]) -> impl Iterator<Item = u64> + '_ {
    values.iter().map(|v| v.to_bits())
}

fn complex_bits(values: &[Complex64]) -> impl Iterator<Item = (u64, u64)> + '_ {
    values.iter().map(|v| (v.re.to_bits(), v.im.to_bits()))
}

impl PartialEq for Terminal {
    fn eq(&self, other: &Self) -> bool {
        use Terminal::*;
        match (self, other) {
            (RealScalar(a), RealScalar(b)) => a.to_bits() == b.to_bits(),
            (ComplexScalar(a), ComplexScalar(b)) => {
                a.re.to_bits() == b.re.to_bits() && a.im.to_bits() == b.im.to_bits()
            }
            (IntegerScalar(a), IntegerScalar(b)) => a == b,
            (RealDense(a), RealDense(b)) => {
                a.rows() == b.rows()
                    && a.cols() == b.cols()
                    && bits(a.data()).eq(bits(b.data()))
            }
            (ComplexDense(a), ComplexDense(b)) => {
                a.rows() == b.rows()
                    && a.cols() == b.cols()
                    && complex_bits(a.data()).eq(complex_bits(b.data()))
            }
            (RealSparse(a), RealSparse(b)) => {
                a.rows() == b.rows()
                    && a.cols() == b.cols()
                    && a.indptr() == b.indptr()
                    && a.indices() == b.indices()
                    && bits(a.data()).eq(bits(b.data()))
            }
            (ComplexSparse(a), ComplexSparse(b)) => {
                a.rows() == b.rows()
                    && a.cols() == b.cols()
                    && a.indptr() == b.indptr()
                    && a.indices() == b.indices()
                    && complex_bits(a.data()).eq(complex_bits(b.data()))
            }
            (RealDiagonal(a), RealDiagonal(b)) => {
                a.rows() == b.rows()
                    && a.cols() == b.cols()
                    && bits(a.data()).eq(bits(b.data()))
            }
            (ComplexDiagonal(a), ComplexDiagonal(b)) => {
                a.rows() == b.rows()
                    && a.cols() == b.cols()
                    && complex_bits(a.data()).eq(complex_bits(b.data()))
            }
            (Logical(a), Logical(b)) => {
                a.rows() == b.rows() && a.cols() == b.cols() && a.data() == b.data()
            }
            _ => false,
        }
    }
}

impl Eq for Terminal {}

impl Hash for Terminal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag().code().hash(state);
        let (r, c) = self.shape();
        r.hash(state);
        c.hash(state);
        match self {
            Self::RealScalar(v) => v.to_bits().hash(state),
            Self::ComplexScalar(v) => {
                v.re.to_bits().hash(state);
                v.im.to_bits().hash(state);
            }
            Self::IntegerScalar(v) => v.hash(state),
            Self::RealDense(m) => bits(m.data()).for_each(|b| b.hash(state)),
            Self::ComplexDense(m) => complex_bits(m.data()).for_each(|b| b.hash(state)),
            Self::RealSparse(m) => {
                m.indptr().hash(state);
                m.indices().hash(state);
                bits(m.data()).for_each(|b| b.hash(state));
            }
            Self::ComplexSparse(m) => {
                m.indptr().hash(state);
                m.indices().hash(state);
                complex_bits(m.data()).for_each(|b| b.hash(state));
            }
            Self::RealDiagonal(m) => bits(m.data()).for_each(|b| b.hash(state)),
            Self::ComplexDiagonal(m) => complex_bits(m.data()).for_each(|b| b.hash(state)),
            Self::Logical(m) => m.data().hash(state),
        }
    }
}
