//! Materialization entry points
//!
//! Four operations lower a graph root to concrete results by handing the
//! entire graph to the process engine in one request. Each call blocks for
//! the duration of the dispatch, never mutates nodes, and may run
//! concurrently with independent calls on independent or shared graphs;
//! the first call in the process triggers the one-time engine bootstrap.
//!
//! Engine failures are caught exactly here, enriched with any native frame
//! data the engine supplied, and re-raised as the matching typed error —
//! never swallowed or downgraded.

use crate::container::Terminal;
use crate::engine::{self, EngineFailure, FailureKind};
use crate::error::{Error, Result};
use crate::graph::NodeRef;
use tracing::debug;

/// Parallel real/imaginary rectangular arrays with a derived
/// any-imaginary flag.
///
/// The flag is computed at construction by scanning every cell of the
/// imaginary part, treating +0 and -0 both as zero (a NaN imaginary part
/// counts as imaginary).
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexParts {
    real: Vec<Vec<f64>>,
    imag: Vec<Vec<f64>>,
    any_imag: bool,
}

impl ComplexParts {
    /// Build from parallel rectangular arrays.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when either array is ragged or their
    /// dimensions differ.
    pub fn new(real: Vec<Vec<f64>>, imag: Vec<Vec<f64>>) -> Result<Self> {
        let cols = real.first().map_or(0, Vec::len);
        if real.iter().any(|r| r.len() != cols) || imag.iter().any(|r| r.len() != cols) {
            return Err(Error::invalid_argument("array data cannot be ragged"));
        }
        if real.len() != imag.len() {
            return Err(Error::invalid_argument(
                "real and imaginary parts have different numbers of rows",
            ));
        }
        let any_imag = imag
            .iter()
            .flatten()
            .any(|v| (v.to_bits() & !(1u64 << 63)) != 0);
        Ok(Self {
            real,
            imag,
            any_imag,
        })
    }

    /// The real part
    pub fn real(&self) -> &[Vec<f64>] {
        &self.real
    }

    /// The imaginary part
    pub fn imag(&self) -> &[Vec<f64>] {
        &self.imag
    }

    /// True when any imaginary cell is nonzero
    pub fn any_imaginary(&self) -> bool {
        self.any_imag
    }
}

/// Translate an engine failure into the matching typed error
fn raise(failure: EngineFailure) -> Error {
    debug!(kind = ?failure.kind, message = %failure.message, "engine failure at dispatch boundary");
    match failure.kind {
        FailureKind::Computation => Error::NativeComputation {
            message: failure.message,
            frames: failure.frames,
        },
        FailureKind::Conversion => Error::NativeConversion {
            message: failure.message,
            frames: failure.frames,
        },
        FailureKind::Unspecified => Error::NativeUnspecified {
            message: failure.message,
        },
    }
}

fn materialise(root: &NodeRef) -> Result<Terminal> {
    let engine = engine::instance()?;
    engine.materialise(root).map_err(raise)
}

/// Materialize the graph at `root` to a new terminal.
///
/// The result is whichever concrete variant the engine deems canonical
/// (terminal roots come back in their own variant), enabling further graph
/// construction or equality comparison without leaving the graph model.
pub fn to_terminal(root: &NodeRef) -> Result<Terminal> {
    materialise(root)
}

/// Materialize the graph at `root` to a rectangular array of real values.
///
/// # Errors
///
/// [`Error::NativeComputation`] when the result carries a non-zero
/// imaginary component (signed zeros count as zero), alongside the usual
/// dispatch-boundary errors.
pub fn to_real_array(root: &NodeRef) -> Result<Vec<Vec<f64>>> {
    let result = materialise(root)?;
    if result.is_complex_domain() {
        let parts = split_complex(&result)?;
        if parts.any_imaginary() {
            return Err(Error::NativeComputation {
                message: format!(
                    "{} result carries a non-zero imaginary component",
                    result.tag().name()
                ),
                frames: Vec::new(),
            });
        }
        return Ok(parts.real);
    }
    let dense = result
        .to_real_dense()
        .map_err(|e| raise(EngineFailure::conversion(e.to_string())))?;
    Ok(to_rows(dense.rows(), dense.cols(), dense.data()))
}

/// Materialize the graph at `root` to parallel real/imaginary arrays
pub fn to_complex_parts(root: &NodeRef) -> Result<ComplexParts> {
    let result = materialise(root)?;
    split_complex(&result)
}

/// Materialize the graph at `root` to a single boolean.
///
/// The result must be a 1x1 real-domain value; nonzero is `true`.
pub fn to_boolean(root: &NodeRef) -> Result<bool> {
    let result = materialise(root)?;
    if result.shape() != (1, 1) {
        let (r, c) = result.shape();
        return Err(Error::NativeComputation {
            message: format!("boolean result must be 1x1, got {r}x{c}"),
            frames: Vec::new(),
        });
    }
    let parts = split_complex(&result)?;
    if parts.any_imaginary() {
        return Err(Error::NativeComputation {
            message: "boolean result carries a non-zero imaginary component".to_string(),
            frames: Vec::new(),
        });
    }
    Ok(parts.real[0][0] != 0.0)
}

fn split_complex(result: &Terminal) -> Result<ComplexParts> {
    let dense = result.to_complex_dense();
    let (rows, cols) = (dense.rows(), dense.cols());
    let mut real = vec![vec![0.0; cols]; rows];
    let mut imag = vec![vec![0.0; cols]; rows];
    for i in 0..rows {
        for j in 0..cols {
            let cell = dense.get(i, j);
            real[i][j] = cell.re;
            imag[i][j] = cell.im;
        }
    }
    ComplexParts::new(real, imag)
}

fn to_rows(rows: usize, cols: usize, data: &[f64]) -> Vec<Vec<f64>> {
    (0..rows)
        .map(|i| data[i * cols..(i + 1) * cols].to_vec())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_imaginary_ignores_signed_zero() {
        let parts =
            ComplexParts::new(vec![vec![1.0, 2.0]], vec![vec![0.0, -0.0]]).unwrap();
        assert!(!parts.any_imaginary());

        let parts = ComplexParts::new(vec![vec![1.0]], vec![vec![1.0e-300]]).unwrap();
        assert!(parts.any_imaginary());
    }

    #[test]
    fn nan_imaginary_counts_as_imaginary() {
        let parts = ComplexParts::new(vec![vec![1.0]], vec![vec![f64::NAN]]).unwrap();
        assert!(parts.any_imaginary());
    }

    #[test]
    fn ragged_and_mismatched_parts_are_rejected() {
        let err = ComplexParts::new(vec![vec![1.0], vec![1.0, 2.0]], vec![vec![0.0]]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        let err = ComplexParts::new(vec![vec![1.0]], vec![]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }
}
