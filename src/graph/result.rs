//! Named projections over variadic-result expressions
//!
//! A [`ResultView`] is a stateless accessor: it holds a reference to a
//! multi-output node and builds projection nodes on demand. It never stores
//! computed data — each accessor call returns a fresh projection over the
//! same shared target.

use super::{select_result, NodeRef};
use crate::error::{Error, Result};

/// Accessor building index projections over a variadic-result expression
#[derive(Debug, Clone)]
pub struct ResultView {
    target: NodeRef,
    n_results: u32,
}

impl ResultView {
    /// Wrap a variadic-result expression.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when `target` does not declare more than
    /// one result.
    pub fn new(target: NodeRef) -> Result<Self> {
        let n_results = match target.as_expression() {
            Some(e) if e.is_variadic_result() => e.result_count(),
            _ => {
                return Err(Error::invalid_argument(
                    "result view target must declare more than one result",
                ))
            }
        };
        Ok(Self { target, n_results })
    }

    // Internal constructor for the decomposition builders, whose targets
    // are variadic by construction.
    pub(crate) fn over(target: NodeRef) -> Self {
        let n_results = target
            .as_expression()
            .map(super::Expression::result_count)
            .unwrap_or(1);
        debug_assert!(n_results > 1);
        Self { target, n_results }
    }

    /// Declared result count of the underlying node
    #[inline]
    pub fn result_count(&self) -> u32 {
        self.n_results
    }

    /// The underlying variadic-result node
    #[inline]
    pub fn node(&self) -> &NodeRef {
        &self.target
    }

    /// Projection of result `index`
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when `index` is out of range.
    pub fn get(&self, index: i64) -> Result<NodeRef> {
        select_result(&self.target, index)
    }

    // The named accessors below address indices that are in range by
    // construction.
    fn get_known(&self, index: i64) -> NodeRef {
        select_result(&self.target, index).expect("index within declared result count")
    }
}

/// Result view over an SVD node: `A = U * S * V^T`
#[derive(Debug, Clone)]
pub struct SvdView(ResultView);

impl SvdView {
    pub(crate) fn over(target: NodeRef) -> Self {
        Self(ResultView::over(target))
    }

    /// The matrix of left singular vectors
    pub fn u(&self) -> NodeRef {
        self.0.get_known(0)
    }

    /// The diagonal matrix of singular values, in descending order
    pub fn s(&self) -> NodeRef {
        self.0.get_known(1)
    }

    /// The matrix of right singular vectors, transposed
    pub fn vt(&self) -> NodeRef {
        self.0.get_known(2)
    }

    /// The underlying variadic-result node
    pub fn node(&self) -> &NodeRef {
        self.0.node()
    }
}

/// Result view over an LU node: `A = L * U` with L row-permuted
#[derive(Debug, Clone)]
pub struct LuView(ResultView);

impl LuView {
    pub(crate) fn over(target: NodeRef) -> Self {
        Self(ResultView::over(target))
    }

    /// The (row-permuted) unit lower-triangular factor
    pub fn l(&self) -> NodeRef {
        self.0.get_known(0)
    }

    /// The upper-triangular factor
    pub fn u(&self) -> NodeRef {
        self.0.get_known(1)
    }

    /// The underlying variadic-result node
    pub fn node(&self) -> &NodeRef {
        self.0.node()
    }
}

/// Result view over a QR node: `A = Q * R`
#[derive(Debug, Clone)]
pub struct QrView(ResultView);

impl QrView {
    pub(crate) fn over(target: NodeRef) -> Self {
        Self(ResultView::over(target))
    }

    /// The orthogonal factor
    pub fn q(&self) -> NodeRef {
        self.0.get_known(0)
    }

    /// The upper-trapezoidal factor
    pub fn r(&self) -> NodeRef {
        self.0.get_known(1)
    }

    /// The underlying variadic-result node
    pub fn node(&self) -> &NodeRef {
        self.0.node()
    }
}
