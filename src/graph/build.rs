//! Graph construction algebra
//!
//! Free functions building well-formed expression nodes over existing
//! [`NodeRef`]s. Arity is fixed per operation, so these constructors are
//! infallible; the generic [`Expression::new`] path is available when the
//! tag arrives as data.
//!
//! Decompositions return their named [result views](crate::graph::result)
//! directly, since a multi-output node is only useful through projections.

use super::result::{LuView, QrView, SvdView};
use super::{Expression, Node, NodeRef, Tag};
use crate::container::Terminal;
use smallvec::SmallVec;
use std::sync::Arc;

/// Wrap a terminal as a graph node
pub fn terminal(t: Terminal) -> NodeRef {
    Arc::new(Node::Terminal(t))
}

fn unary(tag: Tag, a: &NodeRef) -> NodeRef {
    let args = SmallVec::from_vec(vec![Arc::clone(a)]);
    Arc::new(Node::Expression(Expression::from_parts(tag, args)))
}

fn binary(tag: Tag, a: &NodeRef, b: &NodeRef) -> NodeRef {
    let args = SmallVec::from_vec(vec![Arc::clone(a), Arc::clone(b)]);
    Arc::new(Node::Expression(Expression::from_parts(tag, args)))
}

macro_rules! unary_ops {
    ($($(#[$doc:meta])* $name:ident => $tag:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(a: &NodeRef) -> NodeRef {
                unary(Tag::$tag, a)
            }
        )*
    };
}

macro_rules! binary_ops {
    ($($(#[$doc:meta])* $name:ident => $tag:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(a: &NodeRef, b: &NodeRef) -> NodeRef {
                binary(Tag::$tag, a, b)
            }
        )*
    };
}

unary_ops! {
    /// Identity copy
    copy => Copy,
    /// Elementwise sine
    sin => Sin,
    /// Elementwise cosine
    cos => Cos,
    /// Elementwise tangent
    tan => Tan,
    /// Elementwise inverse sine
    asin => Asin,
    /// Elementwise inverse cosine
    acos => Acos,
    /// Elementwise inverse tangent
    atan => Atan,
    /// Elementwise hyperbolic sine
    sinh => Sinh,
    /// Elementwise hyperbolic cosine
    cosh => Cosh,
    /// Elementwise hyperbolic tangent
    tanh => Tanh,
    /// Elementwise inverse hyperbolic sine
    asinh => Asinh,
    /// Elementwise inverse hyperbolic cosine
    acosh => Acosh,
    /// Elementwise inverse hyperbolic tangent
    atanh => Atanh,
    /// Elementwise exponential
    exp => Exp,
    /// Elementwise natural logarithm
    log => Log,
    /// Elementwise square root
    sqrt => Sqrt,
    /// Negation
    negate => Negate,
    /// Transpose
    transpose => Transpose,
    /// Conjugate transpose
    ctranspose => Ctranspose,
    /// Matrix inverse
    inv => Inv,
    /// Moore-Penrose pseudo-inverse
    pinv => Pinv,
    /// 2-norm: Euclidean norm for vectors, largest singular value for matrices
    norm2 => Norm2,
    /// Column sums, producing a 1 x n row vector
    sumcols => Sumcols,
    /// Row sums, producing an m x 1 column vector
    sumrows => Sumrows,
}

binary_ops! {
    /// Elementwise addition; scalars broadcast against matrices
    plus => Plus,
    /// Elementwise subtraction; scalars broadcast against matrices
    minus => Minus,
    /// Elementwise multiplication; scalars broadcast against matrices
    times => Times,
    /// Elementwise (right) division; scalars broadcast against matrices
    rdivide => Rdivide,
    /// Matrix multiply
    mtimes => Mtimes,
    /// Left division: `mldivide(a, b)` solves `a * x = b`
    mldivide => Mldivide,
}

/// LU decomposition of `a`, consumed through [`LuView`]
pub fn lu(a: &NodeRef) -> LuView {
    LuView::over(unary(Tag::Lu, a))
}

/// QR decomposition of `a`, consumed through [`QrView`]
pub fn qr(a: &NodeRef) -> QrView {
    QrView::over(unary(Tag::Qr, a))
}

/// Singular value decomposition of `a`, consumed through [`SvdView`]
pub fn svd(a: &NodeRef) -> SvdView {
    SvdView::over(unary(Tag::Svd, a))
}
