//! The expression node model
//!
//! A graph is built from reference-counted [`Node`]s: terminals holding
//! materialized data, and expressions combining existing nodes under an
//! operation [`Tag`]. Arguments are references to existing nodes, never
//! copies, so explicitly reusing a [`NodeRef`] produces a DAG; a cycle is
//! unrepresentable because an expression can only reference nodes that
//! already exist.
//!
//! Node identity is reference identity. Two independently built,
//! structurally identical subexpressions are distinct nodes, and no
//! canonicalization or hash-consing is ever performed at this layer —
//! whether structural deduplication pays off is the engine's concern.

pub mod build;
pub mod result;
mod tag;

pub use tag::Tag;

use crate::container::Terminal;
use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::sync::Arc;

/// Shared handle to a node; the graph's unit of ownership.
///
/// A node lives as long as its longest holder: any referring parent
/// expression or any caller-held handle.
pub type NodeRef = Arc<Node>;

/// A node in an expression graph
#[derive(Debug)]
pub enum Node {
    /// A node holding already-materialized data
    Terminal(Terminal),
    /// A deferred operation over existing nodes
    Expression(Expression),
}

impl Node {
    /// The registry tag of this node
    pub fn tag(&self) -> Tag {
        match self {
            Self::Terminal(t) => t.tag(),
            Self::Expression(e) => e.tag(),
        }
    }

    /// The terminal payload, if this is a terminal node
    pub fn as_terminal(&self) -> Option<&Terminal> {
        match self {
            Self::Terminal(t) => Some(t),
            Self::Expression(_) => None,
        }
    }

    /// The expression payload, if this is an expression node
    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            Self::Terminal(_) => None,
            Self::Expression(e) => Some(e),
        }
    }
}

/// A deferred operation with an ordered, fixed argument list.
///
/// Immutable from construction: the tag, the arguments, and the declared
/// result count never change. Expressions whose tag declares more than one
/// result (LU, QR, SVD) cannot be consumed directly as a single value; one
/// output is extracted with [`select_result`].
#[derive(Debug)]
pub struct Expression {
    tag: Tag,
    args: SmallVec<[NodeRef; 2]>,
    n_results: u32,
}

impl Expression {
    /// Construct an expression, validating the argument list against the tag.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when `tag` is a container token, the
    /// argument list is empty or does not match the tag's declared arity,
    /// or (for [`Tag::SelectResult`]) the projection is malformed.
    pub fn new(tag: Tag, args: Vec<NodeRef>) -> Result<Self> {
        let Some(arity) = tag.arity() else {
            return Err(Error::invalid_argument(format!(
                "{} is a container token, not an operation",
                tag.name()
            )));
        };
        if args.is_empty() {
            return Err(Error::invalid_argument(
                "expression requires at least one argument",
            ));
        }
        if args.len() != arity {
            return Err(Error::invalid_argument(format!(
                "{} takes {} argument(s), got {}",
                tag.name(),
                arity,
                args.len()
            )));
        }
        if tag == Tag::SelectResult {
            validate_projection(&args[0], &args[1])?;
        }
        Ok(Self {
            tag,
            args: SmallVec::from_vec(args),
            n_results: tag.result_count(),
        })
    }

    // Infallible internal constructor for the builder functions, which
    // uphold the arity invariants by construction.
    pub(crate) fn from_parts(tag: Tag, args: SmallVec<[NodeRef; 2]>) -> Self {
        debug_assert_eq!(tag.arity(), Some(args.len()));
        Self {
            tag,
            args,
            n_results: tag.result_count(),
        }
    }

    /// The operation tag
    #[inline]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Number of arguments
    #[inline]
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Argument at `index`
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when `index` is out of range.
    pub fn arg(&self, index: usize) -> Result<&NodeRef> {
        self.args.get(index).ok_or_else(|| {
            Error::invalid_argument(format!(
                "argument index {} out of range for {} with {} argument(s)",
                index,
                self.tag.name(),
                self.args.len()
            ))
        })
    }

    /// All arguments, in order
    #[inline]
    pub fn args(&self) -> &[NodeRef] {
        &self.args
    }

    /// Declared number of results this expression produces when evaluated
    #[inline]
    pub fn result_count(&self) -> u32 {
        self.n_results
    }

    /// True when this expression declares more than one result
    #[inline]
    pub fn is_variadic_result(&self) -> bool {
        self.n_results > 1
    }
}

fn validate_projection(target: &NodeRef, index: &NodeRef) -> Result<()> {
    let n = declared_result_count(target);
    if n <= 1 {
        return Err(Error::invalid_argument(
            "projection target must declare more than one result",
        ));
    }
    let Some(&Terminal::IntegerScalar(idx)) = index.as_terminal() else {
        return Err(Error::invalid_argument(
            "projection index must be an integer scalar terminal",
        ));
    };
    if idx < 0 || idx >= i64::from(n) {
        return Err(Error::invalid_argument(format!(
            "projection index {idx} out of range for {n} results"
        )));
    }
    Ok(())
}

fn declared_result_count(node: &NodeRef) -> u32 {
    match node.as_expression() {
        Some(e) => e.result_count(),
        None => 1,
    }
}

/// Project one output of a variadic-result expression.
///
/// The sole mechanism for extracting a single output of a multi-output
/// node, letting ordinary single-result consumers treat it uniformly.
///
/// # Errors
///
/// [`Error::InvalidArgument`] when `target` does not declare more than one
/// result, or `index` is outside `0..target.result_count()`.
pub fn select_result(target: &NodeRef, index: i64) -> Result<NodeRef> {
    let n = declared_result_count(target);
    if n <= 1 {
        return Err(Error::invalid_argument(format!(
            "{} declares a single result; nothing to select",
            target.tag().name()
        )));
    }
    if index < 0 || index >= i64::from(n) {
        return Err(Error::invalid_argument(format!(
            "projection index {index} out of range for {n} results"
        )));
    }
    let idx_node = Arc::new(Node::Terminal(Terminal::integer_scalar(index)));
    let args = SmallVec::from_vec(vec![Arc::clone(target), idx_node]);
    Ok(Arc::new(Node::Expression(Expression::from_parts(
        Tag::SelectResult,
        args,
    ))))
}
