//! The in-process reference engine
//!
//! A portable implementation of the engine contract: graphs are evaluated
//! bottom-up in dense space, memoized by node address so a subgraph shared
//! by several parents computes exactly once. Terminal nodes pass through
//! in their own concrete variant; computed results are dense (or scalar
//! for reductions), which is this engine's canonical form.
//!
//! Decompositions (SVD, QR, pseudo-inverse, matrix 2-norm, rectangular
//! left-division) are supported in the real domain; complex operands to
//! those operations are reported as computation failures.

mod field;
mod kernels;
mod linalg;

use super::iss::InstructionSet;
use super::{Engine, EngineFailure, EngineResult};
use crate::container::{Complex64, DenseMatrix, DiagonalMatrix, Terminal};
use crate::graph::{Expression, Node, NodeRef, Tag};
use field::Field;
use std::collections::HashMap;
use std::sync::Arc;

/// The reference engine
pub struct CpuEngine {
    tier: InstructionSet,
}

impl CpuEngine {
    /// Create a reference engine resolved at the given tier
    pub fn new(tier: InstructionSet) -> Self {
        Self { tier }
    }
}

impl Engine for CpuEngine {
    fn name(&self) -> &str {
        "cpu"
    }

    fn tier(&self) -> InstructionSet {
        self.tier
    }

    fn materialise(&self, root: &NodeRef) -> EngineResult<Terminal> {
        let mut outputs = eval(root)?;
        if outputs.len() != 1 {
            return Err(EngineFailure::computation(format!(
                "{} produces {} results and cannot be consumed as a single value; \
                 select one result",
                root.tag().name(),
                outputs.len()
            )));
        }
        Ok(outputs.remove(0))
    }
}

type Outputs = Vec<Terminal>;

/// Evaluate the graph bottom-up, memoizing by node address.
///
/// Iterative post-order: deeply chained graphs must not overflow the
/// stack. A node reachable along several paths is computed once.
fn eval(root: &NodeRef) -> EngineResult<Outputs> {
    enum Visit {
        Enter(NodeRef),
        Exit(NodeRef),
    }
    let mut memo: HashMap<*const Node, Outputs> = HashMap::new();
    let mut stack = vec![Visit::Enter(root.clone())];
    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(node) => {
                if memo.contains_key(&Arc::as_ptr(&node)) {
                    continue;
                }
                match &*node {
                    Node::Terminal(_) => stack.push(Visit::Exit(node)),
                    Node::Expression(e) => {
                        let args: Vec<NodeRef> = e.args().to_vec();
                        stack.push(Visit::Exit(node));
                        for arg in args {
                            stack.push(Visit::Enter(arg));
                        }
                    }
                }
            }
            Visit::Exit(node) => {
                let key = Arc::as_ptr(&node);
                if memo.contains_key(&key) {
                    continue;
                }
                let outputs = match &*node {
                    Node::Terminal(t) => vec![t.clone()],
                    Node::Expression(e) => apply(e, &memo)?,
                };
                memo.insert(key, outputs);
            }
        }
    }
    memo.remove(&Arc::as_ptr(root))
        .ok_or_else(|| EngineFailure::unspecified("evaluation produced no result for the root"))
}

/// Evaluate one expression over its memoized argument outputs
fn apply(e: &Expression, memo: &HashMap<*const Node, Outputs>) -> EngineResult<Outputs> {
    let arg_outputs: Vec<&Outputs> = e
        .args()
        .iter()
        .map(|a| &memo[&Arc::as_ptr(a)])
        .collect();

    // Projections resolve against the produced result count
    if e.tag() == Tag::SelectResult {
        return select(arg_outputs[0], arg_outputs[1]);
    }

    // every other operation consumes single-valued arguments
    let mut args: Vec<&Terminal> = Vec::with_capacity(arg_outputs.len());
    for outputs in &arg_outputs {
        match outputs.as_slice() {
            [single] => args.push(single),
            many => {
                return Err(EngineFailure::computation(format!(
                    "a {}-result node cannot be consumed directly as an argument",
                    many.len()
                )))
            }
        }
    }

    match e.tag() {
        Tag::Copy => Ok(vec![args[0].clone()]),
        Tag::Plus | Tag::Minus | Tag::Times | Tag::Rdivide => {
            Ok(vec![binary_elementwise(e.tag(), args[0], args[1])?])
        }
        Tag::Mtimes => Ok(vec![binary_matmul(args[0], args[1])?]),
        Tag::Mldivide => Ok(vec![left_divide(args[0], args[1])?]),
        Tag::Negate => Ok(vec![unary_map(args[0], |x: f64| -x, |z: Complex64| -z)?]),
        Tag::Transpose => Ok(vec![if args[0].is_complex_domain() {
            to_terminal(kernels::transpose(&args[0].to_complex_dense()))
        } else {
            to_terminal(kernels::transpose(&widen_real(args[0])?))
        }]),
        Tag::Ctranspose => Ok(vec![if args[0].is_complex_domain() {
            to_terminal(kernels::conj_transpose(&args[0].to_complex_dense()))
        } else {
            to_terminal(kernels::transpose(&widen_real(args[0])?))
        }]),
        Tag::Sumcols => Ok(vec![if args[0].is_complex_domain() {
            to_terminal(kernels::sumcols(&args[0].to_complex_dense()))
        } else {
            to_terminal(kernels::sumcols(&widen_real(args[0])?))
        }]),
        Tag::Sumrows => Ok(vec![if args[0].is_complex_domain() {
            to_terminal(kernels::sumrows(&args[0].to_complex_dense()))
        } else {
            to_terminal(kernels::sumrows(&widen_real(args[0])?))
        }]),
        Tag::Inv => Ok(vec![if args[0].is_complex_domain() {
            to_terminal(linalg::inverse(&args[0].to_complex_dense())?)
        } else {
            to_terminal(linalg::inverse(&widen_real(args[0])?)?)
        }]),
        Tag::Norm2 => Ok(vec![norm2(args[0])?]),
        Tag::Pinv => {
            let a = real_only(args[0], "pinv")?;
            Ok(vec![to_terminal(linalg::pinv(&a))])
        }
        Tag::Lu => {
            if args[0].is_complex_domain() {
                let (l, u) = linalg::lu_factor(&args[0].to_complex_dense());
                Ok(vec![to_terminal(l), to_terminal(u)])
            } else {
                let (l, u) = linalg::lu_factor(&widen_real(args[0])?);
                Ok(vec![to_terminal(l), to_terminal(u)])
            }
        }
        Tag::Qr => {
            let a = real_only(args[0], "qr")?;
            let (q, r) = linalg::qr_factor(&a, false);
            Ok(vec![to_terminal(q), to_terminal(r)])
        }
        Tag::Svd => {
            let a = real_only(args[0], "svd")?;
            let f = linalg::svd_factor(&a);
            let k = f.s.len();
            let s = Terminal::RealDiagonal(
                DiagonalMatrix::new(f.s, k, k).expect("singular values fit a k x k diagonal"),
            );
            Ok(vec![to_terminal(f.u), s, to_terminal(f.vt)])
        }
        tag => {
            let (rf, cf) = unary_fns(tag).ok_or_else(|| {
                EngineFailure::unspecified(format!("no kernel registered for {}", tag.name()))
            })?;
            Ok(vec![unary_map(args[0], rf, cf)?])
        }
    }
}

/// Resolve a projection: pick one output of a multi-output argument
fn select(target: &Outputs, index: &Outputs) -> EngineResult<Outputs> {
    let [Terminal::IntegerScalar(idx)] = index.as_slice() else {
        return Err(EngineFailure::computation(
            "projection index must be an integer scalar",
        ));
    };
    let n = target.len() as i64;
    if *idx < 0 || *idx >= n {
        return Err(EngineFailure::computation(format!(
            "projection index {idx} out of range for {n} results"
        )));
    }
    Ok(vec![target[*idx as usize].clone()])
}

fn to_terminal<T: Field>(m: DenseMatrix<T>) -> Terminal {
    let (rows, cols, data) = m.into_raw();
    T::dense_terminal(rows, cols, data)
}

/// Widen a real-domain terminal to dense real; a complex operand reaching
/// this path is a conversion fault, not a caller error
fn widen_real(t: &Terminal) -> EngineResult<DenseMatrix<f64>> {
    t.to_real_dense()
        .map_err(|e| EngineFailure::conversion(e.to_string()))
}

fn real_only(t: &Terminal, op: &str) -> EngineResult<DenseMatrix<f64>> {
    if t.is_complex_domain() {
        return Err(EngineFailure::computation(format!(
            "{op} is not supported for complex operands by this engine"
        )));
    }
    widen_real(t)
}

fn binary_elementwise(tag: Tag, a: &Terminal, b: &Terminal) -> EngineResult<Terminal> {
    if a.is_complex_domain() || b.is_complex_domain() {
        kernels::elementwise(tag, &a.to_complex_dense(), &b.to_complex_dense()).map(to_terminal)
    } else {
        kernels::elementwise(tag, &widen_real(a)?, &widen_real(b)?).map(to_terminal)
    }
}

fn binary_matmul(a: &Terminal, b: &Terminal) -> EngineResult<Terminal> {
    if a.is_complex_domain() || b.is_complex_domain() {
        kernels::matmul(&a.to_complex_dense(), &b.to_complex_dense()).map(to_terminal)
    } else {
        kernels::matmul(&widen_real(a)?, &widen_real(b)?).map(to_terminal)
    }
}

fn left_divide(a: &Terminal, b: &Terminal) -> EngineResult<Terminal> {
    let (m, n) = a.shape();
    if a.is_complex_domain() || b.is_complex_domain() {
        if m != n {
            return Err(EngineFailure::computation(
                "mldivide is not supported for rectangular complex systems by this engine",
            ));
        }
        linalg::solve(&a.to_complex_dense(), &b.to_complex_dense()).map(to_terminal)
    } else if m == n {
        linalg::solve(&widen_real(a)?, &widen_real(b)?).map(to_terminal)
    } else {
        linalg::lstsq(&widen_real(a)?, &widen_real(b)?).map(to_terminal)
    }
}

fn norm2(t: &Terminal) -> EngineResult<Terminal> {
    let (m, n) = t.shape();
    let value = if m == 1 || n == 1 {
        // scalars and vectors: Euclidean norm, complex included
        kernels::vector_norm2(&t.to_complex_dense())
    } else if t.is_complex_domain() {
        return Err(EngineFailure::computation(
            "norm2 is not supported for complex matrices by this engine",
        ));
    } else {
        linalg::matrix_norm2(&widen_real(t)?)
    };
    Ok(Terminal::RealScalar(value))
}

fn unary_map(
    t: &Terminal,
    rf: impl Fn(f64) -> f64,
    cf: impl Fn(Complex64) -> Complex64,
) -> EngineResult<Terminal> {
    if t.is_complex_domain() {
        Ok(to_terminal(kernels::map(&t.to_complex_dense(), cf)))
    } else {
        Ok(to_terminal(kernels::map(&widen_real(t)?, rf)))
    }
}

/// The elementwise function family, in both domains
#[allow(clippy::type_complexity)]
fn unary_fns(tag: Tag) -> Option<(fn(f64) -> f64, fn(Complex64) -> Complex64)> {
    Some(match tag {
        Tag::Sin => (f64::sin, Complex64::sin),
        Tag::Cos => (f64::cos, Complex64::cos),
        Tag::Tan => (f64::tan, Complex64::tan),
        Tag::Asin => (f64::asin, Complex64::asin),
        Tag::Acos => (f64::acos, Complex64::acos),
        Tag::Atan => (f64::atan, Complex64::atan),
        Tag::Sinh => (f64::sinh, Complex64::sinh),
        Tag::Cosh => (f64::cosh, Complex64::cosh),
        Tag::Tanh => (f64::tanh, Complex64::tanh),
        Tag::Asinh => (f64::asinh, Complex64::asinh),
        Tag::Acosh => (f64::acosh, Complex64::acosh),
        Tag::Atanh => (f64::atanh, Complex64::atanh),
        Tag::Exp => (f64::exp, Complex64::exp),
        Tag::Log => (f64::ln, Complex64::ln),
        Tag::Sqrt => (f64::sqrt, Complex64::sqrt),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build::{plus, sin, terminal, times};

    fn engine() -> CpuEngine {
        CpuEngine::new(InstructionSet::Standard)
    }

    #[test]
    fn terminals_pass_through_in_their_own_variant() {
        let t = Terminal::real_sparse(2, 2, &[(0, 0, 1.0), (1, 1, 2.0)]).unwrap();
        let out = engine().materialise(&terminal(t.clone())).unwrap();
        assert_eq!(out, t);
    }

    #[test]
    fn shared_subgraphs_compute_once_and_consistently() {
        let a = terminal(Terminal::real_scalar(3.0));
        let shared = sin(&a);
        let root = times(&plus(&shared, &shared), &shared);
        let out = engine().materialise(&root).unwrap();
        let s = 3.0f64.sin();
        let expected = Terminal::real_dense(vec![2.0 * s * s], 1, 1).unwrap();
        assert!(out.fuzzy_equals(&expected));
    }

    #[test]
    fn variadic_roots_cannot_be_consumed_directly() {
        let a = terminal(Terminal::real_dense(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap());
        let view = crate::graph::build::svd(&a);
        let err = engine().materialise(view.node()).unwrap_err();
        assert_eq!(err.kind, crate::engine::FailureKind::Computation);
    }
}
