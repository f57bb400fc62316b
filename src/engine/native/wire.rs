//! Wire encoding of graphs and results for the native engine boundary
//!
//! The graph is lowered to four flat arenas — a node table plus argument,
//! real, and integer pools — shipped across the C ABI in one request. A
//! node shared by several parents is encoded exactly once and referenced
//! by index, so the engine sees the sharing and need not recompute it.
//!
//! Payload encodings by tag:
//!
//! | tag              | reals                  | ints                       |
//! |------------------|------------------------|----------------------------|
//! | RealScalar       | `[v]`                  | —                          |
//! | ComplexScalar    | `[re, im]`             | —                          |
//! | IntegerScalar    | —                      | `[v]`                      |
//! | RealDense        | row-major cells        | —                          |
//! | ComplexDense     | interleaved cells      | —                          |
//! | RealSparse       | stored values          | `indptr ++ indices`        |
//! | ComplexSparse    | interleaved values     | `indptr ++ indices`        |
//! | RealDiagonal     | diagonal               | —                          |
//! | ComplexDiagonal  | interleaved diagonal   | —                          |
//! | Logical          | —                      | row-major 0/1 cells        |
//! | operations       | —                      | — (arguments by index)     |

use crate::container::{Complex64, Terminal};
use crate::engine::EngineFailure;
use crate::graph::{Node, NodeRef, Tag};
use std::collections::HashMap;

/// One entry of the flattened node table
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WireNode {
    /// Registry code of the node's tag
    pub tag: u64,
    /// Rows for terminals; 0 for operations
    pub rows: u64,
    /// Cols for terminals; 0 for operations
    pub cols: u64,
    /// Start of this node's argument indices in the argument pool
    pub arg_start: u64,
    /// Number of argument indices
    pub arg_len: u64,
    /// Start of this node's payload in the real pool
    pub real_start: u64,
    /// Number of payload reals
    pub real_len: u64,
    /// Start of this node's payload in the integer pool
    pub int_start: u64,
    /// Number of payload integers
    pub int_len: u64,
}

/// A flattened graph request.
///
/// Nodes are in dependency order: every argument index refers to an
/// earlier entry, and the final entry is the root.
#[derive(Debug, Default)]
pub struct WireGraph {
    /// The node table, root last
    pub nodes: Vec<WireNode>,
    /// Argument index pool
    pub args: Vec<u64>,
    /// Real payload pool
    pub reals: Vec<f64>,
    /// Integer payload pool
    pub ints: Vec<i64>,
}

impl WireGraph {
    /// Index of the root node (always the last entry)
    pub fn root(&self) -> u64 {
        (self.nodes.len() - 1) as u64
    }
}

/// Flatten the graph rooted at `root` into wire form.
///
/// Deduplication is by node address: the same `NodeRef` reachable along
/// several paths appears once in the table. Structurally identical but
/// distinct nodes are *not* merged, matching the graph layer's
/// no-canonicalization contract.
pub fn flatten(root: &NodeRef) -> WireGraph {
    let mut graph = WireGraph::default();
    let mut seen: HashMap<*const Node, u64> = HashMap::new();

    // iterative post-order so deep chains cannot overflow the stack
    enum Visit {
        Enter(NodeRef),
        Exit(NodeRef),
    }
    let mut stack = vec![Visit::Enter(root.clone())];
    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(node) => {
                let key = std::sync::Arc::as_ptr(&node);
                if seen.contains_key(&key) {
                    continue;
                }
                match &*node {
                    Node::Terminal(_) => {
                        stack.push(Visit::Exit(node));
                    }
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
                let key = std::sync::Arc::as_ptr(&node);
                if seen.contains_key(&key) {
                    continue;
                }
                let index = encode_node(&mut graph, &node, &seen);
                seen.insert(key, index);
            }
        }
    }
    graph
}

fn encode_node(graph: &mut WireGraph, node: &NodeRef, seen: &HashMap<*const Node, u64>) -> u64 {
    let mut entry = WireNode {
        tag: node.tag().code(),
        rows: 0,
        cols: 0,
        arg_start: graph.args.len() as u64,
        arg_len: 0,
        real_start: graph.reals.len() as u64,
        real_len: 0,
        int_start: graph.ints.len() as u64,
        int_len: 0,
    };
    match &**node {
        Node::Expression(e) => {
            for arg in e.args() {
                let key = std::sync::Arc::as_ptr(arg);
                graph
                    .args
                    .push(*seen.get(&key).expect("arguments encode before parents"));
            }
            entry.arg_len = e.arg_count() as u64;
        }
        Node::Terminal(t) => {
            let (rows, cols) = t.shape();
            entry.rows = rows as u64;
            entry.cols = cols as u64;
            encode_terminal_payload(graph, t);
            entry.real_len = graph.reals.len() as u64 - entry.real_start;
            entry.int_len = graph.ints.len() as u64 - entry.int_start;
        }
    }
    graph.nodes.push(entry);
    (graph.nodes.len() - 1) as u64
}

fn encode_terminal_payload(graph: &mut WireGraph, t: &Terminal) {
    match t {
        Terminal::RealScalar(v) => graph.reals.push(*v),
        Terminal::ComplexScalar(v) => graph.reals.extend_from_slice(&[v.re, v.im]),
        Terminal::IntegerScalar(v) => graph.ints.push(*v),
        Terminal::RealDense(m) => graph.reals.extend_from_slice(m.data()),
        Terminal::ComplexDense(m) => graph
            .reals
            .extend_from_slice(bytemuck::cast_slice(m.data())),
        Terminal::RealSparse(m) => {
            graph.ints.extend(m.indptr().iter().map(|&v| v as i64));
            graph.ints.extend(m.indices().iter().map(|&v| v as i64));
            graph.reals.extend_from_slice(m.data());
        }
        Terminal::ComplexSparse(m) => {
            graph.ints.extend(m.indptr().iter().map(|&v| v as i64));
            graph.ints.extend(m.indices().iter().map(|&v| v as i64));
            graph
                .reals
                .extend_from_slice(bytemuck::cast_slice(m.data()));
        }
        Terminal::RealDiagonal(m) => graph.reals.extend_from_slice(m.data()),
        Terminal::ComplexDiagonal(m) => graph
            .reals
            .extend_from_slice(bytemuck::cast_slice(m.data())),
        Terminal::Logical(m) => graph.ints.extend(m.data().iter().map(|&v| i64::from(v))),
    }
}

/// Decode a terminal from its wire payload.
///
/// The inverse of the request encoding, used for engine results.
///
/// # Errors
///
/// A conversion-kind [`EngineFailure`] on an unknown tag, a non-container
/// tag, or payload lengths inconsistent with the declared shape.
pub fn decode_terminal(
    tag_code: u64,
    rows: usize,
    cols: usize,
    reals: &[f64],
    ints: &[i64],
) -> Result<Terminal, EngineFailure> {
    let Some(tag) = Tag::from_code(tag_code) else {
        return Err(EngineFailure::conversion(format!(
            "unknown tag code 0x{tag_code:04X} in engine result"
        )));
    };
    let malformed =
        |what: &str| EngineFailure::conversion(format!("malformed {what} payload in engine result"));
    let terminal = match tag {
        Tag::RealScalar => {
            Terminal::RealScalar(*reals.first().ok_or_else(|| malformed("real scalar"))?)
        }
        Tag::ComplexScalar => {
            if reals.len() != 2 {
                return Err(malformed("complex scalar"));
            }
            Terminal::ComplexScalar(Complex64::new(reals[0], reals[1]))
        }
        Tag::IntegerScalar => {
            Terminal::IntegerScalar(*ints.first().ok_or_else(|| malformed("integer scalar"))?)
        }
        Tag::RealDenseMatrix => Terminal::real_dense(reals.to_vec(), rows, cols)
            .map_err(|_| malformed("real dense"))?,
        Tag::ComplexDenseMatrix => {
            if reals.len() % 2 != 0 {
                return Err(malformed("complex dense"));
            }
            let cells: &[Complex64] = bytemuck::cast_slice(reals);
            Terminal::complex_dense(cells.to_vec(), rows, cols)
                .map_err(|_| malformed("complex dense"))?
        }
        Tag::RealSparseMatrix => {
            let (indptr, indices) = split_sparse_ints(ints, rows, reals.len())
                .ok_or_else(|| malformed("real sparse"))?;
            Terminal::RealSparse(
                crate::container::SparseMatrix::new(rows, cols, indptr, indices, reals.to_vec())
                    .map_err(|_| malformed("real sparse"))?,
            )
        }
        Tag::ComplexSparseMatrix => {
            if reals.len() % 2 != 0 {
                return Err(malformed("complex sparse"));
            }
            let cells: &[Complex64] = bytemuck::cast_slice(reals);
            let (indptr, indices) = split_sparse_ints(ints, rows, cells.len())
                .ok_or_else(|| malformed("complex sparse"))?;
            Terminal::ComplexSparse(
                crate::container::SparseMatrix::new(rows, cols, indptr, indices, cells.to_vec())
                    .map_err(|_| malformed("complex sparse"))?,
            )
        }
        Tag::RealDiagonalMatrix => Terminal::real_diagonal(reals.to_vec(), rows, cols)
            .map_err(|_| malformed("real diagonal"))?,
        Tag::ComplexDiagonalMatrix => {
            if reals.len() % 2 != 0 {
                return Err(malformed("complex diagonal"));
            }
            let cells: &[Complex64] = bytemuck::cast_slice(reals);
            Terminal::complex_diagonal(cells.to_vec(), rows, cols)
                .map_err(|_| malformed("complex diagonal"))?
        }
        Tag::LogicalMatrix => {
            let cells: Option<Vec<u8>> = ints.iter().map(|&v| u8::try_from(v).ok()).collect();
            Terminal::logical(cells.ok_or_else(|| malformed("logical"))?, rows, cols)
                .map_err(|_| malformed("logical"))?
        }
        other => {
            return Err(EngineFailure::conversion(format!(
                "engine result tag {} is not a container",
                other.name()
            )))
        }
    };
    Ok(terminal)
}

fn split_sparse_ints(
    ints: &[i64],
    rows: usize,
    nnz: usize,
) -> Option<(Vec<usize>, Vec<usize>)> {
    if ints.len() != rows + 1 + nnz {
        return None;
    }
    let to_usize = |v: &i64| usize::try_from(*v).ok();
    let indptr: Option<Vec<usize>> = ints[..rows + 1].iter().map(to_usize).collect();
    let indices: Option<Vec<usize>> = ints[rows + 1..].iter().map(to_usize).collect();
    Some((indptr?, indices?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build::{mtimes, plus, terminal};

    #[test]
    fn shared_subgraphs_encode_exactly_once() {
        let a = terminal(Terminal::real_dense(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap());
        let shared = plus(&a, &a);
        let root = mtimes(&shared, &shared);

        let wire = flatten(&root);
        // a, plus, mtimes: three nodes despite four reference paths
        assert_eq!(wire.nodes.len(), 3);
        assert_eq!(wire.root(), 2);

        let plus_node = &wire.nodes[1];
        let mtimes_node = &wire.nodes[2];
        assert_eq!(plus_node.tag, Tag::Plus.code());
        assert_eq!(mtimes_node.tag, Tag::Mtimes.code());
        // both mtimes arguments point at the one plus entry
        let args = &wire.args
            [mtimes_node.arg_start as usize..(mtimes_node.arg_start + mtimes_node.arg_len) as usize];
        assert_eq!(args, &[1, 1]);
    }

    #[test]
    fn distinct_but_identical_nodes_stay_distinct() {
        let a = terminal(Terminal::real_scalar(1.0));
        let b = terminal(Terminal::real_scalar(1.0));
        let root = plus(&a, &b);
        let wire = flatten(&root);
        assert_eq!(wire.nodes.len(), 3);
    }

    #[test]
    fn terminal_payloads_round_trip() {
        let cases = [
            Terminal::real_scalar(2.5),
            Terminal::complex_scalar(1.0, -3.0),
            Terminal::integer_scalar(7),
            Terminal::real_dense(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap(),
            Terminal::complex_dense(
                vec![
                    Complex64::new(1.0, 2.0),
                    Complex64::new(3.0, 4.0),
                    Complex64::new(5.0, 6.0),
                    Complex64::new(7.0, 8.0),
                ],
                2,
                2,
            )
            .unwrap(),
            Terminal::real_sparse(2, 3, &[(0, 1, 5.0), (1, 2, -1.0)]).unwrap(),
            Terminal::real_diagonal(vec![1.0, 2.0], 3, 3).unwrap(),
            Terminal::logical(vec![1, 0, 0, 1], 2, 2).unwrap(),
        ];
        for t in cases {
            let root = terminal(t.clone());
            let wire = flatten(&root);
            let node = &wire.nodes[0];
            let reals =
                &wire.reals[node.real_start as usize..(node.real_start + node.real_len) as usize];
            let ints =
                &wire.ints[node.int_start as usize..(node.int_start + node.int_len) as usize];
            let back = decode_terminal(
                node.tag,
                node.rows as usize,
                node.cols as usize,
                reals,
                ints,
            )
            .unwrap();
            assert_eq!(back, t);
        }
    }

    #[test]
    fn malformed_payloads_are_conversion_failures() {
        let err = decode_terminal(0xFFFF, 1, 1, &[], &[]).unwrap_err();
        assert_eq!(err.kind, crate::engine::FailureKind::Conversion);
        let err = decode_terminal(Tag::RealDenseMatrix.code(), 2, 2, &[1.0], &[]).unwrap_err();
        assert_eq!(err.kind, crate::engine::FailureKind::Conversion);
        let err = decode_terminal(Tag::Plus.code(), 0, 0, &[], &[]).unwrap_err();
        assert_eq!(err.kind, crate::engine::FailureKind::Conversion);
    }
}
