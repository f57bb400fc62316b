//! # lindag
//!
//! **Deferred linear-algebra expression graphs with a pluggable compute engine.**
//!
//! lindag lets a caller describe scalar/matrix arithmetic, elementwise
//! transforms, and decompositions over real and complex data as an immutable
//! expression DAG, without performing any computation. A separate
//! materialization step lowers a graph to concrete results by handing the
//! whole graph to a compute engine in one request.
//!
//! ## Architecture
//!
//! ```text
//! graph (node model)          container (terminals + equality)
//!        \                      /
//!         dispatch (materialization entry points)
//!                |
//!         engine (bootstrap, reference CPU engine, native interop)
//! ```
//!
//! - **Graphs are cheap and pure**: nodes are reference-counted, immutable,
//!   and thread-shareable; building an expression never computes anything.
//! - **Materialization is explicit**: [`dispatch::to_terminal`] and friends
//!   block, run the one-time engine bootstrap on first use, and translate
//!   engine failures into the typed error taxonomy in [`error`].
//! - **Engines are swappable**: with no native artifacts configured, a
//!   portable in-process reference engine computes results; a configuration
//!   resource can instead point the bootstrap at dynamically loaded native
//!   artifacts selected by CPU instruction-set tier.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lindag::prelude::*;
//!
//! let a = terminal(Terminal::real_dense(vec![1.0, 2.0, 3.0, 4.0], 2, 2)?);
//! let b = terminal(Terminal::real_scalar(10.0));
//!
//! let sum = plus(&a, &b);
//! let values = to_real_array(&sum)?;          // [[11, 12], [13, 14]]
//!
//! let f = svd(&a)?;
//! let reconstructed = mtimes(&mtimes(&f.u(), &f.s()), &f.vt());
//! assert!(to_terminal(&reconstructed)?.maths_equals(&to_terminal(&a)?));
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): multi-threaded dense kernels in the reference engine

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod container;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod graph;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::container::{Complex64, Terminal};
    pub use crate::dispatch::{
        to_boolean, to_complex_parts, to_real_array, to_terminal, ComplexParts,
    };
    pub use crate::error::{Error, Result};
    pub use crate::graph::build::*;
    pub use crate::graph::result::{LuView, QrView, ResultView, SvdView};
    pub use crate::graph::{Expression, Node, NodeRef, Tag};
}
