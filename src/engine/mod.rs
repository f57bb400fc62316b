//! Compute engines and the one-time native bootstrap
//!
//! This module defines the engine contract and provides two implementations:
//!
//! ```text
//! Engine (contract: whole graph in, canonical terminal out)
//! ├── cpu     (portable in-process reference engine)
//! └── native  (interop engine over dynamically loaded artifacts)
//! ```
//!
//! Which engine serves a process is decided exactly once by the
//! [`bootstrap`] state machine: platform gating, configuration,
//! instruction-set-tier resolution, and artifact extraction/loading. A
//! configuration that names no artifacts resolves to the reference engine.

pub mod bootstrap;
pub mod config;
pub mod cpu;
pub mod extract;
pub mod iss;
pub mod native;
pub mod platform;

use crate::container::Terminal;
use crate::error::NativeFrame;
use crate::graph::NodeRef;
use iss::InstructionSet;

/// The kind of a structured engine failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The engine ran but the requested operation is invalid
    Computation,
    /// Translating the graph or result across the boundary failed
    Conversion,
    /// An engine-side fault with no structured detail
    Unspecified,
}

/// A structured failure reported by an engine.
///
/// Engines that can walk their own stack attach ordered native frames;
/// the dispatch layer splices them into the typed error it raises.
#[derive(Debug, Clone)]
pub struct EngineFailure {
    /// Failure kind, selecting the typed error raised at the boundary
    pub kind: FailureKind,
    /// Human-readable description
    pub message: String,
    /// Native call frames, outermost last; empty when unavailable
    pub frames: Vec<NativeFrame>,
}

impl EngineFailure {
    /// A computation-kind failure with no frames
    pub fn computation(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Computation,
            message: message.into(),
            frames: Vec::new(),
        }
    }

    /// A conversion-kind failure with no frames
    pub fn conversion(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Conversion,
            message: message.into(),
            frames: Vec::new(),
        }
    }

    /// An unspecified failure
    pub fn unspecified(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Unspecified,
            message: message.into(),
            frames: Vec::new(),
        }
    }

    /// Attach native frames
    pub fn with_frames(mut self, frames: Vec<NativeFrame>) -> Self {
        self.frames = frames;
        self
    }
}

/// Outcome of handing a graph to an engine
pub type EngineResult<T> = std::result::Result<T, EngineFailure>;

/// Contract between the dispatch layer and a compute engine.
///
/// An engine receives the *entire* graph in one request — never a
/// pre-flattened copy at this seam — and is responsible for not recomputing
/// shared subgraphs and for resolving each projection against its target's
/// declared result count. Implementations must be safe to call from
/// independent threads; calls never mutate nodes.
pub trait Engine: Send + Sync {
    /// Human-readable name of this engine
    fn name(&self) -> &str;

    /// The instruction-set tier this engine was resolved for
    fn tier(&self) -> InstructionSet;

    /// Lower the graph rooted at `root` to a single canonical terminal.
    ///
    /// Terminal roots come back in their own concrete variant; computed
    /// results come back in whichever variant the engine deems canonical.
    fn materialise(&self, root: &NodeRef) -> EngineResult<Terminal>;
}

/// The process-wide engine, bootstrapping it on first use.
///
/// See [`bootstrap`] for the state machine and failure semantics.
pub fn instance() -> crate::error::Result<&'static dyn Engine> {
    bootstrap::instance()
}
