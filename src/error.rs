//! Error types for lindag

use std::fmt;
use thiserror::Error;

/// Result type alias using lindag's Error
pub type Result<T> = std::result::Result<T, Error>;

/// One frame of a native-side backtrace.
///
/// Engines that can walk their own call stack report an ordered list of
/// frames alongside computation and conversion failures. The frames are
/// spliced ahead of the local error message when the error is displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeFrame {
    /// Symbol name of the native function
    pub symbol: String,
    /// Source file the frame was compiled from
    pub file: String,
    /// Line number within `file`
    pub line: u32,
}

impl fmt::Display for NativeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.symbol, self.file, self.line)
    }
}

/// Errors that can occur in lindag operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid argument at graph or container construction time
    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        /// Reason for invalidity
        reason: String,
    },

    /// Engine bootstrap failure; fatal and never retried
    #[error("Engine initialization failed: {message}")]
    Initialization {
        /// What went wrong during bootstrap
        message: String,
    },

    /// The engine ran but the requested operation is invalid
    /// (non-conformant shapes, unsupported domain, singular input)
    #[error("Native computation failed: {message}{}", format_frames(.frames))]
    NativeComputation {
        /// Human-readable failure description
        message: String,
        /// Native call frames, outermost last; empty when unavailable
        frames: Vec<NativeFrame>,
    },

    /// Translating the graph or result across the engine boundary failed
    #[error("Native conversion failed: {message}{}", format_frames(.frames))]
    NativeConversion {
        /// Human-readable failure description
        message: String,
        /// Native call frames, outermost last; empty when unavailable
        frames: Vec<NativeFrame>,
    },

    /// An engine-side fault with no structured detail
    #[error("Native failure: {message}")]
    NativeUnspecified {
        /// Whatever detail the engine could supply
        message: String,
    },

    /// Illegal representation narrowing (complex data into a real container)
    #[error("Coercion failed: {message}")]
    Coercion {
        /// Description of the rejected narrowing
        message: String,
    },
}

fn format_frames(frames: &[NativeFrame]) -> String {
    let mut out = String::new();
    for frame in frames {
        out.push_str("\n  [native] ");
        out.push_str(&frame.to_string());
    }
    out
}

impl Error {
    /// Create an invalid-argument error
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create an initialization error
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization {
            message: message.into(),
        }
    }

    /// Create a coercion error
    pub fn coercion(message: impl Into<String>) -> Self {
        Self::Coercion {
            message: message.into(),
        }
    }

    /// Native frames attached to this error, if any
    pub fn native_frames(&self) -> &[NativeFrame] {
        match self {
            Self::NativeComputation { frames, .. } | Self::NativeConversion { frames, .. } => {
                frames
            }
            _ => &[],
        }
    }
}
