//! Interop engine over dynamically loaded native artifacts
//!
//! This module owns the loaded library handles and the typed
//! request/response structures marshaled across the C ABI. The backend is
//! assumed reentrant for `lindag_execute` only — exactly its documented
//! contract — so no additional locking is layered here.
//!
//! Expected symbols:
//!
//! - `lindag_probe_iss() -> u32` — maximum supported instruction-set tier,
//!   exported by a bootstrap artifact
//! - `lindag_execute(nodes, n_nodes, args, n_args, reals, n_reals, ints,
//!   n_ints, root, out) -> i32` — materialize the flattened graph
//! - `lindag_release(out)` — free engine-owned response memory

pub mod wire;

use super::iss::InstructionSet;
use super::{Engine, EngineFailure, EngineResult};
use crate::container::Terminal;
use crate::error::NativeFrame;
use crate::graph::NodeRef;
use libloading::Library;
use std::ffi::{c_char, CStr};
use tracing::debug;

/// Engine-reported status codes
const STATUS_OK: i32 = 0;
const STATUS_COMPUTATION: i32 = 1;
const STATUS_CONVERSION: i32 = 2;

/// One native backtrace frame in wire form
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WireFrame {
    /// Symbol name, NUL-terminated
    pub symbol: *const c_char,
    /// Source file, NUL-terminated
    pub file: *const c_char,
    /// Line number
    pub line: u64,
}

/// Engine response in wire form.
///
/// On success the terminal payload fields are set; on failure `message`
/// and optionally `frames` are set. `handle` is engine-owned context
/// passed back verbatim to `lindag_release`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WireResult {
    /// Status code; 0 is success
    pub status: i32,
    /// Result tag code
    pub tag: u64,
    /// Result rows
    pub rows: u64,
    /// Result cols
    pub cols: u64,
    /// Real payload
    pub reals: *const f64,
    /// Real payload length
    pub reals_len: u64,
    /// Integer payload
    pub ints: *const i64,
    /// Integer payload length
    pub ints_len: u64,
    /// Failure message, NUL-terminated; null on success
    pub message: *const c_char,
    /// Native frames, outermost last; null when unavailable
    pub frames: *const WireFrame,
    /// Number of native frames
    pub frames_len: u64,
    /// Engine-owned release context
    pub handle: u64,
}

impl WireResult {
    fn zeroed() -> Self {
        // Pointer fields start null; the engine fills what it uses.
        unsafe { std::mem::zeroed() }
    }
}

type ProbeFn = unsafe extern "C" fn() -> u32;
#[allow(clippy::type_complexity)]
type ExecuteFn = unsafe extern "C" fn(
    nodes: *const wire::WireNode,
    n_nodes: u64,
    args: *const u64,
    n_args: u64,
    reals: *const f64,
    n_reals: u64,
    ints: *const i64,
    n_ints: u64,
    root: u64,
    out: *mut WireResult,
) -> i32;
type ReleaseFn = unsafe extern "C" fn(*mut WireResult);

const PROBE_SYMBOL: &[u8] = b"lindag_probe_iss\0";
const EXECUTE_SYMBOL: &[u8] = b"lindag_execute\0";
const RELEASE_SYMBOL: &[u8] = b"lindag_release\0";

/// Query the maximum supported tier through a loaded bootstrap artifact.
///
/// Returns `None` when no loaded library exports the probe symbol or the
/// reported code is unknown.
pub fn probe_tier(libs: &[Library]) -> Option<InstructionSet> {
    for lib in libs {
        // Safety: the probe symbol takes no arguments and only reads CPUID.
        let code = unsafe {
            match lib.get::<ProbeFn>(PROBE_SYMBOL) {
                Ok(probe) => probe(),
                Err(_) => continue,
            }
        };
        return InstructionSet::from_probe_code(code);
    }
    None
}

/// Engine dispatching to dynamically loaded native artifacts
pub struct NativeEngine {
    tier: InstructionSet,
    /// Bootstrap artifacts; kept loaded for the engine's lifetime
    _boot_libs: Vec<Library>,
    /// Main artifacts; index `exec_lib` exports the execute symbol
    main_libs: Vec<Library>,
    exec_lib: usize,
}

impl NativeEngine {
    /// Wrap loaded artifacts as an engine.
    ///
    /// # Errors
    ///
    /// [`crate::error::Error::Initialization`] when no main artifact
    /// exports the execute entry point.
    pub fn new(
        tier: InstructionSet,
        boot_libs: Vec<Library>,
        main_libs: Vec<Library>,
    ) -> crate::error::Result<Self> {
        let exec_lib = main_libs
            .iter()
            .position(|lib| unsafe { lib.get::<ExecuteFn>(EXECUTE_SYMBOL).is_ok() })
            .ok_or_else(|| {
                crate::error::Error::initialization(
                    "no loaded artifact exports the engine execute entry point",
                )
            })?;
        debug!(%tier, "native engine ready");
        Ok(Self {
            tier,
            _boot_libs: boot_libs,
            main_libs,
            exec_lib,
        })
    }
}

impl Engine for NativeEngine {
    fn name(&self) -> &str {
        "native"
    }

    fn tier(&self) -> InstructionSet {
        self.tier
    }

    fn materialise(&self, root: &NodeRef) -> EngineResult<Terminal> {
        let graph = wire::flatten(root);
        let lib = &self.main_libs[self.exec_lib];

        let mut out = WireResult::zeroed();
        // Safety: the wire arenas outlive the call; `out` is a valid
        // zeroed response the engine fills per the documented contract.
        let status = unsafe {
            let execute: libloading::Symbol<ExecuteFn> = lib
                .get(EXECUTE_SYMBOL)
                .map_err(|e| EngineFailure::conversion(format!("execute symbol vanished: {e}")))?;
            execute(
                graph.nodes.as_ptr(),
                graph.nodes.len() as u64,
                graph.args.as_ptr(),
                graph.args.len() as u64,
                graph.reals.as_ptr(),
                graph.reals.len() as u64,
                graph.ints.as_ptr(),
                graph.ints.len() as u64,
                graph.root(),
                &mut out,
            )
        };

        let outcome = if status == STATUS_OK && out.status == STATUS_OK {
            // Safety: on success the payload pointers are valid for the
            // stated lengths until release.
            let (reals, ints) = unsafe {
                (
                    slice_or_empty(out.reals, out.reals_len),
                    slice_or_empty(out.ints, out.ints_len),
                )
            };
            wire::decode_terminal(out.tag, out.rows as usize, out.cols as usize, reals, ints)
        } else {
            Err(decode_failure(&out))
        };

        // Safety: release is called exactly once per response, after all
        // reads from engine-owned memory.
        unsafe {
            if let Ok(release) = lib.get::<ReleaseFn>(RELEASE_SYMBOL) {
                release(&mut out);
            }
        }
        outcome
    }
}

unsafe fn slice_or_empty<'a, T>(ptr: *const T, len: u64) -> &'a [T] {
    if ptr.is_null() || len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(ptr, len as usize)
    }
}

unsafe fn string_or(ptr: *const c_char, fallback: &str) -> String {
    if ptr.is_null() {
        fallback.to_string()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

/// Translate a failed response into a structured failure, decoding any
/// native frames the engine attached.
fn decode_failure(out: &WireResult) -> EngineFailure {
    // Safety: failure message/frame pointers are valid until release.
    let message = unsafe { string_or(out.message, "engine reported no detail") };
    let frames = unsafe { decode_frames(out.frames, out.frames_len) };
    let failure = match out.status {
        STATUS_COMPUTATION => EngineFailure::computation(message),
        STATUS_CONVERSION => EngineFailure::conversion(message),
        _ => EngineFailure::unspecified(message),
    };
    failure.with_frames(frames)
}

unsafe fn decode_frames(frames: *const WireFrame, len: u64) -> Vec<NativeFrame> {
    slice_or_empty(frames, len)
        .iter()
        .map(|f| NativeFrame {
            symbol: string_or(f.symbol, "<unknown>"),
            file: string_or(f.file, "<unknown>"),
            line: f.line as u32,
        })
        .collect()
}
