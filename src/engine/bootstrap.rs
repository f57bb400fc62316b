//! One-time, process-wide engine bootstrap
//!
//! A single state machine run decides which engine serves the process:
//!
//! ```text
//! Uninitialized -> PlatformChecked -> ConfigLoaded -> BootstrapLibsLoaded
//!               -> InstructionSetResolved -> MainLibsLoaded   (terminal)
//! ```
//!
//! The run happens exactly once, guarded by a `OnceLock`: concurrent first
//! use from any number of threads blocks until the one run completes, and
//! subsequent invocations are no-ops. Any step's failure is fatal and never
//! retried — the rendered failure is stored and re-raised as an
//! initialization error on every later use, leaving the engine permanently
//! unusable for the process.
//!
//! Operator overrides, read once at the start of the run:
//!
//! - `LINDAG_ISS` — force an instruction-set tier, skipping probing
//! - `LINDAG_ENGINE_CONFIG` — configuration resource path; also forces
//!   system-installed artifacts, skipping extraction

use super::config::EngineConfig;
use super::cpu::CpuEngine;
use super::extract::Scratch;
use super::iss::{self, InstructionSet};
use super::native::{self, NativeEngine};
use super::platform::{self, Platform};
use super::Engine;
use crate::error::{Error, Result};
use libloading::Library;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

static ENGINE: OnceLock<std::result::Result<Box<dyn Engine>, String>> = OnceLock::new();
static RUNS: AtomicUsize = AtomicUsize::new(0);
static LOADED: OnceLock<Mutex<Vec<String>>> = OnceLock::new();

/// The process-wide engine, running the bootstrap on first use
pub(super) fn instance() -> Result<&'static dyn Engine> {
    let slot = ENGINE.get_or_init(|| {
        RUNS.fetch_add(1, Ordering::SeqCst);
        Bootstrap::run(Overrides::from_env()).map_err(|e| e.to_string())
    });
    match slot {
        Ok(engine) => Ok(engine.as_ref()),
        Err(message) => Err(Error::initialization(message.clone())),
    }
}

/// True once a bootstrap run has completed successfully
pub fn is_initialized() -> bool {
    matches!(ENGINE.get(), Some(Ok(_)))
}

/// Number of state-machine runs that have started in this process.
///
/// Exactly one regardless of how many threads raced the first
/// materialization; exposed for concurrency tests.
#[doc(hidden)]
pub fn bootstrap_runs() -> usize {
    RUNS.load(Ordering::SeqCst)
}

/// Names of artifacts loaded so far, in load order.
///
/// A successful bootstrap never loads the same artifact twice; exposed for
/// concurrency tests.
#[doc(hidden)]
pub fn loaded_artifacts() -> Vec<String> {
    loaded().lock().clone()
}

fn loaded() -> &'static Mutex<Vec<String>> {
    LOADED.get_or_init(|| Mutex::new(Vec::new()))
}

/// Operator-supplied overrides
#[derive(Debug, Default)]
struct Overrides {
    config_path: Option<PathBuf>,
    tier: Option<InstructionSet>,
}

impl Overrides {
    fn from_env() -> Self {
        let config_path = std::env::var_os("LINDAG_ENGINE_CONFIG").map(PathBuf::from);
        let tier = std::env::var("LINDAG_ISS").ok().and_then(|v| {
            let parsed = InstructionSet::from_tagline(v.trim());
            if parsed.is_none() {
                warn!(value = %v, "ignoring unrecognized LINDAG_ISS override");
            }
            parsed
        });
        Self { config_path, tier }
    }
}

/// Bootstrap stages, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Uninitialized,
    PlatformChecked,
    ConfigLoaded,
    BootstrapLibsLoaded,
    InstructionSetResolved,
    MainLibsLoaded,
}

/// In-flight bootstrap state.
///
/// `advance` is a pure transition function over this state: each call
/// performs exactly one stage and either moves `stage` forward or fails.
struct Bootstrap {
    stage: Stage,
    overrides: Overrides,
    platform: Option<Platform>,
    config: Option<EngineConfig>,
    scratch: Option<Scratch>,
    boot_libs: Vec<Library>,
    tier: Option<InstructionSet>,
    main_libs: Vec<Library>,
}

impl Bootstrap {
    fn new(overrides: Overrides) -> Self {
        Self {
            stage: Stage::Uninitialized,
            overrides,
            platform: None,
            config: None,
            scratch: None,
            boot_libs: Vec::new(),
            tier: None,
            main_libs: Vec::new(),
        }
    }

    /// Run the state machine to completion and hand back the engine
    fn run(overrides: Overrides) -> Result<Box<dyn Engine>> {
        info!("initializing compute engine");
        let mut state = Self::new(overrides);
        while state.stage < Stage::MainLibsLoaded {
            state.advance()?;
        }
        state.into_engine()
    }

    fn advance(&mut self) -> Result<()> {
        match self.stage {
            Stage::Uninitialized => {
                let platform = platform::check_supported()?;
                debug!(platform = platform.short(), "platform check passed");
                self.platform = Some(platform);
                self.stage = Stage::PlatformChecked;
            }
            Stage::PlatformChecked => {
                let config = match &self.overrides.config_path {
                    Some(path) => {
                        info!(path = %path.display(), "loading operator engine configuration");
                        EngineConfig::from_path(path)?
                    }
                    None => EngineConfig::bundled()?,
                };
                self.config = Some(config);
                self.stage = Stage::ConfigLoaded;
            }
            Stage::ConfigLoaded => {
                let artifacts = self.config().initialise_list();
                self.extract_artifacts(&artifacts)?;
                self.boot_libs = self.load_artifacts(&artifacts)?;
                self.stage = Stage::BootstrapLibsLoaded;
            }
            Stage::BootstrapLibsLoaded => {
                let tier = self.resolve_tier();
                info!(%tier, "instruction set resolved");
                self.tier = Some(tier);
                self.stage = Stage::InstructionSetResolved;
            }
            Stage::InstructionSetResolved => {
                let platform = self.platform.expect("set by PlatformChecked");
                let tier = self.tier.expect("set by InstructionSetResolved");
                let artifacts = self.config().libraries(platform.short(), tier.tagline());
                let load = self.config().load_list(platform.short(), tier.tagline());
                self.extract_artifacts(&artifacts)?;
                self.main_libs = self.load_artifacts(&load)?;
                self.stage = Stage::MainLibsLoaded;
            }
            Stage::MainLibsLoaded => {}
        }
        Ok(())
    }

    fn config(&self) -> &EngineConfig {
        self.config.as_ref().expect("set by ConfigLoaded")
    }

    fn resolve_tier(&self) -> InstructionSet {
        if let Some(tier) = self.overrides.tier {
            debug!(%tier, "tier forced by override, skipping probe");
            return tier;
        }
        if let Some(tier) = native::probe_tier(&self.boot_libs) {
            return tier;
        }
        iss::probe_host()
    }

    /// Copy artifacts into the scratch directory, unless the operator
    /// forced system-installed artifacts
    fn extract_artifacts(&mut self, artifacts: &[String]) -> Result<()> {
        if artifacts.is_empty() || self.overrides.config_path.is_some() {
            return Ok(());
        }
        let platform = self.platform.expect("set by PlatformChecked");
        let source = self.config().source_dir(platform.short()).ok_or_else(|| {
            Error::initialization(format!(
                "configuration names artifacts but no {}.source directory",
                platform.short()
            ))
        })?;
        if self.scratch.is_none() {
            self.scratch = Some(Scratch::create()?);
        }
        let scratch = self.scratch.as_ref().expect("scratch just created");
        for stem in artifacts {
            scratch.extract(&source, &platform.library_file_name(stem))?;
        }
        Ok(())
    }

    /// Load artifacts by name: from the scratch directory after extraction,
    /// or by system name when extraction was skipped
    fn load_artifacts(&self, artifacts: &[String]) -> Result<Vec<Library>> {
        let platform = self.platform.expect("set by PlatformChecked");
        let mut libs = Vec::with_capacity(artifacts.len());
        for stem in artifacts {
            let file = platform.library_file_name(stem);
            let path = match &self.scratch {
                Some(scratch) => scratch.path().join(&file),
                None => PathBuf::from(&file),
            };
            debug!(artifact = %file, path = %path.display(), "loading engine artifact");
            // Safety: artifact initializers run on load; that is the
            // documented contract of engine artifacts.
            let lib = unsafe { Library::new(&path) }.map_err(|e| {
                Error::initialization(format!("cannot load {} as {}: {e}", file, path.display()))
            })?;
            loaded().lock().push(stem.clone());
            libs.push(lib);
        }
        Ok(libs)
    }

    fn into_engine(self) -> Result<Box<dyn Engine>> {
        let platform = self.platform.expect("set by PlatformChecked");
        let tier = self.tier.expect("set by InstructionSetResolved");
        let config = self.config.as_ref().expect("set by ConfigLoaded");
        if config.has_artifacts(platform.short()) {
            // Scratch ownership note: the TempDir moves in with the engine
            // and lives for the process; the OS reaps it after exit.
            let engine = NativeEngine::new(tier, self.boot_libs, self.main_libs)?;
            info!(engine = "native", %tier, "engine initialized");
            Ok(Box::new(ScratchKeeper {
                engine,
                _scratch: self.scratch,
            }))
        } else {
            info!(engine = "cpu", %tier, "engine initialized");
            Ok(Box::new(CpuEngine::new(tier)))
        }
    }
}

/// Keeps the scratch directory alive alongside the native engine
struct ScratchKeeper {
    engine: NativeEngine,
    _scratch: Option<Scratch>,
}

impl Engine for ScratchKeeper {
    fn name(&self) -> &str {
        self.engine.name()
    }
    fn tier(&self) -> InstructionSet {
        self.engine.tier()
    }
    fn materialise(
        &self,
        root: &crate::graph::NodeRef,
    ) -> super::EngineResult<crate::container::Terminal> {
        self.engine.materialise(root)
    }
}
