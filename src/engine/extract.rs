//! Artifact extraction into a process-private scratch directory
//!
//! Native artifacts named by the configuration are copied out of the
//! artifact source into an ephemeral directory before loading, so the
//! loaded files cannot be swapped underneath the process. The scratch
//! directory lives under the OS temp root and is cleaned up best-effort
//! at process exit.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Process-private scratch directory for extracted artifacts
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create the scratch directory
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("lindag-engine-")
            .tempdir()
            .map_err(|e| {
                Error::initialization(format!("could not create scratch directory: {e}"))
            })?;
        debug!(path = %dir.path().display(), "created engine scratch directory");
        Ok(Self { dir })
    }

    /// Path of the scratch directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Extract one artifact file from `source` into the scratch directory.
    ///
    /// # Errors
    ///
    /// [`Error::Initialization`] when the artifact is missing, empty, or
    /// cannot be copied.
    pub fn extract(&self, source: &Path, file_name: &str) -> Result<PathBuf> {
        let from = source.join(file_name);
        let to = self.dir.path().join(file_name);
        let bytes = std::fs::copy(&from, &to).map_err(|e| {
            Error::initialization(format!(
                "error extracting artifact {}: {e}",
                from.display()
            ))
        })?;
        if bytes == 0 {
            return Err(Error::initialization(format!(
                "0 bytes read for artifact {}",
                from.display()
            )));
        }
        debug!(artifact = file_name, bytes, "extracted engine artifact");
        Ok(to)
    }
}
