//! Engine artifact configuration
//!
//! A properties-style resource enumerates, per platform and per
//! instruction-set tier, which artifacts to extract and which to load:
//!
//! ```properties
//! initialise            = bootstrap artifacts, loaded before tier probing
//! <platform>.source     = directory artifacts are extracted from
//! <platform>.<tier>.libraries = artifacts to extract for the tier
//! <platform>.<tier>.load      = subset to explicitly load, in order
//! ```
//!
//! Values are comma-separated artifact lists. Keys outside the recognized
//! schema are preserved but unused. The bundled default configuration names
//! no artifacts, which resolves the bootstrap to the reference engine; an
//! operator-supplied path (see [`bootstrap`](super::bootstrap)) both
//! replaces the resource and disables extraction in favor of
//! system-installed artifacts.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The bundled default configuration resource
const BUNDLED: &str = include_str!("engine.properties");

/// Parsed key-value configuration for the bootstrap
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    entries: BTreeMap<String, String>,
}

impl EngineConfig {
    /// Parse properties text: `key = value` lines, `#` and `!` comments.
    ///
    /// # Errors
    ///
    /// [`Error::Initialization`] on a non-comment line without a `=`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(Error::initialization(format!(
                    "malformed configuration line {}: {line}",
                    lineno + 1
                )));
            };
            entries.insert(key.trim().to_string(), value.trim().to_string());
        }
        Ok(Self { entries })
    }

    /// The bundled default configuration
    pub fn bundled() -> Result<Self> {
        Self::parse(BUNDLED)
    }

    /// Load a configuration from an operator-supplied path
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::initialization(format!(
                "cannot read engine configuration {}: {e}",
                path.display()
            ))
        })?;
        Self::parse(&text)
    }

    /// Raw value for `key`, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The bootstrap artifact subset loaded before tier probing
    pub fn initialise_list(&self) -> Vec<String> {
        self.list("initialise")
    }

    /// Artifacts to extract for a platform/tier pair
    pub fn libraries(&self, platform: &str, tier: &str) -> Vec<String> {
        self.list(&format!("{platform}.{tier}.libraries"))
    }

    /// Artifacts to explicitly load for a platform/tier pair, in order
    pub fn load_list(&self, platform: &str, tier: &str) -> Vec<String> {
        self.list(&format!("{platform}.{tier}.load"))
    }

    /// Directory artifacts are extracted from, when extraction is enabled
    pub fn source_dir(&self, platform: &str) -> Option<PathBuf> {
        self.get(&format!("{platform}.source")).map(PathBuf::from)
    }

    /// True when the configuration names any artifact for `platform`.
    ///
    /// A configuration with no artifacts resolves the bootstrap to the
    /// reference engine.
    pub fn has_artifacts(&self, platform: &str) -> bool {
        if !self.initialise_list().is_empty() {
            return true;
        }
        let prefix = format!("{platform}.");
        self.entries.iter().any(|(k, v)| {
            k.starts_with(&prefix) && k.ends_with(".libraries") && !v.trim().is_empty()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
        # comment line
        ! another comment
        initialise = probe_core , probe_iss
        lin.source = /opt/engine/artifacts
        lin.avx.libraries = engine_avx, blas_avx
        lin.avx.load = engine_avx
        lin.std.libraries = engine_std
        unrelated.key = kept-but-unused
    ";

    #[test]
    fn recognizes_the_key_schema() {
        let cfg = EngineConfig::parse(SAMPLE).unwrap();
        assert_eq!(cfg.initialise_list(), vec!["probe_core", "probe_iss"]);
        assert_eq!(cfg.libraries("lin", "avx"), vec!["engine_avx", "blas_avx"]);
        assert_eq!(cfg.load_list("lin", "avx"), vec!["engine_avx"]);
        assert_eq!(cfg.libraries("lin", "std"), vec!["engine_std"]);
        assert_eq!(
            cfg.source_dir("lin"),
            Some(PathBuf::from("/opt/engine/artifacts"))
        );
        assert!(cfg.has_artifacts("lin"));
        assert!(cfg.libraries("mac", "avx").is_empty());
    }

    #[test]
    fn unrelated_keys_are_ignored_by_the_schema() {
        let cfg = EngineConfig::parse(SAMPLE).unwrap();
        assert_eq!(cfg.get("unrelated.key"), Some("kept-but-unused"));
        assert!(!cfg.has_artifacts("mac"));
    }

    #[test]
    fn bundled_default_names_no_artifacts() {
        let cfg = EngineConfig::bundled().unwrap();
        for platform in ["lin", "mac", "win"] {
            assert!(!cfg.has_artifacts(platform));
        }
    }

    #[test]
    fn malformed_lines_are_initialization_errors() {
        let err = EngineConfig::parse("not a property line").unwrap_err();
        assert!(matches!(err, Error::Initialization { .. }));
    }
}
