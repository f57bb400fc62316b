//! Platform gating for the native bootstrap
//!
//! Only 64-bit targets on the fixed allow-list of operating systems may
//! initialize an engine. The short platform names key the configuration
//! schema (`lin.avx.libraries`, ...).

use crate::error::{Error, Result};

/// A supported operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Linux
    Linux,
    /// macOS
    MacOs,
    /// Windows
    Windows,
}

impl Platform {
    /// Short name used in configuration keys
    pub const fn short(self) -> &'static str {
        match self {
            Self::Linux => "lin",
            Self::MacOs => "mac",
            Self::Windows => "win",
        }
    }

    /// Platform-conventional shared library file name for an artifact stem
    pub fn library_file_name(self, stem: &str) -> String {
        match self {
            Self::Linux => format!("lib{stem}.so"),
            Self::MacOs => format!("lib{stem}.dylib"),
            Self::Windows => format!("{stem}.dll"),
        }
    }
}

/// Verify the current platform is supported.
///
/// # Errors
///
/// [`Error::Initialization`] on non-64-bit targets or operating systems
/// outside the allow-list. This check runs before any other bootstrap
/// state is touched.
pub fn check_supported() -> Result<Platform> {
    if cfg!(not(target_pointer_width = "64")) {
        return Err(Error::initialization(format!(
            "architecture {} is unsupported; only 64-bit systems are supported",
            std::env::consts::ARCH
        )));
    }
    match std::env::consts::OS {
        "linux" => Ok(Platform::Linux),
        "macos" => Ok(Platform::MacOs),
        "windows" => Ok(Platform::Windows),
        other => Err(Error::initialization(format!(
            "platform {other} is not supported"
        ))),
    }
}
