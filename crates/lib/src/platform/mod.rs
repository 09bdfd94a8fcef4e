//! Host platform detection.
//!
//! Identifies which distribution (and therefore which native package manager)
//! the process runs on, and where per-user files live.

pub mod distro;
pub mod paths;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

pub use distro::{Distro, Family};

#[derive(Debug, Error)]
pub enum PlatformError {
  #[error("failed to read {path}: {source}")]
  ReadOsRelease {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// No package manager variant matches the host.
  #[error("unsupported platform: {0} (set `fallback_distro` in the config to force a package manager)")]
  Unsupported(String),

  #[error("unknown distribution '{0}', expected one of: fedora, ubuntu")]
  UnknownDistro(String),
}

/// Choose the distribution identity for this run.
///
/// An explicit `forced` identity wins. Otherwise the host is detected from
/// `os_release`; `fallback` is only used when detection reports an
/// unsupported distribution, never when the file cannot be read.
pub fn select_distro(forced: Option<Distro>, fallback: Option<Distro>, os_release: &Path) -> Result<Distro, PlatformError> {
  if let Some(distro) = forced {
    debug!(distro = %distro, "using configured distribution");
    return Ok(distro);
  }

  match Distro::detect_from(os_release) {
    Ok(distro) => {
      debug!(distro = %distro, "detected distribution");
      Ok(distro)
    }
    Err(PlatformError::Unsupported(id)) => match fallback {
      Some(distro) => {
        warn!(detected = %id, fallback = %distro, "unsupported distribution, using configured fallback");
        Ok(distro)
      }
      None => Err(PlatformError::Unsupported(id)),
    },
    Err(e) => Err(e),
  }
}

/// Whether the current process runs with root privileges.
#[cfg(unix)]
pub fn is_elevated() -> bool {
  rustix::process::geteuid().is_root()
}

#[cfg(not(unix))]
pub fn is_elevated() -> bool {
  false
}
