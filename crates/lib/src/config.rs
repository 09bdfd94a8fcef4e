//! User configuration.
//!
//! Read from `config.toml` in the cosy config directory (or `$COSY_CONFIG`).
//! A missing file means defaults. Environment variables override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::consts::{DEFAULT_TIMEOUT, ENV_DISTRO, ENV_PACKAGES, ENV_TIMEOUT, OS_RELEASE_PATH};
use crate::index::{IndexError, PackageIndex};
use crate::platform::{self, Distro, PlatformError, paths};
use crate::sysdeps::ManagerOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid timeout '{value}': {source}")]
  Timeout {
    value: String,
    #[source]
    source: humantime::DurationError,
  },

  #[error(transparent)]
  Distro(#[from] PlatformError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  /// Dependency data file replacing the embedded one.
  pub packages_file: Option<PathBuf>,
  /// Skip host detection and use this distribution.
  pub distro: Option<Distro>,
  /// Used when the host distribution is not supported.
  pub fallback_distro: Option<Distro>,
  /// Package manager timeout, humantime syntax.
  pub timeout: Option<String>,
  /// Run package manager mutations through `sudo` when not root.
  pub sudo: bool,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      packages_file: None,
      distro: None,
      fallback_distro: None,
      timeout: None,
      sudo: true,
    }
  }
}

impl Config {
  /// Load the user configuration and apply environment overrides.
  pub fn load() -> Result<Self, ConfigError> {
    let mut config = Self::load_from(&paths::config_file())?;
    config.apply_env()?;
    Ok(config)
  }

  /// Load `path`, or defaults if it does not exist.
  pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
    if !path.exists() {
      debug!(path = %path.display(), "no config file, using defaults");
      return Ok(Self::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    config.timeout()?;

    debug!(path = %path.display(), "loaded config");
    Ok(config)
  }

  fn apply_env(&mut self) -> Result<(), ConfigError> {
    if let Some(packages) = std::env::var_os(ENV_PACKAGES) {
      self.packages_file = Some(PathBuf::from(packages));
    }
    if let Ok(distro) = std::env::var(ENV_DISTRO) {
      self.distro = Some(distro.parse()?);
    }
    if let Ok(timeout) = std::env::var(ENV_TIMEOUT) {
      self.timeout = Some(timeout);
      self.timeout()?;
    }
    Ok(())
  }

  /// The package manager timeout.
  pub fn timeout(&self) -> Result<Duration, ConfigError> {
    match &self.timeout {
      None => Ok(DEFAULT_TIMEOUT),
      Some(value) => humantime::parse_duration(value).map_err(|source| ConfigError::Timeout {
        value: value.clone(),
        source,
      }),
    }
  }

  pub fn manager_options(&self) -> Result<ManagerOptions, ConfigError> {
    Ok(ManagerOptions {
      timeout: self.timeout()?,
      sudo: self.sudo,
    })
  }

  /// The distribution for this run, forced or detected from the host.
  pub fn select_distro(&self) -> Result<Distro, ConfigError> {
    Ok(platform::select_distro(
      self.distro,
      self.fallback_distro,
      Path::new(OS_RELEASE_PATH),
    )?)
  }

  /// The dependency index: the configured file, or the embedded copy.
  pub fn load_index(&self) -> Result<PackageIndex, IndexError> {
    PackageIndex::load_or_embedded(self.packages_file.as_deref())
  }
}
