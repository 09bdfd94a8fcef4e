//! Distro package index.
//!
//! Maps a Python package name and a distribution to the native packages it
//! needs, split into `build`, `run` and `collect` classes. The table is
//! loaded once and never mutated; callers normalize package names before
//! calling [`PackageIndex::lookup`].
//!
//! # Data format
//!
//! ```yaml
//! pillow:
//!   ubuntu:
//!     build: [libjpeg-dev]
//!     run: [libjpeg62]
//!   fedora:
//!     build: [libjpeg-turbo-devel]
//!     run: [libjpeg-turbo]
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::platform::Distro;

/// The mapping shipped with the binary.
const EMBEDDED_PACKAGES: &str = include_str!("../data/packages.yml");

static EMPTY: Requirements = Requirements {
  build: Vec::new(),
  run: Vec::new(),
  collect: Vec::new(),
};

#[derive(Debug, Error)]
pub enum IndexError {
  #[error("failed to read package index {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed package index {source_name}: {source}")]
  Parse {
    source_name: IndexSource,
    #[source]
    source: serde_yaml::Error,
  },
}

/// Native requirements of one package on one distribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Requirements {
  /// Needed only to compile.
  pub build: Vec<String>,
  /// Needed at runtime.
  pub run: Vec<String>,
  /// Needed to fetch or stage sources (VCS tools and the like).
  pub collect: Vec<String>,
}

impl Requirements {
  pub fn is_empty(&self) -> bool {
    self.build.is_empty() && self.run.is_empty() && self.collect.is_empty()
  }
}

/// Where an index was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSource {
  Embedded,
  File(PathBuf),
}

impl fmt::Display for IndexSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      IndexSource::Embedded => write!(f, "<embedded>"),
      IndexSource::File(path) => write!(f, "{}", path.display()),
    }
  }
}

#[derive(Debug, Clone)]
pub struct PackageIndex {
  entries: BTreeMap<String, BTreeMap<String, Requirements>>,
  source: IndexSource,
}

impl PackageIndex {
  /// Load the index that ships with the binary.
  pub fn embedded() -> Result<Self, IndexError> {
    Self::parse(EMBEDDED_PACKAGES, IndexSource::Embedded)
  }

  /// Load an index from a YAML file on disk.
  pub fn load(path: &Path) -> Result<Self, IndexError> {
    let content = std::fs::read_to_string(path).map_err(|source| IndexError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::parse(&content, IndexSource::File(path.to_path_buf()))
  }

  /// Load from `path` when given, otherwise the embedded index.
  pub fn load_or_embedded(path: Option<&Path>) -> Result<Self, IndexError> {
    match path {
      Some(path) => Self::load(path),
      None => Self::embedded(),
    }
  }

  pub fn from_yaml_str(content: &str) -> Result<Self, IndexError> {
    Self::parse(content, IndexSource::Embedded)
  }

  fn parse(content: &str, source: IndexSource) -> Result<Self, IndexError> {
    let entries: BTreeMap<String, BTreeMap<String, Requirements>> =
      serde_yaml::from_str(content).map_err(|e| IndexError::Parse {
        source_name: source.clone(),
        source: e,
      })?;

    debug!(packages = entries.len(), source = %source, "loaded package index");

    Ok(Self { entries, source })
  }

  /// Requirements of `package` on `distro`.
  ///
  /// `package` must already be trimmed and lower-cased. Unknown packages and
  /// packages without an entry for `distro` yield an empty record.
  pub fn lookup(&self, package: &str, distro: Distro) -> &Requirements {
    self
      .entries
      .get(package)
      .and_then(|by_distro| by_distro.get(distro.as_str()))
      .unwrap_or(&EMPTY)
  }

  pub fn contains(&self, package: &str) -> bool {
    self.entries.contains_key(package)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn source(&self) -> &IndexSource {
    &self.source
  }
}
