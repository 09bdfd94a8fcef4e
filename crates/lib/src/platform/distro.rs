use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PlatformError;

/// Native package manager family of a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
  /// rpm/dnf based systems
  RedHat,
  /// dpkg/apt based systems
  Debian,
}

/// Distribution identity used as the key into the package index.
///
/// Derivatives collapse onto the distribution whose package names they share
/// (Rocky and CentOS resolve as `fedora`, Mint and Debian as `ubuntu`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distro {
  Fedora,
  Ubuntu,
}

impl Distro {
  pub const ALL: [Distro; 2] = [Distro::Fedora, Distro::Ubuntu];

  /// Returns the lowercase identifier used in the package index
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Fedora => "fedora",
      Self::Ubuntu => "ubuntu",
    }
  }

  pub fn family(&self) -> Family {
    match self {
      Self::Fedora => Family::RedHat,
      Self::Ubuntu => Family::Debian,
    }
  }

  /// Native packages needed to compile anything from source on this distro.
  pub fn bootstrap_packages(&self) -> &'static [&'static str] {
    match self {
      Self::Fedora => &["redhat-rpm-config", "gcc", "python3-devel"],
      Self::Ubuntu => &["build-essential"],
    }
  }

  /// Detect the host distribution from `os-release` metadata at `path`.
  pub fn detect_from(path: &Path) -> Result<Self, PlatformError> {
    let content = std::fs::read_to_string(path).map_err(|source| PlatformError::ReadOsRelease {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_os_release(&content)
  }

  /// Parse the contents of an `os-release` file.
  ///
  /// `ID` is matched first; `ID_LIKE` is consulted for derivatives.
  pub fn from_os_release(content: &str) -> Result<Self, PlatformError> {
    let mut id = String::new();
    let mut id_like = String::new();

    for line in content.lines() {
      if let Some(val) = line.strip_prefix("ID=") {
        id = unquote(val).to_lowercase();
      } else if let Some(val) = line.strip_prefix("ID_LIKE=") {
        id_like = unquote(val).to_lowercase();
      }
    }

    match id.as_str() {
      "fedora" | "rhel" | "centos" | "rocky" | "almalinux" => return Ok(Self::Fedora),
      "ubuntu" | "debian" | "linuxmint" | "pop" | "elementary" => return Ok(Self::Ubuntu),
      _ => {}
    }

    let like: Vec<&str> = id_like.split_whitespace().collect();
    if like.iter().any(|l| matches!(*l, "fedora" | "rhel" | "centos")) {
      Ok(Self::Fedora)
    } else if like.iter().any(|l| matches!(*l, "ubuntu" | "debian")) {
      Ok(Self::Ubuntu)
    } else if id.is_empty() {
      Err(PlatformError::Unsupported("unknown (no ID in os-release)".to_string()))
    } else {
      Err(PlatformError::Unsupported(id))
    }
  }
}

fn unquote(val: &str) -> &str {
  val.trim().trim_matches('"').trim_matches('\'')
}

impl FromStr for Distro {
  type Err = PlatformError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "fedora" => Ok(Self::Fedora),
      "ubuntu" => Ok(Self::Ubuntu),
      other => Err(PlatformError::UnknownDistro(other.to_string())),
    }
  }
}

impl fmt::Display for Distro {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
