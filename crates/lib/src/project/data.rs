use std::path::{Path, PathBuf};

use tracing::debug;

use super::ProjectError;

pub const PYPROJECT: &str = "pyproject.toml";
pub const PIPFILE: &str = "Pipfile";
pub const SETUP_PY: &str = "setup.py";
pub const PYLINTRC: &str = ".pylintrc";

/// Walk up from `start` to the first directory containing `.git` or
/// `pyproject.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, ProjectError> {
  let start = dunce::canonicalize(start).map_err(|source| ProjectError::Read {
    path: start.to_path_buf(),
    source,
  })?;

  let mut dir = start.as_path();
  loop {
    if dir.join(".git").exists() || dir.join(PYPROJECT).exists() {
      debug!(root = %dir.display(), "found project root");
      return Ok(dir.to_path_buf());
    }
    match dir.parent() {
      Some(parent) => dir = parent,
      None => return Err(ProjectError::RootNotFound { start }),
    }
  }
}

/// Files of a project directory that decide how it is managed.
#[derive(Debug, Clone)]
pub struct ProjectData {
  path: PathBuf,
  pyproject: Option<toml::Table>,
}

impl ProjectData {
  /// Read `pyproject.toml` in `path`, if there is one.
  pub fn load(path: &Path) -> Result<Self, ProjectError> {
    let pyproject_path = path.join(PYPROJECT);
    let pyproject = if pyproject_path.is_file() {
      Some(read_toml(&pyproject_path)?)
    } else {
      None
    };

    Ok(Self {
      path: path.to_path_buf(),
      pyproject,
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn pyproject(&self) -> Option<&toml::Table> {
    self.pyproject.as_ref()
  }

  pub fn pipfile_path(&self) -> PathBuf {
    self.path.join(PIPFILE)
  }

  pub fn setuppy_path(&self) -> PathBuf {
    self.path.join(SETUP_PY)
  }

  /// `.pylintrc` in the project root, when present.
  pub fn pylintrc_path(&self) -> Option<PathBuf> {
    let path = self.path.join(PYLINTRC);
    path.is_file().then_some(path)
  }

  pub fn dist_path(&self) -> PathBuf {
    self.path.join("dist")
  }

  /// Look up a dotted key path in `pyproject.toml`.
  pub(crate) fn pyproject_get(&self, keys: &[&str]) -> Option<&toml::Value> {
    let (first, rest) = keys.split_first()?;
    let mut value = self.pyproject.as_ref()?.get(*first)?;
    for key in rest {
      value = value.get(*key)?;
    }
    Some(value)
  }
}

pub(crate) fn read_toml(path: &Path) -> Result<toml::Table, ProjectError> {
  let content = std::fs::read_to_string(path).map_err(|source| ProjectError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  toml::from_str(&content).map_err(|source| ProjectError::Parse {
    path: path.to_path_buf(),
    source,
  })
}
