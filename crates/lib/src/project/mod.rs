//! Python project detection and tool dispatch.
//!
//! A project is managed either by Poetry (`pyproject.toml` with the Poetry
//! build backend) or by Pipenv (`Pipfile` plus `setup.py`). Everything cosy
//! runs inside the project goes through that tool's `run` so the project's
//! virtualenv is used.

mod data;

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::exec::{ExecError, ProcessCommand, ProcessOutput};

pub use data::{PIPFILE, PYLINTRC, PYPROJECT, ProjectData, SETUP_PY, find_project_root};

const POETRY_BACKEND: &str = "poetry.core.masonry.api";

#[derive(Debug, Error)]
pub enum ProjectError {
  #[error("project root not found (no .git or pyproject.toml above {start})")]
  RootNotFound { start: PathBuf },

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid TOML in {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("unsupported project in {0}: expected a Poetry pyproject.toml or Pipfile + setup.py")]
  Unsupported(PathBuf),

  #[error(transparent)]
  Exec(#[from] ExecError),
}

/// `[tool.cosy]` settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
  /// Importable module name, used by the lint and type-check gates.
  pub name: String,
  /// Whether `publish` may upload the project.
  pub public: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ToolCosy {
  name: Option<String>,
  public: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
  Poetry,
  Pipenv,
}

impl ProjectKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ProjectKind::Poetry => "poetry",
      ProjectKind::Pipenv => "pipenv",
    }
  }
}

impl fmt::Display for ProjectKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A detected project and the tool that manages it.
#[derive(Debug, Clone)]
pub struct Project {
  kind: ProjectKind,
  data: ProjectData,
}

impl Project {
  /// Locate the project root above `start` and detect its kind.
  pub fn find(start: &Path) -> Result<Self, ProjectError> {
    let root = find_project_root(start)?;
    Self::detect(ProjectData::load(&root)?)
  }

  pub fn detect(data: ProjectData) -> Result<Self, ProjectError> {
    let kind = if is_poetry(&data) {
      ProjectKind::Poetry
    } else if is_pipenv(&data) {
      ProjectKind::Pipenv
    } else {
      return Err(ProjectError::Unsupported(data.path().to_path_buf()));
    };
    debug!(kind = %kind, path = %data.path().display(), "detected project");
    Ok(Self { kind, data })
  }

  pub fn kind(&self) -> ProjectKind {
    self.kind
  }

  pub fn data(&self) -> &ProjectData {
    &self.data
  }

  pub fn path(&self) -> &Path {
    self.data.path()
  }

  /// Every declared Python dependency, dev and optional groups included.
  ///
  /// `python` itself is not a package and is left out. Names are returned
  /// as written.
  pub fn get_packages_list(&self) -> Result<BTreeSet<String>, ProjectError> {
    let mut packages = BTreeSet::new();
    match self.kind {
      ProjectKind::Poetry => {
        for keys in [
          &["tool", "poetry", "dependencies"][..],
          &["tool", "poetry", "dev-dependencies"][..],
        ] {
          if let Some(table) = self.data.pyproject_get(keys).and_then(|v| v.as_table()) {
            packages.extend(table.keys().cloned());
          }
        }
        if let Some(groups) = self.data.pyproject_get(&["tool", "poetry", "group"]).and_then(|v| v.as_table()) {
          for group in groups.values() {
            if let Some(table) = group.get("dependencies").and_then(|v| v.as_table()) {
              packages.extend(table.keys().cloned());
            }
          }
        }
      }
      ProjectKind::Pipenv => {
        let pipfile = data::read_toml(&self.data.pipfile_path())?;
        for section in ["packages", "dev-packages"] {
          if let Some(table) = pipfile.get(section).and_then(|v| v.as_table()) {
            packages.extend(table.keys().cloned());
          }
        }
      }
    }
    packages.retain(|name| !name.eq_ignore_ascii_case("python"));
    Ok(packages)
  }

  /// `[tool.cosy]`, with the name defaulting to the Poetry project name and
  /// then to the directory name.
  pub fn metadata(&self) -> Result<Metadata, ProjectError> {
    let tool: ToolCosy = match self.data.pyproject_get(&["tool", "cosy"]) {
      Some(value) => value.clone().try_into().map_err(|source| ProjectError::Parse {
        path: self.data.path().join(PYPROJECT),
        source,
      })?,
      None => ToolCosy::default(),
    };

    let name = tool
      .name
      .or_else(|| {
        self
          .data
          .pyproject_get(&["tool", "poetry", "name"])
          .and_then(|v| v.as_str())
          .map(str::to_string)
      })
      .or_else(|| self.path().file_name().map(|n| n.to_string_lossy().into_owned()))
      .unwrap_or_default();

    Ok(Metadata {
      name,
      public: tool.public,
    })
  }

  fn tool(&self) -> ProcessCommand {
    ProcessCommand::new(self.kind.as_str()).current_dir(self.path())
  }

  /// Install the Python dependencies into the project environment.
  pub async fn install(&self) -> Result<ProcessOutput, ProjectError> {
    let cmd = match self.kind {
      ProjectKind::Poetry => self.tool().arg("install"),
      ProjectKind::Pipenv => self.tool().args(["install", "--dev"]),
    };
    info!(cmd = %cmd, "installing python dependencies");
    Ok(cmd.output().await?)
  }

  /// The command line that runs `argv` inside the project environment.
  pub fn run_command<S: AsRef<str>>(&self, argv: &[S]) -> ProcessCommand {
    self.tool().arg("run").args(argv.iter().map(|s| s.as_ref().to_string()))
  }

  /// Run `argv` in the project environment, output captured.
  pub async fn run<S: AsRef<str>>(&self, argv: &[S]) -> Result<ProcessOutput, ProjectError> {
    Ok(self.run_command(argv).output().await?)
  }

  /// Run `argv` in the project environment with the terminal attached.
  pub async fn run_attached<S: AsRef<str>>(&self, argv: &[S]) -> Result<ProcessOutput, ProjectError> {
    Ok(self.run_command(argv).status().await?)
  }
}

fn is_poetry(data: &ProjectData) -> bool {
  data
    .pyproject_get(&["build-system", "build-backend"])
    .and_then(|v| v.as_str())
    == Some(POETRY_BACKEND)
}

fn is_pipenv(data: &ProjectData) -> bool {
  data.pipfile_path().is_file() && data.setuppy_path().is_file()
}
