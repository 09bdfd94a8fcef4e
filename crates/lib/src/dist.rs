//! Building distributables and uploading them.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::exec::{ProcessCommand, ProcessOutput};
use crate::project::{Project, ProjectError, ProjectKind};

const DIST_DIR: &str = "dist";

#[derive(Debug, Error)]
pub enum DistError {
  #[error(transparent)]
  Project(#[from] ProjectError),

  #[error("failed to clear {path}: {source}")]
  Clear {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to list {path}: {source}")]
  List {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("`{cmd}` failed with exit code {code}:\n{output}")]
  BuildFailed { cmd: String, code: i32, output: String },

  #[error("project '{0}' is not public; set `public = true` under [tool.cosy] to upload")]
  NotPublic(String),

  #[error("nothing to upload in {0}")]
  NoArtifacts(PathBuf),

  #[error("upload failed with exit code {0}")]
  UploadFailed(i32),
}

/// Commands that produce the sdist and the wheel.
pub fn build_commands(project: &Project) -> Vec<ProcessCommand> {
  match project.kind() {
    ProjectKind::Poetry => vec![ProcessCommand::new("poetry").arg("build").current_dir(project.path())],
    ProjectKind::Pipenv => vec![
      project.run_command(&["python", "setup.py", "sdist"]),
      project.run_command(&["python", "setup.py", "bdist_wheel"]),
    ],
  }
}

/// Remove `dist/` and build fresh artifacts into it.
///
/// Returns the output of every build step.
pub async fn build(project: &Project) -> Result<Vec<ProcessOutput>, DistError> {
  let dist = project.data().dist_path();
  if dist.exists() {
    std::fs::remove_dir_all(&dist).map_err(|source| DistError::Clear {
      path: dist.clone(),
      source,
    })?;
  }

  let mut outputs = Vec::new();
  for cmd in build_commands(project) {
    info!(cmd = %cmd, "building distributables");
    let output = cmd.output().await.map_err(ProjectError::from)?;
    if !output.success() {
      return Err(DistError::BuildFailed {
        cmd: cmd.to_string(),
        code: output.code_or_signal(),
        output: output.combined(),
      });
    }
    outputs.push(output);
  }
  Ok(outputs)
}

/// Files in `dist/`, sorted by name, relative to the project root.
pub fn artifacts(project: &Project) -> Result<Vec<PathBuf>, DistError> {
  let dist = project.data().dist_path();
  let entries = std::fs::read_dir(&dist).map_err(|source| DistError::List {
    path: dist.clone(),
    source,
  })?;

  let mut names = Vec::new();
  for entry in entries {
    let entry = entry.map_err(|source| DistError::List {
      path: dist.clone(),
      source,
    })?;
    if entry.path().is_file() {
      names.push(entry.file_name());
    }
  }
  names.sort();

  Ok(names.into_iter().map(|name| Path::new(DIST_DIR).join(name)).collect())
}

/// Refuse to go on unless `[tool.cosy] public = true`.
pub fn ensure_public(project: &Project) -> Result<(), DistError> {
  let meta = project.metadata()?;
  if meta.public {
    Ok(())
  } else {
    Err(DistError::NotPublic(meta.name))
  }
}

pub fn upload_command(project: &Project, artifacts: &[PathBuf]) -> ProcessCommand {
  let mut argv = vec!["twine".to_string(), "upload".to_string()];
  argv.extend(artifacts.iter().map(|p| p.display().to_string()));
  project.run_command(argv.as_slice())
}

/// Upload everything in `dist/` with twine, terminal attached.
pub async fn upload(project: &Project) -> Result<(), DistError> {
  let files = artifacts(project)?;
  if files.is_empty() {
    return Err(DistError::NoArtifacts(project.data().dist_path()));
  }

  let cmd = upload_command(project, &files);
  info!(cmd = %cmd, "uploading");
  let status = cmd.status().await.map_err(ProjectError::from)?;
  if !status.success() {
    return Err(DistError::UploadFailed(status.code_or_signal()));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::project::{PIPFILE, PYPROJECT, ProjectData, SETUP_PY};
  use tempfile::TempDir;

  fn poetry(dir: &TempDir, extra: &str) -> Project {
    std::fs::write(
      dir.path().join(PYPROJECT),
      format!("[tool.poetry]\nname = \"demo\"\n\n[build-system]\nbuild-backend = \"poetry.core.masonry.api\"\n{extra}"),
    )
    .unwrap();
    Project::detect(ProjectData::load(dir.path()).unwrap()).unwrap()
  }

  #[test]
  fn poetry_builds_with_poetry() {
    let dir = TempDir::new().unwrap();
    let cmds = build_commands(&poetry(&dir, ""));
    let lines: Vec<String> = cmds.iter().map(|c| c.to_string()).collect();
    assert_eq!(lines, vec!["poetry build"]);
  }

  #[test]
  fn pipenv_builds_sdist_and_wheel() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(PIPFILE), "[packages]\n").unwrap();
    std::fs::write(dir.path().join(SETUP_PY), "").unwrap();
    let project = Project::detect(ProjectData::load(dir.path()).unwrap()).unwrap();

    let lines: Vec<String> = build_commands(&project).iter().map(|c| c.to_string()).collect();

    assert_eq!(
      lines,
      vec!["pipenv run python setup.py sdist", "pipenv run python setup.py bdist_wheel"]
    );
  }

  #[test]
  fn artifacts_are_sorted_and_relative() {
    let dir = TempDir::new().unwrap();
    let project = poetry(&dir, "");
    let dist = dir.path().join("dist");
    std::fs::create_dir(&dist).unwrap();
    std::fs::write(dist.join("demo-0.1.0.tar.gz"), "").unwrap();
    std::fs::write(dist.join("demo-0.1.0-py3-none-any.whl"), "").unwrap();

    let files = artifacts(&project).unwrap();

    assert_eq!(
      files,
      vec![
        PathBuf::from("dist/demo-0.1.0-py3-none-any.whl"),
        PathBuf::from("dist/demo-0.1.0.tar.gz"),
      ]
    );
    assert_eq!(
      upload_command(&project, &files).to_string(),
      "poetry run twine upload dist/demo-0.1.0-py3-none-any.whl dist/demo-0.1.0.tar.gz"
    );
  }

  #[test]
  fn private_projects_are_refused() {
    let dir = TempDir::new().unwrap();
    let err = ensure_public(&poetry(&dir, "")).unwrap_err();
    assert!(matches!(err, DistError::NotPublic(name) if name == "demo"));
  }

  #[test]
  fn public_projects_pass() {
    let dir = TempDir::new().unwrap();
    ensure_public(&poetry(&dir, "\n[tool.cosy]\npublic = true\n")).unwrap();
  }

  #[tokio::test]
  async fn upload_without_artifacts_fails() {
    let dir = TempDir::new().unwrap();
    let project = poetry(&dir, "");
    std::fs::create_dir(dir.path().join("dist")).unwrap();
    assert!(matches!(upload(&project).await, Err(DistError::NoArtifacts(_))));
  }
}
