//! Managed project files.
//!
//! cosy owns the generic part of a project's `.gitignore`. The section
//! between the project-specific and generic markers belongs to the project
//! and survives every update.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

const GITIGNORE_TEMPLATE: &str = include_str!("../data/gitignore");
const PLACEHOLDER: &str = "{project_specific_text}";
const PROJECT_SPECIFIC_MARKER: &str = "## -- Project Specific --\n";
const GENERIC_MARKER: &str = "## -- Generic --\n";

#[derive(Debug, Error)]
pub enum SkelError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Rewrite `text` on top of the current template.
///
/// With markers present only the project-specific section is kept. Without
/// them the file predates cosy: every line the template already has is
/// dropped and the rest becomes the project-specific section.
pub fn patch_gitignore(text: &str) -> String {
  let project_specific = match text.find(PROJECT_SPECIFIC_MARKER) {
    Some(pos) => {
      let start = pos + PROJECT_SPECIFIC_MARKER.len();
      let end = text[start..].find(GENERIC_MARKER).map_or(text.len(), |i| start + i);
      text[start..end].trim().to_string()
    }
    None => {
      let template_lines: Vec<&str> = GITIGNORE_TEMPLATE.lines().collect();
      text
        .lines()
        .filter(|line| !template_lines.contains(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
    }
  };

  GITIGNORE_TEMPLATE.replace(PLACEHOLDER, &project_specific)
}

/// Patch `<root>/.gitignore`, writing it only when something changed.
///
/// Returns the path when the file was written.
pub fn update_gitignore(root: &Path) -> Result<Option<PathBuf>, SkelError> {
  let path = root.join(".gitignore");
  let current = if path.is_file() {
    std::fs::read_to_string(&path).map_err(|source| SkelError::Read {
      path: path.clone(),
      source,
    })?
  } else {
    String::new()
  };

  let updated = patch_gitignore(&current);
  if updated == current {
    debug!(path = %path.display(), "gitignore up to date");
    return Ok(None);
  }

  std::fs::write(&path, updated).map_err(|source| SkelError::Write {
    path: path.clone(),
    source,
  })?;
  Ok(Some(path))
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  const MIGRATE: &str = "
# an existing gitignore file which is not generated by cosy
some-really-special-path

# some path already in cosy
*.egg
";

  const UPDATE: &str = "## This file is managed by cosy
##
## Only make changes by hand below the project specific section.

## -- Project Specific --
some-really-special-path

## -- Generic --
some-really-old-stuff-here
";

  #[test]
  fn fresh_file_is_template() {
    let new = patch_gitignore("");
    assert!(new.starts_with("## This file is managed by cosy"));
    assert!(!new.contains(PLACEHOLDER));
  }

  #[test]
  fn update_keeps_project_section_only() {
    let updated = patch_gitignore(UPDATE);

    assert!(updated.starts_with("## This file is managed by cosy"));
    assert!(updated.contains(GENERIC_MARKER));
    assert!(updated.contains("some-really-special-path"));
    assert!(!updated.contains("some-really-old-stuff-here"));
    assert!(updated.contains("dist/"));
  }

  #[test]
  fn migration_drops_lines_already_in_template() {
    let migrated = patch_gitignore(MIGRATE);

    assert!(migrated.contains(GENERIC_MARKER));
    assert!(migrated.contains("some-really-special-path"));
    assert_eq!(migrated.matches("*.egg\n").count(), 1);
  }

  #[test]
  fn patching_is_stable() {
    let once = patch_gitignore(MIGRATE);
    assert_eq!(patch_gitignore(&once), once);
  }

  #[test]
  fn update_writes_only_on_change() {
    let temp = TempDir::new().unwrap();

    let written = update_gitignore(temp.path()).unwrap();
    assert_eq!(written, Some(temp.path().join(".gitignore")));

    assert_eq!(update_gitignore(temp.path()).unwrap(), None);
  }
}
