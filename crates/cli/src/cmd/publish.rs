//! Implementation of the `cosy publish` command.

use anyhow::{Context, Result};

use cosy_lib::dist::{self, DistError};

use crate::output::{print_error, print_info, print_success};

use super::dist::make_dist;
use super::{current_project, runtime};

/// Build and upload the project. Only `[tool.cosy] public = true` projects
/// are uploaded.
pub fn cmd_publish() -> Result<i32> {
  let project = current_project()?;

  match dist::ensure_public(&project) {
    Ok(()) => {}
    Err(DistError::NotPublic(_)) => {
      print_error("Project not public. Not uploading to pypi");
      return Ok(1);
    }
    Err(e) => return Err(e.into()),
  }

  let rt = runtime()?;
  print_info("Creating distribution");
  let code = rt.block_on(make_dist(&project))?;
  if code != 0 {
    return Ok(code);
  }

  print_info("Uploading");
  rt.block_on(dist::upload(&project)).context("Upload failed")?;
  print_success("Published");
  Ok(0)
}
