//! Implementation of the `cosy update` command.
//!
//! Brings the project's managed files in line with the current templates.

use anyhow::{Context, Result};

use cosy_lib::skel::update_gitignore;

use crate::output::{print_info, print_success};

use super::current_project;

pub fn cmd_update() -> Result<()> {
  let project = current_project()?;

  match update_gitignore(project.path()).context("Failed to update .gitignore")? {
    Some(path) => print_success(&format!("{} updated", path.display())),
    None => print_info("Already up to date"),
  }
  Ok(())
}
