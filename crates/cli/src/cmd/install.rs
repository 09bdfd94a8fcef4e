//! Implementation of the `cosy install` command.

use anyhow::{Context, Result};

use cosy_lib::exec::ProcessOutput;

use crate::output::{print_error, print_info};

use super::{current_project, runtime, with_sysdeps};

/// Install the project's Python dependencies, optionally preparing native
/// dependencies first.
///
/// Returns the exit code of the project tool.
pub fn cmd_install(with_sysdeps_flag: bool) -> Result<i32> {
  let project = current_project()?;
  let rt = runtime()?;

  let install = || async { project.install().await.context("Failed to run project install") };

  let output: ProcessOutput = if with_sysdeps_flag {
    with_sysdeps(&rt, &project, "cosy install --with-sysdeps", install)?
  } else {
    print_info(&format!("Installing python dependencies with {}", project.kind()));
    rt.block_on(install())?
  };

  print!("{}", output.stdout);
  if !output.success() {
    eprint!("{}", output.stderr);
    print_error(&format!("{} install failed with code {}", project.kind(), output.code_or_signal()));
    return Ok(output.code_or_signal().max(1));
  }
  Ok(0)
}
