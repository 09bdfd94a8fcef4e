//! Implementation of the `cosy test` command.

use anyhow::{Context, Result};

use cosy_lib::checks::run_checks;
use cosy_lib::project::Project;

use crate::output::print_success;

use super::{current_project, runtime};

/// Run the quality gates and return their bitmask as the exit code.
pub fn cmd_test() -> Result<i32> {
  let project = current_project()?;
  runtime()?.block_on(run_tests(&project))
}

/// Run every gate, printing the output of the failing ones.
pub(super) async fn run_tests(project: &Project) -> Result<i32> {
  let report = run_checks(project).await.context("Failed to run quality gates")?;

  for failure in report.failures() {
    println!("== {} failed with code {} ==", failure.gate, failure.output.code_or_signal());
    println!("{}", failure.output.combined());
  }

  if report.passed() {
    print_success("All checks passed");
  }
  Ok(report.code())
}
