//! Implementation of the `cosy dist` command.

use anyhow::{Context, Result};

use cosy_lib::dist;
use cosy_lib::project::Project;

use crate::output::{print_error, print_success};

use super::test::run_tests;
use super::{current_project, runtime, with_sysdeps};

/// Test, then build sdist and wheel into `dist/`.
///
/// Returns the test bitmask when the gates fail; nothing is built then.
pub fn cmd_dist(with_sysdeps_flag: bool) -> Result<i32> {
  let project = current_project()?;
  let rt = runtime()?;

  if with_sysdeps_flag {
    with_sysdeps(&rt, &project, "cosy dist --with-sysdeps", || make_dist(&project))
  } else {
    rt.block_on(make_dist(&project))
  }
}

pub(super) async fn make_dist(project: &Project) -> Result<i32> {
  let code = run_tests(project).await?;
  if code != 0 {
    print_error("Not creating dist due to failing tests");
    return Ok(code);
  }

  let outputs = dist::build(project).await.context("Failed to build distributables")?;
  for output in &outputs {
    print!("{}", output.stdout);
  }
  print_success(&format!("Distributables written to {}", project.data().dist_path().display()));
  Ok(0)
}
