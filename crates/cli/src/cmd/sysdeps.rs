//! Implementation of the `cosy sysdeps` commands.

use anyhow::{Context, Result};
use serde::Serialize;

use cosy_lib::config::Config;
use cosy_lib::platform::Distro;
use cosy_lib::sysdeps::{Resolver, SystemState};

use crate::output::OutputFormat;

use super::current_project;

#[derive(Serialize)]
struct SysdepsList<'a> {
  distro: Distro,
  run_only: bool,
  packages: Vec<&'a str>,
}

/// Print the native packages the project's Python dependencies need.
///
/// Read-only: the host package database is neither queried nor changed.
pub fn cmd_sysdeps_list(run_only: bool, format: OutputFormat) -> Result<()> {
  let project = current_project()?;
  let config = Config::load().context("Failed to load config")?;
  let distro = config.select_distro()?;
  let index = config.load_index().context("Failed to load dependency index")?;

  let resolver = Resolver::new(&index, distro);
  let mut state = SystemState::default();
  let packages = resolver.resolve_all(&mut state, &project.get_packages_list()?, run_only);

  if format.is_json() {
    return crate::output::print_json(&SysdepsList {
      distro,
      run_only,
      packages: packages.iter().map(String::as_str).collect(),
    });
  }

  for pkg in &packages {
    println!("{pkg}");
  }
  Ok(())
}
