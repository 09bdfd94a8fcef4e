mod dist;
mod info;
mod install;
mod publish;
mod sysdeps;
mod test;
mod update;

use std::future::Future;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use tracing::debug;

use cosy_lib::config::Config;
use cosy_lib::project::Project;
use cosy_lib::sysdeps::{HostLock, HostManager, Resolver, SysdepsError, System, install_with_sysdeps};

use crate::output::{format_duration, print_info, print_packages, print_success, print_warning, symbols};

pub use dist::cmd_dist;
pub use info::cmd_info;
pub use install::cmd_install;
pub use publish::cmd_publish;
pub use sysdeps::cmd_sysdeps_list;
pub use test::cmd_test;
pub use update::cmd_update;

fn runtime() -> Result<Runtime> {
  Runtime::new().context("Failed to create async runtime")
}

/// The project containing the working directory.
fn current_project() -> Result<Project> {
  let cwd = std::env::current_dir().context("Failed to read working directory")?;
  Project::find(&cwd).context("Failed to detect project")
}

/// Run `work` with the project's native dependencies installed.
///
/// Holds the host lock for the whole run. Build-only packages added here are
/// removed afterwards, also when `work` fails.
fn with_sysdeps<T, F, Fut>(rt: &Runtime, project: &Project, command: &str, work: F) -> Result<T>
where
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<T>>,
{
  let start = Instant::now();
  let config = Config::load().context("Failed to load config")?;
  let distro = config.select_distro()?;
  let index = config.load_index().context("Failed to load dependency index")?;
  let options = config.manager_options()?;
  let packages = project.get_packages_list()?;
  debug!(count = packages.len(), %distro, "python dependencies");

  let _lock = HostLock::acquire(command)?;
  let resolver = Resolver::new(&index, distro);

  print_info(&format!("Installing system dependencies ({distro})"));
  let outcome = rt.block_on(async {
    let mut system = System::snapshot(HostManager::for_distro(distro, options)).await?;
    install_with_sysdeps(&mut system, &resolver, &packages, work).await
  });
  let outcome = match outcome {
    Ok(outcome) => outcome,
    Err(e) => {
      if e.downcast_ref::<SysdepsError>().is_some_and(SysdepsError::is_timeout) {
        print_warning("The package manager timed out; raise `timeout` in the cosy config if it is just slow");
      }
      return Err(e);
    }
  };

  if !outcome.installed.is_empty() {
    println!("Installed:");
    print_packages(symbols::ADD, &outcome.installed);
  }
  if !outcome.removed.is_empty() {
    println!("Cleaned up:");
    print_packages(symbols::REMOVE, &outcome.removed);
  }
  print_success(&format!("System dependencies handled in {}", format_duration(start.elapsed())));

  Ok(outcome.value)
}
