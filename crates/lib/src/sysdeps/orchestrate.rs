//! Install native dependencies around a unit of work, then clean up.
//!
//! The flow for one run is:
//!
//! 1. Snapshot installed packages (done by [`System::snapshot`])
//! 2. Resolve every Python dependency to native packages
//! 3. Install the union in one package manager call
//! 4. Run the work (language-level install, build, ...)
//! 5. Remove build-only packages added by this run
//!
//! Cleanup runs whether or not the work succeeded. Without any Python
//! dependencies the package manager is never called. If step 3 fails, the
//! packages that did make it onto the host are rolled back and the work is
//! never started.

use std::collections::BTreeSet;
use std::future::Future;

use tracing::{error, info, warn};

use super::manager::PackageManager;
use super::resolve::Resolver;
use super::system::System;
use super::types::SysdepsError;

/// Result of the work plus what happened to the host around it.
#[derive(Debug)]
pub struct SysdepsOutcome<T> {
  pub value: T,
  /// Native packages passed to the package manager.
  pub installed: BTreeSet<String>,
  /// Native packages removed by the cleanup pass.
  pub removed: BTreeSet<String>,
}

/// Resolve `packages`, install their native dependencies, run `work`, and
/// clean up.
///
/// When both `work` and the cleanup fail, the work error is returned and the
/// cleanup error is logged.
pub async fn install_with_sysdeps<M, I, S, F, Fut, T, E>(
  system: &mut System<M>,
  resolver: &Resolver<'_>,
  packages: I,
  work: F,
) -> Result<SysdepsOutcome<T>, E>
where
  M: PackageManager,
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<T, E>>,
  E: From<SysdepsError>,
{
  let requested = resolver.resolve_all(system.state_mut(), packages, false);
  if requested.is_empty() {
    info!("no native dependencies needed");
    let value = work().await?;
    return Ok(SysdepsOutcome {
      value,
      installed: requested,
      removed: BTreeSet::new(),
    });
  }
  info!(count = requested.len(), distro = %resolver.distro(), "installing native dependencies");

  if let Err(err) = system.install(&requested).await {
    error!(error = %err, "native dependency install failed");
    match system.rollback(&requested).await {
      Ok(removed) if !removed.is_empty() => info!(removed = ?removed, "rolled back partial install"),
      Ok(_) => {}
      Err(rollback_err) => warn!(error = %rollback_err, "rollback after failed install also failed"),
    }
    return Err(err.into());
  }

  let result = work().await;
  let cleanup = system.cleanup().await;

  match (result, cleanup) {
    (Ok(value), Ok(removed)) => Ok(SysdepsOutcome {
      value,
      installed: requested,
      removed,
    }),
    (Ok(_), Err(cleanup_err)) => Err(cleanup_err.into()),
    (Err(work_err), Ok(removed)) => {
      info!(removed = ?removed, "work failed, build-only packages cleaned up");
      Err(work_err)
    }
    (Err(work_err), Err(cleanup_err)) => {
      warn!(error = %cleanup_err, "cleanup after failed work also failed");
      Err(work_err)
    }
  }
}
