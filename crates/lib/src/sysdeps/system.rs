use std::collections::BTreeSet;

use tracing::info;

use crate::platform::Distro;

use super::manager::PackageManager;
use super::state::SystemState;
use super::types::SysdepsError;

/// A host package manager plus the bookkeeping of one run.
#[derive(Debug)]
pub struct System<M> {
  manager: M,
  state: SystemState,
}

impl<M: PackageManager> System<M> {
  /// Snapshot the installed packages and start a run.
  pub async fn snapshot(manager: M) -> Result<Self, SysdepsError> {
    let initial = manager.installed_packages().await?;
    info!(distro = %manager.distro(), installed = initial.len(), "captured installed packages");
    Ok(Self {
      manager,
      state: SystemState::new(initial),
    })
  }

  pub fn distro(&self) -> Distro {
    self.manager.distro()
  }

  pub fn manager(&self) -> &M {
    &self.manager
  }

  pub fn state(&self) -> &SystemState {
    &self.state
  }

  pub fn state_mut(&mut self) -> &mut SystemState {
    &mut self.state
  }

  /// Install `packages` in one batched invocation.
  pub async fn install(&self, packages: &BTreeSet<String>) -> Result<(), SysdepsError> {
    self.manager.install(packages).await
  }

  /// Packages the cleanup pass would remove right now.
  pub fn cleanup_set(&self) -> BTreeSet<String> {
    self.state.cleanup_set(self.distro().bootstrap_packages())
  }

  /// Remove build-only packages added by this run and return them.
  ///
  /// Packages present before the run and packages needed at runtime are
  /// never touched.
  pub async fn cleanup(&self) -> Result<BTreeSet<String>, SysdepsError> {
    let to_remove = self.cleanup_set();
    if to_remove.is_empty() {
      info!("no build-only packages to clean up");
    } else {
      self.manager.remove(&to_remove).await?;
    }
    Ok(to_remove)
  }

  /// Undo a partially failed install of `requested`.
  ///
  /// Re-queries the host and removes the requested packages that appeared
  /// since the snapshot.
  pub async fn rollback(&self, requested: &BTreeSet<String>) -> Result<BTreeSet<String>, SysdepsError> {
    let now = self.manager.installed_packages().await?;
    let added: BTreeSet<String> = requested
      .iter()
      .filter(|pkg| now.contains(*pkg) && !self.state.initial_packages().contains(*pkg))
      .cloned()
      .collect();

    if !added.is_empty() {
      info!(count = added.len(), "rolling back partially installed packages");
      self.manager.remove(&added).await?;
    }
    Ok(added)
  }
}
