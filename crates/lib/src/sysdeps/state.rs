use std::collections::BTreeSet;

use serde::Serialize;

/// Native package bookkeeping for one run.
///
/// `initial_packages` is fixed at construction. `build_packages` and
/// `run_packages` only ever grow while dependencies are resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemState {
  initial_packages: BTreeSet<String>,
  build_packages: BTreeSet<String>,
  run_packages: BTreeSet<String>,
}

impl SystemState {
  /// Start a run on a host where `initial_packages` are already installed.
  pub fn new(initial_packages: BTreeSet<String>) -> Self {
    Self {
      initial_packages,
      ..Default::default()
    }
  }

  pub fn initial_packages(&self) -> &BTreeSet<String> {
    &self.initial_packages
  }

  /// Packages needed only to build or collect sources.
  pub fn build_packages(&self) -> &BTreeSet<String> {
    &self.build_packages
  }

  /// Packages needed at runtime by something resolved in this run.
  pub fn run_packages(&self) -> &BTreeSet<String> {
    &self.run_packages
  }

  pub(crate) fn record_build<I, S>(&mut self, packages: I)
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.build_packages.extend(packages.into_iter().map(Into::into));
  }

  pub(crate) fn record_run<I, S>(&mut self, packages: I)
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.run_packages.extend(packages.into_iter().map(Into::into));
  }

  /// Packages that may be removed once the build work is done.
  ///
  /// `(build ∪ bootstrap) − (initial ∪ run)`: nothing that predates the run
  /// and nothing a resolved package needs at runtime.
  pub fn cleanup_set(&self, bootstrap: &[&str]) -> BTreeSet<String> {
    self
      .build_packages
      .iter()
      .map(String::as_str)
      .chain(bootstrap.iter().copied())
      .filter(|pkg| !self.initial_packages.contains(*pkg) && !self.run_packages.contains(*pkg))
      .map(str::to_string)
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn cleanup_keeps_initial_packages() {
    let mut state = SystemState::new(set(&["build-essential", "libpq-dev"]));
    state.record_build(["libpq-dev", "libjpeg-dev"]);

    assert_eq!(state.cleanup_set(&["build-essential"]), set(&["libjpeg-dev"]));
  }

  #[test]
  fn cleanup_keeps_runtime_packages_even_if_also_build() {
    // libffi-dev is a build dep of one package and a runtime dep of another
    let mut state = SystemState::default();
    state.record_build(["libffi-dev", "libssl-dev"]);
    state.record_run(["libffi-dev"]);

    assert_eq!(state.cleanup_set(&[]), set(&["libssl-dev"]));
  }

  #[test]
  fn cleanup_includes_bootstrap_packages() {
    let state = SystemState::default();
    assert_eq!(
      state.cleanup_set(&["gcc", "python3-devel"]),
      set(&["gcc", "python3-devel"])
    );
  }

  #[test]
  fn recording_is_set_union() {
    let mut state = SystemState::default();
    state.record_run(["libjpeg62"]);
    state.record_run(["libjpeg62"]);
    state.record_build(["libjpeg-dev", "libjpeg-dev"]);

    assert_eq!(state.run_packages().len(), 1);
    assert_eq!(state.build_packages().len(), 1);
  }
}
