//! Python package name → native package closure.

use std::collections::BTreeSet;

use tracing::debug;

use crate::index::PackageIndex;
use crate::platform::Distro;

use super::state::SystemState;

/// Trim and lower-case a Python package name for index lookup.
pub fn normalize(package: &str) -> String {
  package.trim().to_lowercase()
}

/// Resolves Python packages against the index for one distribution.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
  index: &'a PackageIndex,
  distro: Distro,
}

impl<'a> Resolver<'a> {
  pub fn new(index: &'a PackageIndex, distro: Distro) -> Self {
    Self { index, distro }
  }

  pub fn distro(&self) -> Distro {
    self.distro
  }

  /// The distribution's compiler toolchain set.
  pub fn bootstrap(&self) -> BTreeSet<String> {
    self.distro.bootstrap_packages().iter().map(|s| s.to_string()).collect()
  }

  /// Native packages needed to build and run `package`.
  ///
  /// Always contains the bootstrap set. Runtime packages are recorded in
  /// `state` as run packages; build and collect packages are recorded as
  /// build packages and only included when `run_only` is false. Unknown
  /// packages resolve to the bootstrap set alone.
  pub fn resolve(&self, state: &mut SystemState, package: &str, run_only: bool) -> BTreeSet<String> {
    let name = normalize(package);
    let reqs = self.index.lookup(&name, self.distro);

    let mut packages = self.bootstrap();

    packages.extend(reqs.run.iter().cloned());
    state.record_run(reqs.run.iter().cloned());

    if !run_only {
      let build = reqs.collect.iter().chain(reqs.build.iter()).cloned();
      packages.extend(build.clone());
      state.record_build(build);
    }

    debug!(package = %name, distro = %self.distro, run_only, native = ?packages, "resolved");
    packages
  }

  /// Union of [`Resolver::resolve`] over `packages`; empty for no packages.
  pub fn resolve_all<I, S>(&self, state: &mut SystemState, packages: I, run_only: bool) -> BTreeSet<String>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut all = BTreeSet::new();
    for package in packages {
      all.extend(self.resolve(state, package.as_ref(), run_only));
    }
    all
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = r#"
pillow:
  ubuntu:
    build: [libjpeg-dev]
    run: [libjpeg62]
  fedora:
    build: [libjpeg-turbo-devel]
    run: [libjpeg-turbo]
setuptools-scm:
  ubuntu:
    collect: [git]
psycopg2:
  ubuntu:
    build: [libpq-dev]
    run: [libpq5]
"#;

  fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  fn index() -> PackageIndex {
    PackageIndex::from_yaml_str(SAMPLE).unwrap()
  }

  #[test]
  fn resolves_mixed_case_name() {
    let index = index();
    let resolver = Resolver::new(&index, Distro::Ubuntu);
    let mut state = SystemState::default();

    let packages = resolver.resolve(&mut state, "  Pillow ", false);

    assert_eq!(packages, set(&["build-essential", "libjpeg-dev", "libjpeg62"]));
    assert_eq!(state.run_packages(), &set(&["libjpeg62"]));
    assert_eq!(state.build_packages(), &set(&["libjpeg-dev"]));
  }

  #[test]
  fn collect_counts_as_build() {
    let index = index();
    let resolver = Resolver::new(&index, Distro::Ubuntu);
    let mut state = SystemState::default();

    let packages = resolver.resolve(&mut state, "setuptools-scm", false);

    assert!(packages.contains("git"));
    assert_eq!(state.build_packages(), &set(&["git"]));
    assert!(state.run_packages().is_empty());
  }

  #[test]
  fn resolution_is_idempotent() {
    let index = index();
    let resolver = Resolver::new(&index, Distro::Ubuntu);
    let mut state = SystemState::default();

    let first = resolver.resolve(&mut state, "pillow", false);
    let after_first = state.clone();
    let second = resolver.resolve(&mut state, "PILLOW", false);

    assert_eq!(first, second);
    assert_eq!(state, after_first);
  }

  #[test]
  fn run_only_is_subset_and_skips_build_bookkeeping() {
    let index = index();
    for distro in Distro::ALL {
      let resolver = Resolver::new(&index, distro);
      for name in ["pillow", "setuptools-scm", "psycopg2", "unknown"] {
        let mut run_state = SystemState::default();
        let run_only = resolver.resolve(&mut run_state, name, true);
        let full = resolver.resolve(&mut SystemState::default(), name, false);

        assert!(run_only.is_subset(&full), "{name} on {distro}");
        assert!(run_state.build_packages().is_empty());
      }
    }
  }

  #[test]
  fn bootstrap_always_included() {
    let index = index();
    for distro in Distro::ALL {
      let resolver = Resolver::new(&index, distro);
      for name in ["pillow", "psycopg2", "requests"] {
        for run_only in [false, true] {
          let packages = resolver.resolve(&mut SystemState::default(), name, run_only);
          for pkg in distro.bootstrap_packages() {
            assert!(packages.contains(*pkg), "{pkg} missing for {name} on {distro}");
          }
        }
      }
    }
  }

  #[test]
  fn unknown_package_is_exactly_bootstrap() {
    let index = index();
    let resolver = Resolver::new(&index, Distro::Fedora);
    let mut state = SystemState::default();

    let packages = resolver.resolve(&mut state, "totally-unknown-pkg-xyz", false);

    assert_eq!(packages, resolver.bootstrap());
    assert!(state.build_packages().is_empty());
    assert!(state.run_packages().is_empty());
  }

  #[test]
  fn resolve_all_unions_everything() {
    let index = index();
    let resolver = Resolver::new(&index, Distro::Ubuntu);
    let mut state = SystemState::default();

    let packages = resolver.resolve_all(&mut state, ["Pillow", "psycopg2", "requests"], false);

    assert_eq!(
      packages,
      set(&["build-essential", "libjpeg-dev", "libjpeg62", "libpq-dev", "libpq5"])
    );
    assert_eq!(state.run_packages(), &set(&["libjpeg62", "libpq5"]));
  }

  #[test]
  fn resolve_all_of_nothing_is_empty() {
    let index = index();
    let resolver = Resolver::new(&index, Distro::Ubuntu);
    let packages = resolver.resolve_all(&mut SystemState::default(), Vec::<String>::new(), false);
    assert!(packages.is_empty());
  }
}
