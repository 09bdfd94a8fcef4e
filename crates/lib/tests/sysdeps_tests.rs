//! End-to-end tests of native dependency handling through the public API.
//!
//! A recording package manager stands in for dnf/apt so the full
//! snapshot → resolve → install → work → cleanup cycle runs without root.

use std::collections::BTreeSet;
use std::sync::Mutex;

use cosy_lib::index::PackageIndex;
use cosy_lib::platform::Distro;
use cosy_lib::sysdeps::{PackageManager, Resolver, SysdepsError, System, SystemState, install_with_sysdeps};

const PILLOW_INDEX: &str = r#"
pillow:
  ubuntu:
    build: [libjpeg-dev]
    run: [libjpeg62]
"#;

fn set(items: &[&str]) -> BTreeSet<String> {
  items.iter().map(|s| s.to_string()).collect()
}

/// Keeps an installed set and a log of removals.
struct RecordingManager {
  installed: Mutex<BTreeSet<String>>,
  removed: Mutex<Vec<BTreeSet<String>>>,
}

impl RecordingManager {
  fn new(installed: &[&str]) -> Self {
    Self {
      installed: Mutex::new(set(installed)),
      removed: Mutex::new(Vec::new()),
    }
  }
}

impl PackageManager for RecordingManager {
  fn distro(&self) -> Distro {
    Distro::Ubuntu
  }

  async fn installed_packages(&self) -> Result<BTreeSet<String>, SysdepsError> {
    Ok(self.installed.lock().unwrap().clone())
  }

  async fn install(&self, packages: &BTreeSet<String>) -> Result<(), SysdepsError> {
    self.installed.lock().unwrap().extend(packages.iter().cloned());
    Ok(())
  }

  async fn remove(&self, packages: &BTreeSet<String>) -> Result<(), SysdepsError> {
    let mut installed = self.installed.lock().unwrap();
    for pkg in packages {
      installed.remove(pkg);
    }
    self.removed.lock().unwrap().push(packages.clone());
    Ok(())
  }
}

mod pillow_on_ubuntu {
  use super::*;

  #[test]
  fn resolve_mixed_case() {
    let index = PackageIndex::from_yaml_str(PILLOW_INDEX).unwrap();
    let resolver = Resolver::new(&index, Distro::Ubuntu);

    let packages = resolver.resolve(&mut SystemState::default(), "Pillow", false);

    assert_eq!(packages, set(&["build-essential", "libjpeg-dev", "libjpeg62"]));
  }

  #[tokio::test]
  async fn install_then_cleanup_keeps_runtime_library() {
    let index = PackageIndex::from_yaml_str(PILLOW_INDEX).unwrap();
    let resolver = Resolver::new(&index, Distro::Ubuntu);
    let mut system = System::snapshot(RecordingManager::new(&["coreutils"])).await.unwrap();

    let outcome = install_with_sysdeps(&mut system, &resolver, ["Pillow"], || async {
      Ok::<_, SysdepsError>(())
    })
    .await
    .unwrap();

    assert_eq!(outcome.removed, set(&["build-essential", "libjpeg-dev"]));

    let installed = system.manager().installed.lock().unwrap().clone();
    assert_eq!(installed, set(&["coreutils", "libjpeg62"]));
    assert_eq!(system.manager().removed.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn preinstalled_build_packages_survive() {
    let index = PackageIndex::from_yaml_str(PILLOW_INDEX).unwrap();
    let resolver = Resolver::new(&index, Distro::Ubuntu);
    let manager = RecordingManager::new(&["build-essential", "libjpeg-dev"]);
    let mut system = System::snapshot(manager).await.unwrap();

    let outcome = install_with_sysdeps(&mut system, &resolver, ["pillow"], || async {
      Ok::<_, SysdepsError>(())
    })
    .await
    .unwrap();

    assert!(outcome.removed.is_empty());
    let installed = system.manager().installed.lock().unwrap().clone();
    assert!(installed.contains("build-essential"));
    assert!(installed.contains("libjpeg-dev"));
  }
}

mod embedded_index {
  use super::*;

  #[test]
  fn every_entry_resolves_on_every_distro() {
    let index = PackageIndex::embedded().unwrap();
    assert!(!index.is_empty());

    for distro in Distro::ALL {
      let resolver = Resolver::new(&index, distro);
      for name in ["pillow", "lxml", "psycopg2", "numpy"] {
        let mut state = SystemState::default();
        let full = resolver.resolve(&mut state, name, false);
        let run_only = resolver.resolve(&mut SystemState::default(), name, true);

        assert!(run_only.is_subset(&full), "{name} on {distro}");
        let kept: BTreeSet<String> = state.run_packages().clone();
        assert!(state.cleanup_set(distro.bootstrap_packages()).is_disjoint(&kept));
      }
    }
  }
}
