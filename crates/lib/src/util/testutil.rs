//! Test helpers shared across cosy-lib unit tests.

use std::collections::BTreeSet;
use std::sync::Mutex;

use crate::platform::Distro;
use crate::sysdeps::{PackageManager, SysdepsError};

/// Returns the shell command and args to execute a shell script.
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

pub fn set(items: &[&str]) -> BTreeSet<String> {
  items.iter().map(|s| s.to_string()).collect()
}

/// A package manager mutation recorded by [`FakeManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
  Install(BTreeSet<String>),
  Remove(BTreeSet<String>),
}

/// In-memory package manager that records every mutation.
#[derive(Debug)]
pub struct FakeManager {
  distro: Distro,
  installed: Mutex<BTreeSet<String>>,
  calls: Mutex<Vec<FakeCall>>,
  // Some(partial) makes install fail after landing `partial`
  fail_install: Option<BTreeSet<String>>,
  fail_remove: bool,
}

impl FakeManager {
  pub fn new(distro: Distro, installed: &[&str]) -> Self {
    Self {
      distro,
      installed: Mutex::new(set(installed)),
      calls: Mutex::new(Vec::new()),
      fail_install: None,
      fail_remove: false,
    }
  }

  /// Make installs fail after `partial` has been put on the host.
  pub fn failing_install(mut self, partial: &[&str]) -> Self {
    self.fail_install = Some(set(partial));
    self
  }

  pub fn failing_remove(mut self) -> Self {
    self.fail_remove = true;
    self
  }

  pub fn calls(&self) -> Vec<FakeCall> {
    self.calls.lock().unwrap().clone()
  }

  pub fn installed(&self) -> BTreeSet<String> {
    self.installed.lock().unwrap().clone()
  }
}

impl PackageManager for FakeManager {
  fn distro(&self) -> Distro {
    self.distro
  }

  async fn installed_packages(&self) -> Result<BTreeSet<String>, SysdepsError> {
    Ok(self.installed())
  }

  async fn install(&self, packages: &BTreeSet<String>) -> Result<(), SysdepsError> {
    if packages.is_empty() {
      return Ok(());
    }
    self.calls.lock().unwrap().push(FakeCall::Install(packages.clone()));

    if let Some(partial) = &self.fail_install {
      self.installed.lock().unwrap().extend(partial.iter().cloned());
      return Err(SysdepsError::InstallFailed {
        cmd: "fake install".to_string(),
        code: 100,
        output: "E: simulated failure".to_string(),
      });
    }

    self.installed.lock().unwrap().extend(packages.iter().cloned());
    Ok(())
  }

  async fn remove(&self, packages: &BTreeSet<String>) -> Result<(), SysdepsError> {
    if packages.is_empty() {
      return Ok(());
    }
    self.calls.lock().unwrap().push(FakeCall::Remove(packages.clone()));

    if self.fail_remove {
      return Err(SysdepsError::RemoveFailed {
        cmd: "fake remove".to_string(),
        code: 1,
        output: "simulated failure".to_string(),
      });
    }

    let mut installed = self.installed.lock().unwrap();
    for pkg in packages {
      installed.remove(pkg);
    }
    Ok(())
  }
}
