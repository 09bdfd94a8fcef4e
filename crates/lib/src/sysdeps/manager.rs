//! Host package managers.
//!
//! One implementation per distribution family. All mutations are batched
//! into a single non-interactive invocation; an empty set never spawns a
//! process.

use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

use crate::consts::DEFAULT_TIMEOUT;
use crate::exec::{ProcessCommand, ProcessOutput};
use crate::platform::{self, Distro, Family};

use super::types::SysdepsError;

/// Operations cosy needs from a native package manager.
pub trait PackageManager {
  /// Distribution whose package names this manager understands.
  fn distro(&self) -> Distro;

  /// Names of every native package currently installed.
  fn installed_packages(&self) -> impl Future<Output = Result<BTreeSet<String>, SysdepsError>> + Send;

  fn install(&self, packages: &BTreeSet<String>) -> impl Future<Output = Result<(), SysdepsError>> + Send;

  fn remove(&self, packages: &BTreeSet<String>) -> impl Future<Output = Result<(), SysdepsError>> + Send;
}

/// Settings shared by the concrete managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerOptions {
  /// Upper bound for one package manager invocation.
  pub timeout: Duration,
  /// Prefix mutations with `sudo` when not running as root.
  pub sudo: bool,
}

impl Default for ManagerOptions {
  fn default() -> Self {
    Self {
      timeout: DEFAULT_TIMEOUT,
      sudo: true,
    }
  }
}

impl ManagerOptions {
  fn privileged(&self, cmd: ProcessCommand) -> ProcessCommand {
    self.privileged_as(cmd, platform::is_elevated())
  }

  fn privileged_as(&self, cmd: ProcessCommand, elevated: bool) -> ProcessCommand {
    let cmd = cmd.timeout(self.timeout);
    if self.sudo && !elevated {
      cmd.wrapped(["sudo"])
    } else {
      cmd
    }
  }
}

/// RedHat family: queries through rpm, mutates through dnf.
#[derive(Debug, Clone)]
pub struct Dnf {
  options: ManagerOptions,
}

impl Dnf {
  pub fn new(options: ManagerOptions) -> Self {
    Self { options }
  }

  fn query_command(&self) -> ProcessCommand {
    ProcessCommand::new("rpm")
      .args(["-qa", "--queryformat", "%{NAME}\\n"])
      .timeout(self.options.timeout)
  }

  fn install_command(&self, packages: &BTreeSet<String>) -> ProcessCommand {
    self
      .options
      .privileged(ProcessCommand::new("dnf").args(["install", "-y"]).args(packages.iter().cloned()))
  }

  fn remove_command(&self, packages: &BTreeSet<String>) -> ProcessCommand {
    self
      .options
      .privileged(ProcessCommand::new("dnf").args(["remove", "-y"]).args(packages.iter().cloned()))
  }
}

impl PackageManager for Dnf {
  fn distro(&self) -> Distro {
    Distro::Fedora
  }

  async fn installed_packages(&self) -> Result<BTreeSet<String>, SysdepsError> {
    let cmd = self.query_command();
    let output = cmd.output().await?;
    if !output.success() {
      return Err(query_failed(&cmd, &output));
    }
    Ok(parse_rpm_names(&output.stdout))
  }

  async fn install(&self, packages: &BTreeSet<String>) -> Result<(), SysdepsError> {
    if packages.is_empty() {
      return Ok(());
    }
    run_install(self.install_command(packages)).await
  }

  async fn remove(&self, packages: &BTreeSet<String>) -> Result<(), SysdepsError> {
    if packages.is_empty() {
      return Ok(());
    }
    run_remove(self.remove_command(packages)).await
  }
}

/// Debian family: queries through `apt list`, mutates through apt-get.
#[derive(Debug, Clone)]
pub struct Apt {
  options: ManagerOptions,
}

impl Apt {
  pub fn new(options: ManagerOptions) -> Self {
    Self { options }
  }

  fn query_command(&self) -> ProcessCommand {
    ProcessCommand::new("apt")
      .args(["list", "--installed"])
      .env("LANG", "C")
      .timeout(self.options.timeout)
  }

  fn mutation(&self, verb: &str, packages: &BTreeSet<String>) -> ProcessCommand {
    self.options.privileged(apt_get(verb, packages))
  }
}

/// `apt-get <verb> -y <packages>` with the debconf frontend set on the
/// command line, since sudo resets the environment.
fn apt_get(verb: &str, packages: &BTreeSet<String>) -> ProcessCommand {
  ProcessCommand::new("apt-get")
    .args([verb, "-y"])
    .args(packages.iter().cloned())
    .wrapped(["env", "DEBIAN_FRONTEND=noninteractive"])
}

impl PackageManager for Apt {
  fn distro(&self) -> Distro {
    Distro::Ubuntu
  }

  async fn installed_packages(&self) -> Result<BTreeSet<String>, SysdepsError> {
    let cmd = self.query_command();
    let output = cmd.output().await?;
    if !output.success() {
      return Err(query_failed(&cmd, &output));
    }
    Ok(parse_apt_installed(&output.stdout))
  }

  async fn install(&self, packages: &BTreeSet<String>) -> Result<(), SysdepsError> {
    if packages.is_empty() {
      return Ok(());
    }
    run_install(self.mutation("install", packages)).await
  }

  async fn remove(&self, packages: &BTreeSet<String>) -> Result<(), SysdepsError> {
    if packages.is_empty() {
      return Ok(());
    }
    run_remove(self.mutation("remove", packages)).await
  }
}

/// The package manager of the running host, chosen once at startup.
#[derive(Debug, Clone)]
pub enum HostManager {
  Dnf(Dnf),
  Apt(Apt),
}

impl HostManager {
  pub fn for_distro(distro: Distro, options: ManagerOptions) -> Self {
    match distro.family() {
      Family::RedHat => HostManager::Dnf(Dnf::new(options)),
      Family::Debian => HostManager::Apt(Apt::new(options)),
    }
  }
}

impl PackageManager for HostManager {
  fn distro(&self) -> Distro {
    match self {
      HostManager::Dnf(m) => m.distro(),
      HostManager::Apt(m) => m.distro(),
    }
  }

  async fn installed_packages(&self) -> Result<BTreeSet<String>, SysdepsError> {
    match self {
      HostManager::Dnf(m) => m.installed_packages().await,
      HostManager::Apt(m) => m.installed_packages().await,
    }
  }

  async fn install(&self, packages: &BTreeSet<String>) -> Result<(), SysdepsError> {
    match self {
      HostManager::Dnf(m) => m.install(packages).await,
      HostManager::Apt(m) => m.install(packages).await,
    }
  }

  async fn remove(&self, packages: &BTreeSet<String>) -> Result<(), SysdepsError> {
    match self {
      HostManager::Dnf(m) => m.remove(packages).await,
      HostManager::Apt(m) => m.remove(packages).await,
    }
  }
}

async fn run_install(cmd: ProcessCommand) -> Result<(), SysdepsError> {
  info!(cmd = %cmd, "installing native packages");
  let output = cmd.output().await?;
  if !output.success() {
    return Err(SysdepsError::InstallFailed {
      cmd: cmd.to_string(),
      code: output.code_or_signal(),
      output: output.combined(),
    });
  }
  debug!(stdout = %output.stdout, "install finished");
  Ok(())
}

async fn run_remove(cmd: ProcessCommand) -> Result<(), SysdepsError> {
  info!(cmd = %cmd, "removing native packages");
  let output = cmd.output().await?;
  if !output.success() {
    return Err(SysdepsError::RemoveFailed {
      cmd: cmd.to_string(),
      code: output.code_or_signal(),
      output: output.combined(),
    });
  }
  debug!(stdout = %output.stdout, "remove finished");
  Ok(())
}

fn query_failed(cmd: &ProcessCommand, output: &ProcessOutput) -> SysdepsError {
  SysdepsError::QueryFailed {
    cmd: cmd.to_string(),
    code: output.code_or_signal(),
    output: output.combined(),
  }
}

/// Parse `apt list --installed` output.
///
/// Lines look like `name/suite version arch [flags]`; the name is everything
/// before the first `/`. Lines without `/` (the `Listing...` header, warnings)
/// are skipped.
pub fn parse_apt_installed(output: &str) -> BTreeSet<String> {
  output
    .lines()
    .filter_map(|line| line.split_once('/'))
    .map(|(name, _)| name.trim())
    .filter(|name| !name.is_empty())
    .map(str::to_string)
    .collect()
}

/// Parse one package name per line, as printed by `rpm -qa --queryformat`.
pub fn parse_rpm_names(output: &str) -> BTreeSet<String> {
  output
    .lines()
    .map(str::trim)
    .filter(|name| !name.is_empty())
    .map(str::to_string)
    .collect()
}
