//! Error types for native dependency handling.

use thiserror::Error;

use crate::exec::ExecError;

use super::lock::LockError;

/// Errors raised while querying or mutating the host package manager.
///
/// Lookups never fail: an unknown Python package simply has no native
/// requirements. Everything here comes from the host side.
#[derive(Debug, Error)]
pub enum SysdepsError {
  /// Listing installed packages failed.
  #[error("`{cmd}` failed with exit code {code}:\n{output}")]
  QueryFailed { cmd: String, code: i32, output: String },

  /// The package manager refused or failed to install.
  #[error("installing packages failed: `{cmd}` exited with code {code}:\n{output}")]
  InstallFailed { cmd: String, code: i32, output: String },

  /// The package manager refused or failed to remove.
  #[error("removing packages failed: `{cmd}` exited with code {code}:\n{output}")]
  RemoveFailed { cmd: String, code: i32, output: String },

  /// Could not run the package manager, or it timed out.
  #[error(transparent)]
  Exec(#[from] ExecError),

  /// Another invocation holds the host lock.
  #[error(transparent)]
  Lock(#[from] LockError),
}

impl SysdepsError {
  pub fn is_timeout(&self) -> bool {
    matches!(self, SysdepsError::Exec(ExecError::Timeout { .. }))
  }
}
