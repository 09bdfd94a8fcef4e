//! Native (system) dependency handling.
//!
//! Python packages with C extensions need native libraries and headers on
//! the host before they can be built. This module maps Python package names
//! to native packages, installs them through the host package manager, and
//! removes the build-only ones once the work is done.
//!
//! # Submodules
//!
//! - [`lock`] - Host-wide lock so two runs never race on the package database
//! - [`manager`] - The [`PackageManager`] trait and its dnf/apt implementations
//! - [`orchestrate`] - Install, run, clean up
//! - [`resolve`] - Python package → native package closure
//! - [`state`] - Per-run bookkeeping of initial/build/run packages
//! - [`system`] - A manager bound to the state of one run

pub mod lock;
pub mod manager;
pub mod orchestrate;
pub mod resolve;
pub mod state;
pub mod system;
mod types;

pub use lock::{HostLock, LockError};
pub use manager::{Apt, Dnf, HostManager, ManagerOptions, PackageManager, parse_apt_installed, parse_rpm_names};
pub use orchestrate::{SysdepsOutcome, install_with_sysdeps};
pub use resolve::{Resolver, normalize};
pub use state::SystemState;
pub use system::System;
pub use types::*;
