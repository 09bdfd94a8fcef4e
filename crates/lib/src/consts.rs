//! Application-wide names and defaults.

use std::time::Duration;

pub const APP_NAME: &str = "cosy";

/// Overrides the configuration file location.
pub const ENV_CONFIG: &str = "COSY_CONFIG";
/// Overrides the dependency mapping data file.
pub const ENV_PACKAGES: &str = "COSY_PACKAGES";
/// Forces the distribution identity instead of reading `/etc/os-release`.
pub const ENV_DISTRO: &str = "COSY_DISTRO";
/// Overrides the package manager timeout (humantime syntax, e.g. `10m`).
pub const ENV_TIMEOUT: &str = "COSY_TIMEOUT";
/// Overrides the directory holding the host lock file.
pub const ENV_LOCK_DIR: &str = "COSY_LOCK_DIR";

pub const CONFIG_FILENAME: &str = "config.toml";

pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Default directory of the host lock. Users and root must all see the same
/// file, and `/tmp` is world-writable on every supported distribution.
pub const SHARED_LOCK_DIR: &str = "/tmp/cosy-lock";

/// Upper bound for a single package manager invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Upper bound for a single project tool invocation (black, pylint, builds).
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60 * 60);
