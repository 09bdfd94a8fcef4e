use std::path::PathBuf;

use crate::consts::{APP_NAME, CONFIG_FILENAME, ENV_CONFIG, ENV_LOCK_DIR, SHARED_LOCK_DIR};

/// Returns the user's home directory
pub fn home_dir() -> PathBuf {
  std::env::var("HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| PathBuf::from("/"))
}

/// Returns the directory for configuration files for the application
pub fn config_dir() -> PathBuf {
  let config_home = std::env::var("XDG_CONFIG_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".config"));
  config_home.join(APP_NAME)
}

/// Returns the directory for cache files for the application
pub fn cache_dir() -> PathBuf {
  let cache_home = std::env::var("XDG_CACHE_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".cache"));
  cache_home.join(APP_NAME)
}

/// Path of the user configuration file, honoring `COSY_CONFIG`.
pub fn config_file() -> PathBuf {
  if let Ok(path) = std::env::var(ENV_CONFIG) {
    return PathBuf::from(path);
  }
  config_dir().join(CONFIG_FILENAME)
}

/// Directory holding the host lock file, honoring `COSY_LOCK_DIR`.
///
/// Not per-user: a run under `sudo cosy` has to see the lock of a plain run.
pub fn lock_dir() -> PathBuf {
  if let Ok(path) = std::env::var(ENV_LOCK_DIR) {
    return PathBuf::from(path);
  }
  PathBuf::from(SHARED_LOCK_DIR)
}
