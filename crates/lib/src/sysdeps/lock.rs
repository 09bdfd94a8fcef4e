//! Host-wide lock around package manager mutations.
//!
//! Two cosy runs installing and cleaning up on the same host would each
//! remove packages the other one just installed. The first run to take the
//! lock wins; the second fails immediately with the holder's details. The
//! lock file lives in a directory shared by all users, so a `sudo cosy` run
//! and a plain one contend for the same lock.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::platform::paths::lock_dir;

const LOCK_FILENAME: &str = "sysdeps.lock";

#[derive(Debug, Serialize, Deserialize)]
pub struct LockMetadata {
  pub version: u32,
  pub pid: u32,
  pub started_at_unix: u64,
  pub command: String,
}

#[derive(Debug, Error)]
pub enum LockError {
  #[error(
    "another cosy run is changing system packages: {command} (PID {pid}, started at unix time {started_at_unix})\n\
             If you're sure no cosy process is running, remove the lock file:\n  {lock_path}"
  )]
  Contention {
    command: String,
    pid: u32,
    started_at_unix: u64,
    lock_path: PathBuf,
  },

  #[error(
    "another cosy run is changing system packages (could not read lock metadata)\n\
             If you're sure no cosy process is running, remove the lock file:\n  {lock_path}"
  )]
  ContentionUnknown { lock_path: PathBuf },

  #[error("failed to create lock directory: {0}")]
  CreateDir(#[source] io::Error),

  #[error("failed to open lock file: {0}")]
  OpenFile(#[source] io::Error),

  #[error("failed to write lock metadata: {0}")]
  WriteMetadata(#[source] io::Error),

  #[error("failed to acquire lock: {0}")]
  LockFailed(#[source] io::Error),
}

/// Exclusive advisory lock, released when dropped.
#[derive(Debug)]
pub struct HostLock {
  file: File,
  lock_path: PathBuf,
}

impl HostLock {
  /// Take the lock in the default lock directory.
  pub fn acquire(command: &str) -> Result<Self, LockError> {
    Self::acquire_in(&lock_dir(), command)
  }

  pub fn acquire_in(dir: &Path, command: &str) -> Result<Self, LockError> {
    let lock_path = dir.join(LOCK_FILENAME);

    if !dir.exists() {
      std::fs::create_dir_all(dir).map_err(LockError::CreateDir)?;
      share(dir, 0o1777);
    }

    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);
    #[cfg(unix)]
    {
      use std::os::unix::fs::OpenOptionsExt;
      // the directory is world-writable; never follow a planted symlink
      options.custom_flags(rustix::fs::OFlags::NOFOLLOW.bits() as i32);
    }
    let file = options.open(&lock_path).map_err(LockError::OpenFile)?;
    share(&lock_path, 0o666);

    if let Err(err) = try_lock(&file) {
      if err.kind() == io::ErrorKind::WouldBlock {
        return Err(Self::read_contention_error(&lock_path));
      }
      return Err(LockError::LockFailed(err));
    }

    Self::write_metadata(&file, command)?;
    debug!(path = %lock_path.display(), "acquired host lock");

    Ok(HostLock { file, lock_path })
  }

  /// Reads the lock metadata from the held file handle.
  pub fn read_metadata(&self) -> io::Result<LockMetadata> {
    use std::io::{Seek, SeekFrom};

    let mut file = &self.file;
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).map_err(io::Error::other)
  }

  fn write_metadata(file: &File, command: &str) -> Result<(), LockError> {
    let metadata = LockMetadata {
      version: 1,
      pid: std::process::id(),
      started_at_unix: SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs(),
      command: command.to_string(),
    };

    file.set_len(0).map_err(LockError::WriteMetadata)?;
    let mut writer = io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &metadata).map_err(|e| LockError::WriteMetadata(io::Error::other(e)))?;
    writer.flush().map_err(LockError::WriteMetadata)?;

    Ok(())
  }

  fn read_contention_error(lock_path: &Path) -> LockError {
    if let Ok(mut file) = File::open(lock_path) {
      let mut contents = String::new();
      if file.read_to_string(&mut contents).is_ok()
        && let Ok(metadata) = serde_json::from_str::<LockMetadata>(&contents)
      {
        return LockError::Contention {
          command: metadata.command,
          pid: metadata.pid,
          started_at_unix: metadata.started_at_unix,
          lock_path: lock_path.to_path_buf(),
        };
      }
    }

    LockError::ContentionUnknown {
      lock_path: lock_path.to_path_buf(),
    }
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }
}

/// Open up `path` so runs as other users can take the lock too. Only the
/// owner may change the mode; for everyone else this is a no-op.
#[cfg(unix)]
fn share(path: &Path, mode: u32) {
  use std::os::unix::fs::PermissionsExt;

  if let Err(err) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)) {
    debug!(path = %path.display(), error = %err, "lock path left with its current mode");
  }
}

#[cfg(not(unix))]
fn share(_path: &Path, _mode: u32) {}

#[cfg(unix)]
fn try_lock(file: &File) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  flock(file.as_fd(), FlockOperation::NonBlockingLockExclusive).map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> io::Result<()> {
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use tempfile::TempDir;

  #[test]
  fn acquire_creates_lock_file() {
    let temp = TempDir::new().unwrap();
    let lock = HostLock::acquire_in(&temp.path().join("nested"), "test").unwrap();
    assert!(lock.lock_path().exists());
  }

  #[test]
  fn lock_metadata_written() {
    let temp = TempDir::new().unwrap();
    let lock = HostLock::acquire_in(temp.path(), "cosy install --with-sysdeps").unwrap();

    let metadata = lock.read_metadata().unwrap();

    assert_eq!(metadata.version, 1);
    assert_eq!(metadata.command, "cosy install --with-sysdeps");
    assert_eq!(metadata.pid, std::process::id());
  }

  #[test]
  #[cfg(unix)]
  fn second_acquire_reports_holder() {
    let temp = TempDir::new().unwrap();
    let _held = HostLock::acquire_in(temp.path(), "first").unwrap();

    let err = HostLock::acquire_in(temp.path(), "second").unwrap_err();
    match err {
      LockError::Contention { command, pid, .. } => {
        assert_eq!(command, "first");
        assert_eq!(pid, std::process::id());
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  #[cfg(unix)]
  fn fresh_lock_is_usable_by_every_user() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("shared");
    let lock = HostLock::acquire_in(&dir, "test").unwrap();

    let dir_mode = std::fs::metadata(&dir).unwrap().permissions().mode();
    let file_mode = std::fs::metadata(lock.lock_path()).unwrap().permissions().mode();
    assert_eq!(dir_mode & 0o7777, 0o1777);
    assert_eq!(file_mode & 0o777, 0o666);
  }

  #[test]
  #[cfg(unix)]
  fn symlinked_lock_file_is_refused() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("precious");
    std::fs::write(&target, "keep me").unwrap();
    std::os::unix::fs::symlink(&target, temp.path().join(LOCK_FILENAME)).unwrap();

    let err = HostLock::acquire_in(temp.path(), "test").unwrap_err();
    assert!(matches!(err, LockError::OpenFile(_)));
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "keep me");
  }

  #[test]
  fn lock_released_on_drop() {
    let temp = TempDir::new().unwrap();
    {
      let _lock = HostLock::acquire_in(temp.path(), "test").unwrap();
    }

    let lock2 = HostLock::acquire_in(temp.path(), "test2").unwrap();
    assert!(lock2.lock_path().exists());
  }

  #[test]
  #[serial]
  fn acquire_honors_lock_dir_env() {
    let temp = TempDir::new().unwrap();
    temp_env::with_var(crate::consts::ENV_LOCK_DIR, Some(temp.path()), || {
      let lock = HostLock::acquire("test").unwrap();
      assert_eq!(lock.lock_path(), temp.path().join(LOCK_FILENAME));
    });
  }
}
