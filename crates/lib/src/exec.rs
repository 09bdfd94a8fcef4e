//! External process execution.
//!
//! Every tool cosy drives (package managers, poetry/pipenv, linters, twine)
//! goes through [`ProcessCommand`]. Output is captured as text, and every
//! invocation is bounded by a timeout; an expired child is stopped along
//! with its process group.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

#[cfg(unix)]
use rustix::process::{Pid, Signal, kill_process_group};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::consts::DEFAULT_TOOL_TIMEOUT;

/// How long a timed-out process group gets to exit after SIGTERM.
const TERMINATE_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ExecError {
  /// The program could not be started at all.
  #[error("failed to run {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The program did not exit within the allowed time and was killed.
  #[error("command timed out after {timeout:?}: {cmd}")]
  Timeout { cmd: String, timeout: Duration },
}

/// Exit status and captured text of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
  /// Exit code, `None` when terminated by a signal.
  pub code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl ProcessOutput {
  pub fn success(&self) -> bool {
    self.code == Some(0)
  }

  /// stdout followed by stderr.
  pub fn combined(&self) -> String {
    match (self.stdout.is_empty(), self.stderr.is_empty()) {
      (_, true) => self.stdout.clone(),
      (true, false) => self.stderr.clone(),
      (false, false) => {
        let mut out = self.stdout.clone();
        if !out.ends_with('\n') {
          out.push('\n');
        }
        out.push_str(&self.stderr);
        out
      }
    }
  }

  /// Exit code for reporting; signals map to `-1`.
  pub fn code_or_signal(&self) -> i32 {
    self.code.unwrap_or(-1)
  }
}

/// A program invocation with arguments, environment, and a deadline.
#[derive(Debug, Clone)]
pub struct ProcessCommand {
  program: String,
  args: Vec<String>,
  env: Vec<(String, String)>,
  cwd: Option<PathBuf>,
  timeout: Duration,
}

impl ProcessCommand {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      env: Vec::new(),
      cwd: None,
      timeout: DEFAULT_TOOL_TIMEOUT,
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.push((key.into(), value.into()));
    self
  }

  pub fn current_dir(mut self, dir: &Path) -> Self {
    self.cwd = Some(dir.to_path_buf());
    self
  }

  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Prepend a wrapper program, e.g. `sudo -n`.
  pub fn wrapped<I, S>(self, wrapper: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut argv: Vec<String> = wrapper.into_iter().map(Into::into).collect();
    if argv.is_empty() {
      return self;
    }
    let program = argv.remove(0);
    argv.push(self.program);
    argv.extend(self.args);
    Self {
      program,
      args: argv,
      ..self
    }
  }

  pub fn program(&self) -> &str {
    &self.program
  }

  pub fn get_args(&self) -> &[String] {
    &self.args
  }

  fn build(&self) -> Command {
    let mut command = Command::new(&self.program);
    command.args(&self.args).kill_on_drop(true);
    for (key, value) in &self.env {
      command.env(key, value);
    }
    if let Some(cwd) = &self.cwd {
      command.current_dir(cwd);
    }
    command
  }

  fn spawn_error(&self, source: std::io::Error) -> ExecError {
    ExecError::Spawn {
      program: self.program.clone(),
      source,
    }
  }

  fn timeout_error(&self) -> ExecError {
    ExecError::Timeout {
      cmd: self.to_string(),
      timeout: self.timeout,
    }
  }

  /// Run to completion with stdout and stderr captured.
  ///
  /// The child leads its own process group. On timeout the whole group is
  /// stopped, so a program running under a wrapper such as `sudo` goes too.
  /// A non-zero exit is not an error here; callers decide what it means.
  pub async fn output(&self) -> Result<ProcessOutput, ExecError> {
    debug!(cmd = %self, "spawning process");

    let mut command = self.build();
    command.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
    #[cfg(unix)]
    command.process_group(0);
    let mut child = command.spawn().map_err(|e| self.spawn_error(e))?;
    // taken now: once reaped, `Child::id` is gone but the group may live on
    let pid = child.id();

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let finished = tokio::time::timeout(self.timeout, async {
      tokio::join!(child.wait(), read_pipe(stdout), read_pipe(stderr))
    })
    .await;

    let (status, stdout, stderr) = match finished {
      Ok(parts) => parts,
      Err(_) => {
        terminate(&mut child, pid).await;
        return Err(self.timeout_error());
      }
    };
    let status = status.map_err(|e| self.spawn_error(e))?;

    let result = ProcessOutput {
      code: status.code(),
      stdout: String::from_utf8_lossy(&stdout.map_err(|e| self.spawn_error(e))?).into_owned(),
      stderr: String::from_utf8_lossy(&stderr.map_err(|e| self.spawn_error(e))?).into_owned(),
    };

    if !result.success() {
      debug!(cmd = %self, code = ?result.code, stderr = %result.stderr, "process failed");
    }

    Ok(result)
  }

  /// Run to completion with the terminal attached; nothing is captured.
  pub async fn status(&self) -> Result<ProcessOutput, ExecError> {
    debug!(cmd = %self, "spawning attached process");

    let mut command = self.build();
    let status = tokio::time::timeout(self.timeout, command.status())
      .await
      .map_err(|_| self.timeout_error())?
      .map_err(|e| self.spawn_error(e))?;

    Ok(ProcessOutput {
      code: status.code(),
      ..Default::default()
    })
  }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
  let mut buf = Vec::new();
  if let Some(mut pipe) = pipe {
    pipe.read_to_end(&mut buf).await?;
  }
  Ok(buf)
}

/// Stop a timed-out child and everything in its process group.
///
/// SIGTERM first: sudo relays it to the command it runs, while SIGKILL would
/// only take down sudo itself. Whatever is left after the grace period is
/// killed.
async fn terminate(child: &mut Child, pid: Option<u32>) {
  #[cfg(unix)]
  {
    if let Some(pid) = pid.and_then(|id| Pid::from_raw(id as i32)) {
      debug!(pid = pid.as_raw_pid(), "terminating process group");
      let _ = kill_process_group(pid, Signal::TERM);
      let exited = tokio::time::timeout(TERMINATE_GRACE, child.wait()).await.is_ok();
      if !exited {
        warn!(pid = pid.as_raw_pid(), "process group ignored SIGTERM, killing it");
      }
      // stragglers that outlived the group leader
      let _ = kill_process_group(pid, Signal::KILL);
      if exited {
        return;
      }
    }
  }

  let _ = child.start_kill();
  let _ = child.wait().await;
}

impl fmt::Display for ProcessCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      write!(f, " {}", arg)?;
    }
    Ok(())
  }
}
