//! Quality gates: style, lint, and type-check.
//!
//! All gates always run. The combined result is a bitmask, one bit per
//! failed gate, which the `test` command uses as its exit code.

use std::fmt;

use tracing::{debug, info};

use crate::exec::ProcessOutput;
use crate::project::{Project, ProjectError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
  Style,
  Lint,
  TypeCheck,
}

impl Gate {
  pub const ALL: [Gate; 3] = [Gate::Style, Gate::Lint, Gate::TypeCheck];

  /// Bit set in the exit code when this gate fails.
  pub fn bit(&self) -> i32 {
    match self {
      Gate::Style => 1,
      Gate::Lint => 2,
      Gate::TypeCheck => 4,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Gate::Style => "style check",
      Gate::Lint => "pylint",
      Gate::TypeCheck => "mypy",
    }
  }

  /// Command line for this gate, run inside the project environment.
  pub fn argv(&self, project: &Project, module: &str) -> Vec<String> {
    match self {
      Gate::Style => ["black", "--check", "--target-version", "py36", "."]
        .iter()
        .map(|s| s.to_string())
        .collect(),
      Gate::Lint => {
        let mut argv = vec!["pylint".to_string()];
        if let Some(rc) = project.data().pylintrc_path() {
          argv.push(format!("--rcfile={}", rc.display()));
        }
        argv.push(module.to_string());
        argv
      }
      Gate::TypeCheck => [
        "mypy",
        "--no-incremental",
        "--ignore-missing-imports",
        "--warn-unreachable",
        "--check-untyped-defs",
        module,
      ]
      .iter()
      .map(|s| s.to_string())
      .collect(),
    }
  }
}

impl fmt::Display for Gate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// Outcome of one gate.
#[derive(Debug, Clone)]
pub struct GateResult {
  pub gate: Gate,
  pub output: ProcessOutput,
}

impl GateResult {
  pub fn passed(&self) -> bool {
    self.output.success()
  }
}

#[derive(Debug, Clone, Default)]
pub struct CheckReport {
  pub results: Vec<GateResult>,
}

impl CheckReport {
  /// Bitwise OR of the failed gates' bits; 0 when everything passed.
  pub fn code(&self) -> i32 {
    self
      .results
      .iter()
      .filter(|r| !r.passed())
      .fold(0, |code, r| code | r.gate.bit())
  }

  pub fn passed(&self) -> bool {
    self.code() == 0
  }

  pub fn failures(&self) -> impl Iterator<Item = &GateResult> {
    self.results.iter().filter(|r| !r.passed())
  }
}

/// Run every gate against the project's module.
pub async fn run_checks(project: &Project) -> Result<CheckReport, ProjectError> {
  let module = project.metadata()?.name;
  info!(module = %module, "running quality gates");

  let mut report = CheckReport::default();
  for gate in Gate::ALL {
    let output = project.run(gate.argv(project, &module).as_slice()).await?;
    debug!(gate = %gate, code = ?output.code, "gate finished");
    report.results.push(GateResult { gate, output });
  }
  Ok(report)
}
