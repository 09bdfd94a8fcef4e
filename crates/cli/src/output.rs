//! Terminal output for cosy commands.
//!
//! Status lines go to stdout, problems to stderr. Colors are applied only
//! when the target stream supports them.

use std::fmt::Display;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ADD: &str = "+";
  pub const REMOVE: &str = "-";
}

/// Elapsed time for a status line: milliseconds under a second, whole
/// seconds from a minute on.
pub fn format_duration(duration: Duration) -> String {
  let rounded = if duration >= Duration::from_secs(60) {
    Duration::from_secs(duration.as_secs())
  } else if duration >= Duration::from_secs(1) {
    Duration::from_millis(duration.as_millis() as u64 / 10 * 10)
  } else {
    Duration::from_millis(duration.as_millis() as u64)
  };
  humantime::format_duration(rounded).to_string()
}

pub fn print_success(message: impl Display) {
  println!("{} {message}", symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()));
}

pub fn print_error(message: impl Display) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: impl Display) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: impl Display) {
  println!("{} {message}", symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()));
}

/// `  label: value` line of `cosy info`.
pub fn print_stat(label: &str, value: impl Display) {
  println!("  {}: {value}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()));
}

/// One line per package, prefixed with `symbol`.
pub fn print_packages<'a>(symbol: &str, packages: impl IntoIterator<Item = &'a String>) {
  for pkg in packages {
    println!("  {} {pkg}", symbol.if_supports_color(Stream::Stdout, |s| s.dimmed()));
  }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{json}");
  Ok(())
}
