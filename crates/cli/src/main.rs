mod cmd;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

/// cosy - Python project lifecycle manager
#[derive(Parser)]
#[command(name = "cosy")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Install python dependencies via poetry/pipenv
  Install {
    /// Install needed system dependencies (with dnf/apt) and clean up build-only ones afterwards
    #[arg(long)]
    with_sysdeps: bool,
  },

  /// Inspect system dependencies
  Sysdeps {
    #[command(subcommand)]
    command: SysdepsCommands,
  },

  /// Run style, lint and type checks; the exit code is a bitmask of failed checks
  Test,

  /// Run tests, then build sdist and wheel
  Dist {
    /// Install needed system dependencies for the build
    #[arg(long)]
    with_sysdeps: bool,
  },

  /// Build and upload to pypi (requires `public = true` under [tool.cosy])
  Publish,

  /// Update managed project files (.gitignore)
  Update,

  /// Show detected platform, dependency index and project
  Info {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
  },
}

#[derive(Subcommand)]
enum SysdepsCommands {
  /// List all system dependencies required by the project's python packages
  List {
    /// Only packages needed at runtime
    #[arg(long)]
    run_only: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let code = match cli.command {
    Commands::Install { with_sysdeps } => cmd::cmd_install(with_sysdeps)?,
    Commands::Sysdeps {
      command: SysdepsCommands::List { run_only, format },
    } => {
      cmd::cmd_sysdeps_list(run_only, format)?;
      0
    }
    Commands::Test => cmd::cmd_test()?,
    Commands::Dist { with_sysdeps } => cmd::cmd_dist(with_sysdeps)?,
    Commands::Publish => cmd::cmd_publish()?,
    Commands::Update => {
      cmd::cmd_update()?;
      0
    }
    Commands::Info { format } => {
      cmd::cmd_info(format)?;
      0
    }
  };

  if code != 0 {
    std::process::exit(code);
  }
  Ok(())
}
