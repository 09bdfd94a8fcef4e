//! Implementation of the `cosy info` command.

use anyhow::{Context, Result};
use serde_json::json;

use cosy_lib::config::Config;
use cosy_lib::platform::paths;
use cosy_lib::project::Project;

use crate::output::{OutputFormat, print_json, print_stat, print_warning};

/// Show what cosy would work with on this host and in this directory.
pub fn cmd_info(format: OutputFormat) -> Result<()> {
  let config = Config::load().context("Failed to load config")?;
  let index = config.load_index().context("Failed to load dependency index")?;
  let timeout = config.timeout()?;

  // an unsupported host is still worth reporting on
  let distro = config.select_distro();
  let project = std::env::current_dir().ok().and_then(|cwd| Project::find(&cwd).ok());

  if format.is_json() {
    let distro_json = match &distro {
      Ok(d) => json!({ "name": d, "bootstrap": d.bootstrap_packages() }),
      Err(e) => json!({ "error": e.to_string() }),
    };
    return print_json(&json!({
      "version": env!("CARGO_PKG_VERSION"),
      "config": paths::config_file(),
      "distro": distro_json,
      "index": { "source": index.source().to_string(), "packages": index.len() },
      "timeout": humantime::format_duration(timeout).to_string(),
      "sudo": config.sudo,
      "project": project.as_ref().map(|p| json!({ "kind": p.kind().as_str(), "path": p.path() })),
    }));
  }

  println!("cosy v{}", env!("CARGO_PKG_VERSION"));
  println!();
  print_stat("Config", paths::config_file().display());
  match &distro {
    Ok(d) => {
      print_stat("Distro", d.as_str());
      print_stat("Bootstrap", &d.bootstrap_packages().join(" "));
    }
    Err(e) => print_warning(e),
  }
  print_stat("Index", format!("{} ({} packages)", index.source(), index.len()));
  print_stat("Timeout", humantime::format_duration(timeout));
  print_stat("Sudo", config.sudo);
  match &project {
    Some(p) => print_stat("Project", format!("{} ({})", p.path().display(), p.kind())),
    None => print_stat("Project", "none"),
  }
  Ok(())
}
