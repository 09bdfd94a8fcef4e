//! cosy-lib: Core types and logic for cosy
//!
//! This crate provides everything the `cosy` binary does apart from argument
//! parsing and terminal output:
//! - `index`: Python package → native package mapping per distribution
//! - `sysdeps`: host package managers, dependency resolution, install/cleanup
//! - `project`: Poetry / Pipenv project detection and tool dispatch
//! - `checks`, `dist`, `skel`: quality gates, distributables, managed files

pub mod checks;
pub mod config;
pub mod consts;
pub mod dist;
pub mod exec;
pub mod index;
pub mod platform;
pub mod project;
pub mod skel;
pub mod sysdeps;
pub mod util;
