//! Shared utilities.
//!
//! Test helpers shared by the unit test modules.

#[cfg(test)]
pub mod testutil;
