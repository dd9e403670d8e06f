//! Expose nixplug's pipeline for the CLI, the xtask and integration tests.
pub mod categorize;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod runner;
