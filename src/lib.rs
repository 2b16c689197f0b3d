//! `multiprojects_issue` - multi-project issue association CLI
//!
//! This crate provides the `mpi` command-line tool on top of
//! `multiprojects-lib`, standing a JSON snapshot and a JSONL journal up as
//! the host tracker.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Workspace settings (YAML, environment, flags)
//! - [`format`] - Output formatting (text, JSON)
//! - [`logging`] - Tracing subscriber bootstrap

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod format;
pub mod logging;

/// Run the CLI application.
///
/// This is the main entry point called from `main()`.
///
/// # Errors
///
/// Returns an error if command execution fails.
pub fn run() -> anyhow::Result<()> {
    cli::run()
}
