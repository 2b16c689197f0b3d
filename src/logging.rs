//! Logging bootstrap for the `mpi` binary.
//!
//! Diagnostics go to stderr so stdout stays clean for command output.
//! `RUST_LOG` wins over the `-v`/`-q` flags when set.

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Map `-v` count and `-q` to a default filter directive.
#[must_use]
pub fn level_for(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber once; later calls are no-ops.
///
/// # Errors
///
/// Returns an error if `RUST_LOG` holds an invalid filter or another global
/// subscriber is already installed.
pub fn init_logging(verbose: u8, quiet: bool, json: bool) -> Result<(), String> {
    INITIALIZED
        .get_or_try_init(|| {
            let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
                Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
                    .map_err(|e| format!("invalid RUST_LOG: {e}"))?,
                _ => EnvFilter::new(level_for(verbose, quiet)),
            };

            let builder = fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false);

            let result = if json {
                builder.json().try_init()
            } else {
                builder.try_init()
            };
            result.map_err(|e| format!("failed to install subscriber: {e}"))
        })
        .map(|_| ())
}
