//! Version command implementation.

use serde::Serialize;

#[derive(Serialize)]
struct VersionOutput<'a> {
    version: &'a str,
    build: &'a str,
}

/// Execute the version command.
pub fn execute(json: bool) {
    let version = env!("CARGO_PKG_VERSION");
    let build = if cfg!(debug_assertions) {
        "dev"
    } else {
        "release"
    };

    if json {
        if let Ok(text) = serde_json::to_string(&VersionOutput { version, build }) {
            println!("{text}");
        }
    } else {
        println!("mpi version {version} ({build})");
    }
}
