//! `multiprojects_issue` (mpi) - associate one issue with several projects.
//!
//! Journals project set changes, notifies members of every associated
//! project and authorizes users through any of them.

use multiprojects_issue::run;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
