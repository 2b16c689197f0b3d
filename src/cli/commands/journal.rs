//! Journal command implementation.

use anyhow::Result;

use super::{Session, parse_issue, print_json};
use crate::config::CliOverrides;
use crate::format::format_journal_entry;

/// Execute the journal command.
///
/// # Errors
///
/// Returns an error if the issue does not exist or the journal cannot be read.
pub fn execute(overrides: &CliOverrides, issue: &str, json: bool) -> Result<()> {
    let session = Session::open(overrides)?;
    let issue_id = parse_issue(issue)?;
    // Surface IssueNotFound rather than an empty history.
    session.manager.issue(issue_id)?;
    let entries = session.manager.journal(issue_id)?;

    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No journal entries for issue {issue_id}");
    }
    for entry in &entries {
        println!("{}", format_journal_entry(entry));
    }
    Ok(())
}
