//! Show command implementation.

use anyhow::Result;

use super::{Session, parse_issue, print_json};
use crate::config::CliOverrides;
use crate::format::{IssueDetails, format_issue_line, format_project_list};

/// Execute the show command.
///
/// # Errors
///
/// Returns an error if the issue does not exist or its journal cannot be read.
pub fn execute(overrides: &CliOverrides, issue: &str, json: bool) -> Result<()> {
    let session = Session::open(overrides)?;
    let issue_id = parse_issue(issue)?;
    let issue = session.manager.issue(issue_id)?;
    let journals = session.manager.journal(issue_id)?;
    let details = IssueDetails::new(
        issue,
        &session.directory,
        &session.workspace.settings,
        journals,
    );

    if json {
        return print_json(&details);
    }

    println!("{}", format_issue_line(&details.issue));
    if let Some(assignee) = details.issue.assigned_to {
        println!("Assignee: {assignee}");
    }
    println!("Author: {}", details.issue.author);
    if !details.issue.answers_on_secondary_projects {
        println!("Secondary projects: view only");
    }
    println!("\nProjects:\n{}", format_project_list(&details.projects));
    if !details.cross_project_fields.is_empty() {
        println!("\nShared fields:");
        for field in &details.cross_project_fields {
            println!("  {}: {}", field.field_id, field.value);
        }
    }
    println!("\nJournal entries: {}", details.journals.len());
    Ok(())
}
