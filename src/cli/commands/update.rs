//! Update command implementation.

use anyhow::Result;
use multiprojects_lib::IssueUpdate;
use multiprojects_lib::model::{Action, Priority, Status};

use super::{Session, parse_assignee, parse_issue, parse_user, print_json};
use crate::cli::UpdateArgs;
use crate::config::CliOverrides;
use crate::format::{UpdateReport, format_detail, format_issue_line, format_recipients};

/// Build the library update from command-line flags.
///
/// # Errors
///
/// Returns an error if a status, priority or assignee cannot be parsed.
pub fn build_update(args: &UpdateArgs) -> Result<IssueUpdate> {
    Ok(IssueUpdate {
        subject: args.subject.clone(),
        status: args
            .status
            .as_deref()
            .map(str::parse::<Status>)
            .transpose()?,
        priority: args
            .priority
            .as_deref()
            .map(str::parse::<Priority>)
            .transpose()?,
        assigned_to: args.assignee.as_deref().map(parse_assignee).transpose()?,
        answers_on_secondary_projects: args.answers_on_secondary_projects,
        project_ids: args.projects.clone(),
        notes: args.notes.clone(),
    })
}

/// Action the actor must be allowed to perform for `update`.
#[must_use]
pub fn required_action(update: &IssueUpdate) -> Action {
    if update.is_notes_only() {
        Action::AddNotes
    } else {
        Action::EditIssue
    }
}

/// Execute the update command.
///
/// # Errors
///
/// Returns an error if arguments are invalid, the actor is not allowed to
/// edit (or comment on) the issue, or the mutation is rejected.
pub fn execute(overrides: &CliOverrides, args: &UpdateArgs, json: bool) -> Result<()> {
    let session = Session::open(overrides)?;
    let issue_id = parse_issue(&args.issue)?;
    let actor = parse_user(&args.actor)?;
    let update = build_update(args)?;
    if update.is_empty() {
        anyhow::bail!("nothing to update");
    }

    let action = required_action(&update);
    if !session.manager.can_perform(actor, issue_id, action) {
        anyhow::bail!("user {actor} is not allowed to {action} issue {issue_id}");
    }

    let outcome = session.manager.update_issue(issue_id, &update, actor)?;

    let report = UpdateReport::from(outcome);
    if json {
        return print_json(&report);
    }
    println!("Updated {}", format_issue_line(&report.issue));
    match &report.journal {
        Some(entry) => {
            for detail in &entry.details {
                println!("  - {}", format_detail(detail));
            }
        }
        None => println!("No changes"),
    }
    if let Some(recipients) = &report.recipients {
        println!("Notified:\n{}", format_recipients(recipients));
    }
    for warning in &report.warnings {
        eprintln!("Warning: {warning}");
    }
    Ok(())
}
