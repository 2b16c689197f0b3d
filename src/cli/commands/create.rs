//! Create command implementation.

use anyhow::{Context, Result};
use multiprojects_lib::NewIssue;
use multiprojects_lib::model::{Priority, ProjectId, Status};
use multiprojects_lib::ports::PermissionOracle;

use super::{Session, parse_assignee, parse_user, print_json};
use crate::cli::CreateArgs;
use crate::config::CliOverrides;
use crate::format::{UpdateReport, format_issue_line, format_recipients};

/// Permission needed on the primary project to create an issue there.
const ADD_ISSUES: &str = "add_issues";

/// Execute the create command.
///
/// # Errors
///
/// Returns an error if arguments are invalid, the actor may not add issues
/// to the primary project, or the issue cannot be stored.
pub fn execute(overrides: &CliOverrides, args: &CreateArgs, json: bool) -> Result<()> {
    let session = Session::open(overrides)?;
    let actor = parse_user(&args.actor)?;
    let project: ProjectId = args
        .project
        .parse()
        .with_context(|| format!("invalid project id {:?}", args.project))?;

    if !session.directory.has_permission(actor, project, ADD_ISSUES)? {
        anyhow::bail!("user {actor} is not allowed to add issues to project {project}");
    }

    let mut new = NewIssue::new(args.subject.clone(), project).with_projects(&args.projects);
    if let Some(status) = &args.status {
        new.status = status.parse::<Status>()?;
    }
    if let Some(priority) = &args.priority {
        new.priority = priority.parse::<Priority>()?;
    }
    if let Some(assignee) = &args.assignee {
        new.assigned_to = parse_assignee(assignee)?;
    }
    new.answers_on_secondary_projects = !args.primary_answers_only;
    for field in &args.fields {
        let (id, value) = parse_field(field)?;
        new.custom_field_values.insert(id, value);
    }

    let outcome = session.manager.create_issue(&new, actor)?;

    let report = UpdateReport::from(outcome);
    if json {
        return print_json(&report);
    }
    println!("Created {}", format_issue_line(&report.issue));
    if let Some(recipients) = &report.recipients {
        println!("Notified:\n{}", format_recipients(recipients));
    }
    for warning in &report.warnings {
        eprintln!("Warning: {warning}");
    }
    Ok(())
}

fn parse_field(raw: &str) -> Result<(u32, String)> {
    let (id, value) = raw
        .split_once('=')
        .with_context(|| format!("custom field must be ID=VALUE, got {raw:?}"))?;
    let id = id
        .trim()
        .parse::<u32>()
        .with_context(|| format!("invalid custom field id {id:?}"))?;
    Ok((id, value.to_string()))
}
