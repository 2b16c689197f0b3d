//! Text formatting functions for `multiprojects_issue`.
//!
//! Plain (non-ANSI) output:
//! - Status icons
//! - Issue line with associated projects
//! - Journal entries and their details
//! - Recipient lists

use multiprojects_lib::model::{Issue, JournalDetail, JournalEntry, NotificationSet, Status};

use super::output::ProjectSummary;

/// Status icon characters.
pub mod icons {
    /// New issue (hollow circle).
    pub const NEW: &str = "○";
    /// Being worked on (half-filled).
    pub const IN_PROGRESS: &str = "◐";
    /// Waiting on someone (filled circle).
    pub const FEEDBACK: &str = "●";
    /// Resolved, not yet closed.
    pub const RESOLVED: &str = "◉";
    /// Closed (checkmark).
    pub const CLOSED: &str = "✓";
    /// Rejected (X mark).
    pub const REJECTED: &str = "✗";
    /// Unknown status.
    pub const UNKNOWN: &str = "?";
}

/// Return the icon character for a status.
#[must_use]
pub const fn format_status_icon(status: &Status) -> &'static str {
    match status {
        Status::New => icons::NEW,
        Status::InProgress => icons::IN_PROGRESS,
        Status::Feedback => icons::FEEDBACK,
        Status::Resolved => icons::RESOLVED,
        Status::Closed => icons::CLOSED,
        Status::Rejected => icons::REJECTED,
        Status::Custom(_) => icons::UNKNOWN,
    }
}

/// Format a single-line issue summary.
///
/// Format: `{icon} #{id} [{priority}] {subject} (projects: 1*, 5)`
#[must_use]
pub fn format_issue_line(issue: &Issue) -> String {
    let projects: Vec<String> = issue
        .project_ids
        .iter()
        .map(|id| {
            if *id == issue.project_id {
                format!("{id}*")
            } else {
                id.to_string()
            }
        })
        .collect();
    format!(
        "{} #{} [{}] {} (projects: {})",
        format_status_icon(&issue.status),
        issue.id,
        issue.priority,
        issue.subject,
        projects.join(", "),
    )
}

/// Format one journal detail.
#[must_use]
pub fn format_detail(detail: &JournalDetail) -> String {
    match detail {
        JournalDetail::Attribute {
            name,
            old_value,
            new_value,
        } => match (old_value, new_value) {
            (Some(old), Some(new)) => format!("{name} changed from {old} to {new}"),
            (None, Some(new)) => format!("{name} set to {new}"),
            (Some(old), None) => format!("{name} deleted ({old})"),
            (None, None) => format!("{name} changed"),
        },
        JournalDetail::AssociatedProject { action, project_id } => {
            format!("project {project_id} {action}")
        }
    }
}

/// Format a journal entry as a header line plus one indented line per detail.
#[must_use]
pub fn format_journal_entry(entry: &JournalEntry) -> String {
    let mut out = format!(
        "Journal #{} by user {} at {}",
        entry.id,
        entry.author,
        entry.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    for detail in &entry.details {
        out.push_str("\n  - ");
        out.push_str(&format_detail(detail));
    }
    if let Some(notes) = &entry.notes {
        out.push_str("\n  ");
        out.push_str(notes);
    }
    out
}

/// Format recipients as `user <mail>` lines.
#[must_use]
pub fn format_recipients(recipients: &NotificationSet) -> String {
    if recipients.is_empty() {
        return "No recipients".to_string();
    }
    recipients
        .iter()
        .map(|r| format!("{} <{}>", r.user_id, r.mail))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format associated projects, primary marked with `*`.
#[must_use]
pub fn format_project_list(projects: &[ProjectSummary]) -> String {
    projects
        .iter()
        .map(|p| {
            let marker = if p.primary { "*" } else { " " };
            format!("{marker} {} {}", p.id, p.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use multiprojects_lib::model::{IssueId, Priority, ProjectId, Recipient, UserId};

    fn make_test_issue() -> Issue {
        let mut issue = Issue::new(IssueId(1), "Cannot print recipes", ProjectId(1), UserId(2));
        issue.project_ids.insert(ProjectId(5));
        issue
    }

    #[test]
    fn test_status_icons() {
        assert_eq!(format_status_icon(&Status::New), "○");
        assert_eq!(format_status_icon(&Status::Closed), "✓");
        assert_eq!(format_status_icon(&Status::Custom("x".into())), "?");
    }

    #[test]
    fn test_format_issue_line_marks_primary() {
        let mut issue = make_test_issue();
        issue.priority = Priority::High;
        assert_eq!(
            format_issue_line(&issue),
            "○ #1 [high] Cannot print recipes (projects: 1*, 5)"
        );
    }

    #[test]
    fn test_format_details() {
        assert_eq!(
            format_detail(&JournalDetail::added(ProjectId(5))),
            "project 5 added"
        );
        let attr = JournalDetail::Attribute {
            name: "priority".into(),
            old_value: Some("normal".into()),
            new_value: Some("high".into()),
        };
        assert_eq!(format_detail(&attr), "priority changed from normal to high");
    }

    #[test]
    fn test_format_journal_entry() {
        let entry = JournalEntry {
            id: 7,
            issue_id: IssueId(1),
            author: UserId(2),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            notes: Some("linked to store".into()),
            details: vec![JournalDetail::removed(ProjectId(4))],
        };
        assert_eq!(
            format_journal_entry(&entry),
            "Journal #7 by user 2 at 2024-05-01 12:00:00\n  - project 4 removed\n  linked to store"
        );
    }

    #[test]
    fn test_format_recipients() {
        assert_eq!(format_recipients(&NotificationSet::default()), "No recipients");
        let set = NotificationSet::from_recipients([Recipient {
            user_id: UserId(2),
            mail: "jsmith@somenet.foo".into(),
        }]);
        assert_eq!(format_recipients(&set), "2 <jsmith@somenet.foo>");
    }
}
