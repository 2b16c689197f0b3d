//! Output formatting for `multiprojects_issue`.
//!
//! Supports both human-readable text output and machine-parseable JSON.
//!
//! # JSON Output Types
//!
//! - [`IssueDetails`] - Issue with associated projects and shared custom fields (show)
//! - [`UpdateReport`] - Committed mutation with journal, recipients and warnings (create/update)
//! - [`AccessReport`] - Result of a permission check (can)

mod output;
mod text;

pub use output::{AccessReport, CustomFieldValue, IssueDetails, ProjectSummary, UpdateReport};
pub use text::{
    format_detail, format_issue_line, format_journal_entry, format_project_list,
    format_recipients, format_status_icon,
};
