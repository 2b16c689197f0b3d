//! Request types for issue mutations.

use std::collections::BTreeMap;

use crate::model::{FieldChange, Issue, Priority, ProjectId, Status, UserId};

/// Fields to update on an issue.
///
/// `project_ids` is the raw selection as submitted, blank placeholders
/// included; `None` leaves the associated set untouched.
#[derive(Debug, Clone, Default)]
pub struct IssueUpdate {
    pub subject: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<Option<UserId>>,
    pub answers_on_secondary_projects: Option<bool>,
    pub project_ids: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl IssueUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.subject.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.assigned_to.is_none()
            && self.answers_on_secondary_projects.is_none()
            && self.project_ids.is_none()
            && self.notes.is_none()
    }

    /// Whether the update only adds notes.
    #[must_use]
    pub fn is_notes_only(&self) -> bool {
        self.notes.is_some()
            && Self {
                notes: None,
                ..self.clone()
            }
            .is_empty()
    }

    /// Apply ordinary fields to `issue`, returning the changes that
    /// actually altered a value.
    pub fn apply_fields(&self, issue: &mut Issue) -> Vec<FieldChange> {
        let mut changes = Vec::new();

        if let Some(subject) = &self.subject {
            if *subject != issue.subject {
                changes.push(FieldChange::new(
                    "subject",
                    Some(issue.subject.clone()),
                    Some(subject.clone()),
                ));
                issue.subject.clone_from(subject);
            }
        }
        if let Some(status) = &self.status {
            if *status != issue.status {
                changes.push(FieldChange::new(
                    "status",
                    Some(issue.status.to_string()),
                    Some(status.to_string()),
                ));
                issue.status = status.clone();
            }
        }
        if let Some(priority) = self.priority {
            if priority != issue.priority {
                changes.push(FieldChange::new(
                    "priority",
                    Some(issue.priority.to_string()),
                    Some(priority.to_string()),
                ));
                issue.priority = priority;
            }
        }
        if let Some(assigned_to) = self.assigned_to {
            if assigned_to != issue.assigned_to {
                changes.push(FieldChange::new(
                    "assigned_to",
                    issue.assigned_to.map(|u| u.to_string()),
                    assigned_to.map(|u| u.to_string()),
                ));
                issue.assigned_to = assigned_to;
            }
        }
        if let Some(answers) = self.answers_on_secondary_projects {
            if answers != issue.answers_on_secondary_projects {
                changes.push(FieldChange::new(
                    "answers_on_secondary_projects",
                    Some(issue.answers_on_secondary_projects.to_string()),
                    Some(answers.to_string()),
                ));
                issue.answers_on_secondary_projects = answers;
            }
        }

        changes
    }
}

/// A new issue as submitted by the host's create handler.
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub subject: String,
    pub project_id: ProjectId,
    /// Raw associated project selection; the primary project is added
    /// regardless.
    pub project_ids: Vec<String>,
    pub status: Status,
    pub priority: Priority,
    pub assigned_to: Option<UserId>,
    pub answers_on_secondary_projects: bool,
    pub custom_field_values: BTreeMap<u32, String>,
}

impl NewIssue {
    #[must_use]
    pub fn new(subject: impl Into<String>, project_id: ProjectId) -> Self {
        Self {
            subject: subject.into(),
            project_id,
            project_ids: Vec::new(),
            status: Status::default(),
            priority: Priority::default(),
            assigned_to: None,
            answers_on_secondary_projects: true,
            custom_field_values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_projects<S: ToString>(mut self, ids: &[S]) -> Self {
        self.project_ids = ids.iter().map(ToString::to_string).collect();
        self
    }
}
