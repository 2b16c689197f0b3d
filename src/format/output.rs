use multiprojects_lib::model::{Action, Issue, JournalEntry, NotificationSet, ProjectId, UserId};
use multiprojects_lib::store::InMemoryDirectory;
use multiprojects_lib::{ProjectSetDiff, UpdateOutcome};
use serde::Serialize;

use crate::config::Settings;

/// Associated project with its display name.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
    pub primary: bool,
}

/// Custom field value visible from every associated project.
#[derive(Debug, Clone, Serialize)]
pub struct CustomFieldValue {
    pub field_id: u32,
    pub value: String,
}

/// Issue details for the show view.
#[derive(Debug, Clone, Serialize)]
pub struct IssueDetails {
    #[serde(flatten)]
    pub issue: Issue,
    pub projects: Vec<ProjectSummary>,
    pub cross_project_fields: Vec<CustomFieldValue>,
    pub journals: Vec<JournalEntry>,
}

impl IssueDetails {
    #[must_use]
    pub fn new(
        issue: Issue,
        directory: &InMemoryDirectory,
        settings: &Settings,
        journals: Vec<JournalEntry>,
    ) -> Self {
        let projects = issue
            .project_ids
            .iter()
            .map(|id| ProjectSummary {
                id: *id,
                name: directory
                    .project(*id)
                    .map_or_else(|| format!("#{id}"), |p| p.name.clone()),
                primary: *id == issue.project_id,
            })
            .collect();
        let cross_project_fields = issue
            .custom_field_values
            .iter()
            .filter(|(field_id, _)| settings.is_cross_project_field(**field_id))
            .map(|(field_id, value)| CustomFieldValue {
                field_id: *field_id,
                value: value.clone(),
            })
            .collect();

        Self {
            issue,
            projects,
            cross_project_fields,
            journals,
        }
    }
}

/// Committed mutation for create/update output.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub issue: Issue,
    pub added: Vec<ProjectId>,
    pub removed: Vec<ProjectId>,
    pub journal: Option<JournalEntry>,
    pub recipients: Option<NotificationSet>,
    pub warnings: Vec<String>,
}

impl UpdateReport {
    fn ids(diff: &ProjectSetDiff) -> (Vec<ProjectId>, Vec<ProjectId>) {
        (
            diff.added.iter().copied().collect(),
            diff.removed.iter().copied().collect(),
        )
    }
}

impl From<UpdateOutcome> for UpdateReport {
    fn from(outcome: UpdateOutcome) -> Self {
        let (added, removed) = Self::ids(&outcome.diff);
        Self {
            issue: outcome.issue,
            added,
            removed,
            journal: outcome.journal,
            recipients: outcome.recipients,
            warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Result of a permission check.
#[derive(Debug, Clone, Serialize)]
pub struct AccessReport {
    pub user_id: UserId,
    pub issue_id: multiprojects_lib::IssueId,
    pub action: Action,
    pub allowed: bool,
}
