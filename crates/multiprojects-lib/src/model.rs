//! Core data types for multiprojects-lib.
//!
//! Issues, projects, users and memberships are owned by the host tracker;
//! this crate reads them and only ever writes an issue's associated project
//! set and the journal entries describing changes to it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MultiprojectError;

const fn default_true() -> bool {
    true
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_true(b: &bool) -> bool {
    *b
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = MultiprojectError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u32>().map(Self).map_err(|_| {
                    MultiprojectError::validation($field, format!("not a valid id: {s:?}"))
                })
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// Project identifier.
    ProjectId,
    "project_id"
);
numeric_id!(
    /// User identifier.
    UserId,
    "user_id"
);
numeric_id!(
    /// Issue identifier.
    IssueId,
    "issue_id"
);

/// Issue workflow status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    New,
    InProgress,
    Resolved,
    Feedback,
    Closed,
    Rejected,
    #[serde(untagged)]
    Custom(String),
}

impl Status {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Feedback => "feedback",
            Self::Closed => "closed",
            Self::Rejected => "rejected",
            Self::Custom(value) => value,
        }
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed | Self::Rejected)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Status {
    type Err = MultiprojectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "in_progress" | "inprogress" | "in-progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "feedback" => Ok(Self::Feedback),
            "closed" => Ok(Self::Closed),
            "rejected" => Ok(Self::Rejected),
            "" => Err(MultiprojectError::InvalidStatus {
                status: s.to_string(),
            }),
            other => Ok(Self::Custom(other.to_string())),
        }
    }
}

/// Issue priority, lowest to highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
    Immediate,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
            Self::Immediate => "immediate",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = MultiprojectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            "immediate" => Ok(Self::Immediate),
            _ => Err(MultiprojectError::InvalidPriority {
                priority: s.to_string(),
            }),
        }
    }
}

/// A tracked work item filed under one primary project and associated with
/// any number of secondary ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issue {
    pub id: IssueId,

    pub subject: String,

    /// Primary project.
    pub project_id: ProjectId,

    /// Associated projects. Always contains `project_id`.
    #[serde(default)]
    pub project_ids: BTreeSet<ProjectId>,

    #[serde(default)]
    pub status: Status,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,

    pub author: UserId,

    /// When false, secondary projects only grant visibility; editing and
    /// commenting require permission on the primary project.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub answers_on_secondary_projects: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_field_values: BTreeMap<u32, String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Issue {
    /// Build an issue associated with its primary project only.
    #[must_use]
    pub fn new(
        id: IssueId,
        subject: impl Into<String>,
        project_id: ProjectId,
        author: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            subject: subject.into(),
            project_id,
            project_ids: BTreeSet::from([project_id]),
            status: Status::default(),
            priority: Priority::default(),
            assigned_to: None,
            author,
            answers_on_secondary_projects: true,
            custom_field_values: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Associated projects other than the primary one.
    pub fn secondary_project_ids(&self) -> impl Iterator<Item = ProjectId> + '_ {
        self.project_ids
            .iter()
            .copied()
            .filter(move |id| *id != self.project_id)
    }

    /// Whether the issue is associated with more than its primary project.
    #[must_use]
    pub fn is_multiproject(&self) -> bool {
        self.secondary_project_ids().next().is_some()
    }

    /// Restore the primary-membership invariant on data read from outside.
    pub fn ensure_primary_associated(&mut self) {
        self.project_ids.insert(self.project_id);
    }
}

/// A project, read-only from this crate's perspective.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// A user account as seen by notification and permission checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub login: String,
    #[serde(default)]
    pub mail: String,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    #[serde(default)]
    pub admin: bool,
}

/// A named role granting a set of permissions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

/// Membership of a user in a project through one or more roles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub user: UserId,
    pub project: ProjectId,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Per-user notification preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPreferences {
    pub notifications_enabled: bool,
    pub mail: String,
}

/// Direction of an associated-project change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectAction {
    Added,
    Removed,
}

impl ProjectAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for ProjectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One atomic change within a journal entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "property")]
pub enum JournalDetail {
    /// An ordinary issue field changed.
    #[serde(rename = "attr")]
    Attribute {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        old_value: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_value: Option<String>,
    },
    /// A project joined or left the associated set.
    #[serde(rename = "associated_projects")]
    AssociatedProject {
        action: ProjectAction,
        project_id: ProjectId,
    },
}

impl JournalDetail {
    #[must_use]
    pub const fn added(project_id: ProjectId) -> Self {
        Self::AssociatedProject {
            action: ProjectAction::Added,
            project_id,
        }
    }

    #[must_use]
    pub const fn removed(project_id: ProjectId) -> Self {
        Self::AssociatedProject {
            action: ProjectAction::Removed,
            project_id,
        }
    }
}

/// Audit record of one mutation's observable changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalEntry {
    pub id: u64,
    pub issue_id: IssueId,
    pub author: UserId,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<JournalDetail>,
}

impl JournalEntry {
    /// Projects this entry added, in recorded order.
    #[must_use]
    pub fn added_projects(&self) -> Vec<ProjectId> {
        self.project_changes(ProjectAction::Added)
    }

    /// Projects this entry removed, in recorded order.
    #[must_use]
    pub fn removed_projects(&self) -> Vec<ProjectId> {
        self.project_changes(ProjectAction::Removed)
    }

    fn project_changes(&self, wanted: ProjectAction) -> Vec<ProjectId> {
        self.details
            .iter()
            .filter_map(|detail| match detail {
                JournalDetail::AssociatedProject { action, project_id } if *action == wanted => {
                    Some(*project_id)
                }
                _ => None,
            })
            .collect()
    }
}

/// An ordinary field change folded into the same journal entry as project
/// set changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl FieldChange {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            old_value,
            new_value,
        }
    }
}

impl From<FieldChange> for JournalDetail {
    fn from(change: FieldChange) -> Self {
        Self::Attribute {
            name: change.name,
            old_value: change.old_value,
            new_value: change.new_value,
        }
    }
}

/// A user entitled to a notification, with the address to send it to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Recipient {
    pub user_id: UserId,
    pub mail: String,
}

/// Deduplicated notification targets for one mutation, ordered by user id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationSet(Vec<Recipient>);

impl NotificationSet {
    /// Build a set from recipients in any order; duplicates by user collapse
    /// onto the first seen.
    #[must_use]
    pub fn from_recipients(recipients: impl IntoIterator<Item = Recipient>) -> Self {
        let mut by_user: BTreeMap<UserId, Recipient> = BTreeMap::new();
        for recipient in recipients {
            by_user.entry(recipient.user_id).or_insert(recipient);
        }
        Self(by_user.into_values().collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Recipient> {
        self.0.iter()
    }

    #[must_use]
    pub fn contains_user(&self, user: UserId) -> bool {
        self.0
            .binary_search_by_key(&user, |recipient| recipient.user_id)
            .is_ok()
    }

    #[must_use]
    pub fn user_ids(&self) -> Vec<UserId> {
        self.0.iter().map(|recipient| recipient.user_id).collect()
    }

    #[must_use]
    pub fn mails(&self) -> Vec<&str> {
        self.0.iter().map(|recipient| recipient.mail.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a NotificationSet {
    type Item = &'a Recipient;
    type IntoIter = std::slice::Iter<'a, Recipient>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Something a user may want to do with an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ViewIssue,
    EditIssue,
    AddNotes,
}

impl Action {
    /// Permission a project role must grant for this action.
    #[must_use]
    pub const fn permission(self) -> &'static str {
        match self {
            Self::ViewIssue => "view_issues",
            Self::EditIssue => "edit_issues",
            Self::AddNotes => "add_issue_notes",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ViewIssue => "view",
            Self::EditIssue => "edit",
            Self::AddNotes => "add_notes",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Action {
    type Err = MultiprojectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "view" | "view_issue" | "view_issues" => Ok(Self::ViewIssue),
            "edit" | "edit_issue" | "edit_issues" => Ok(Self::EditIssue),
            "add_notes" | "notes" | "comment" | "add_issue_notes" => Ok(Self::AddNotes),
            other => Err(MultiprojectError::validation(
                "action",
                format!("unknown action: {other}"),
            )),
        }
    }
}
