//! Interfaces to the host tracker's services.
//!
//! The core never owns issues, projects, users or memberships. It reaches
//! them only through these traits, so a host can back them with its own
//! database, directory service and mail transport.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::model::{
    Issue, IssueId, JournalEntry, NotificationSet, ProjectId, UserId, UserPreferences,
};

/// Role/permission model of the host tracker.
pub trait PermissionOracle: Send + Sync {
    /// Whether `user` holds `permission` on `project`.
    ///
    /// # Errors
    ///
    /// Returns `OracleUnavailable` if the answer cannot be determined.
    fn has_permission(&self, user: UserId, project: ProjectId, permission: &str) -> Result<bool>;

    /// Members of `project`, in the host's membership order.
    ///
    /// # Errors
    ///
    /// Returns `OracleUnavailable` if membership cannot be read.
    fn members_of(&self, project: ProjectId) -> Result<Vec<UserId>>;
}

/// Per-user notification preferences.
pub trait UserDirectory: Send + Sync {
    /// Preferences of `user`.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the user record cannot be read.
    fn preferences_of(&self, user: UserId) -> Result<UserPreferences>;
}

/// Existence checks against the host's project table.
pub trait ProjectDirectory: Send + Sync {
    /// Whether `project` exists and accepts issues.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the project table cannot be read.
    fn project_exists(&self, project: ProjectId) -> Result<bool>;
}

/// Persistence of issues.
pub trait IssueStore: Send + Sync {
    /// Load an issue by id.
    ///
    /// # Errors
    ///
    /// Returns `IssueNotFound` if no such issue exists.
    fn load(&self, id: IssueId) -> Result<Issue>;

    /// Persist a newly created issue.
    ///
    /// # Errors
    ///
    /// Returns `IdCollision` if the id is taken.
    fn insert(&self, issue: &Issue) -> Result<()>;

    /// Replace the whole issue record.
    ///
    /// # Errors
    ///
    /// Returns `IssueNotFound` if no such issue exists.
    fn save(&self, issue: &Issue) -> Result<()>;

    /// Replace only the associated project set.
    ///
    /// # Errors
    ///
    /// Returns `IssueNotFound` if no such issue exists.
    fn save_associated_projects(&self, id: IssueId, projects: &BTreeSet<ProjectId>) -> Result<()>;

    /// Next unused issue id.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store cannot be read.
    fn next_id(&self) -> Result<IssueId>;
}

/// Append-only audit trail.
pub trait JournalStore: Send + Sync {
    /// Append `entry` to the journal of `issue`. The store assigns the
    /// entry id; the stored entry is returned.
    ///
    /// # Errors
    ///
    /// Returns `JournalWriteFailed` if the entry could not be written.
    fn append(&self, issue: IssueId, entry: JournalEntry) -> Result<JournalEntry>;

    /// All entries recorded for `issue`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the journal cannot be read.
    fn entries_for(&self, issue: IssueId) -> Result<Vec<JournalEntry>>;
}

/// Mail transport.
pub trait Notifier: Send + Sync {
    /// Send one notification about `issue` to every recipient.
    ///
    /// # Errors
    ///
    /// Returns `NotificationFailed` if delivery failed.
    fn deliver(
        &self,
        issue: &Issue,
        journal: Option<&JournalEntry>,
        recipients: &NotificationSet,
    ) -> Result<()>;
}
