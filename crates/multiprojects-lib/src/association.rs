//! Association manager.
//!
//! The single write path for an issue's associated project set. Each
//! mutation runs diff, persist and journal under the issue's lock; recipient
//! resolution and delivery run afterwards against the committed snapshot
//! and can only produce warnings.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;

use crate::access::AccessGate;
use crate::differ::{self, ProjectSetDiff};
use crate::error::{MultiprojectError, Result};
use crate::journal::{DetailOrder, JournalRecorder};
use crate::locks::IssueLocks;
use crate::model::{
    Action, FieldChange, Issue, IssueId, JournalEntry, NotificationSet, ProjectId, UserId,
};
use crate::ports::{
    IssueStore, JournalStore, Notifier, PermissionOracle, ProjectDirectory, UserDirectory,
};
use crate::query::{IssueUpdate, NewIssue};
use crate::recipients::RecipientResolver;

/// Default permission a user needs to be notified about an issue.
pub const DEFAULT_NOTIFIABLE_PERMISSION: &str = "view_issues";

/// The host services the manager talks to.
#[derive(Clone)]
pub struct Services {
    pub issues: Arc<dyn IssueStore>,
    pub projects: Arc<dyn ProjectDirectory>,
    pub oracle: Arc<dyn PermissionOracle>,
    pub users: Arc<dyn UserDirectory>,
    pub journal: Arc<dyn JournalStore>,
    pub notifier: Option<Arc<dyn Notifier>>,
}

/// Tunables for the manager.
#[derive(Debug, Clone)]
pub struct ManagerOptions {
    pub notifiable_permission: String,
    pub detail_order: DetailOrder,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            notifiable_permission: DEFAULT_NOTIFIABLE_PERMISSION.to_string(),
            detail_order: DetailOrder::default(),
        }
    }
}

/// Result of a committed mutation.
#[derive(Debug)]
pub struct UpdateOutcome {
    /// Issue as committed.
    pub issue: Issue,
    /// Journal entry written for the mutation, if any.
    pub journal: Option<JournalEntry>,
    /// Associated project delta that was applied.
    pub diff: ProjectSetDiff,
    /// Who was notified. `None` when nothing was sent or resolution failed.
    pub recipients: Option<NotificationSet>,
    /// Post-commit failures. The mutation itself stands.
    pub warnings: Vec<MultiprojectError>,
}

impl UpdateOutcome {
    /// Whether the mutation changed anything observable.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.journal.is_some() || !self.diff.is_empty()
    }
}

/// What a commit produced before post-commit work.
struct Committed {
    issue: Issue,
    journal: Option<JournalEntry>,
    diff: ProjectSetDiff,
    notify: bool,
    warnings: Vec<MultiprojectError>,
}

/// Orchestrates issue mutations that touch associated projects.
pub struct AssociationManager {
    services: Services,
    options: ManagerOptions,
    recorder: JournalRecorder,
    locks: IssueLocks,
    create_lock: Mutex<()>,
}

impl AssociationManager {
    #[must_use]
    pub fn new(services: Services, options: ManagerOptions) -> Self {
        let recorder = JournalRecorder::new(options.detail_order);
        Self {
            services,
            options,
            recorder,
            locks: IssueLocks::new(),
            create_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn options(&self) -> &ManagerOptions {
        &self.options
    }

    /// Load an issue through the issue store.
    ///
    /// # Errors
    ///
    /// Returns `IssueNotFound` if no such issue exists.
    pub fn issue(&self, id: IssueId) -> Result<Issue> {
        self.services.issues.load(id)
    }

    /// Replace an issue's associated projects with `requested`, recording
    /// `other_changes` (already applied by the caller) in the same journal
    /// entry.
    ///
    /// # Errors
    ///
    /// Returns `IssueNotFound`, `InvalidProjectSet` or
    /// `PrimaryProjectMissingFromStore` before any state changes, or a
    /// storage error if the project set could not be saved.
    pub fn apply_project_set<S: AsRef<str>>(
        &self,
        issue_id: IssueId,
        requested: &[S],
        actor: UserId,
        other_changes: &[FieldChange],
    ) -> Result<UpdateOutcome> {
        let committed = self.locks.with_lock(issue_id, || -> Result<Committed> {
            let mut issue = self.services.issues.load(issue_id)?;
            let target = self.normalize_request(&issue, requested)?;
            let diff = differ::diff(&issue.project_ids, &target);

            if !diff.is_empty() {
                self.services
                    .issues
                    .save_associated_projects(issue_id, &target)?;
                issue.project_ids = target;
                issue.updated_at = Utc::now();
            }

            Ok(self.journal_commit(issue, actor, diff, other_changes, None))
        })?;

        Ok(self.after_commit(committed))
    }

    /// Apply an update to ordinary fields and, optionally, the associated
    /// project set as one mutation producing at most one journal entry.
    ///
    /// # Errors
    ///
    /// Returns `IssueNotFound`, `Validation`, `InvalidProjectSet` or
    /// `PrimaryProjectMissingFromStore` before any state changes, or a
    /// storage error if the issue could not be saved.
    pub fn update_issue(
        &self,
        issue_id: IssueId,
        update: &IssueUpdate,
        actor: UserId,
    ) -> Result<UpdateOutcome> {
        if update.subject.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(MultiprojectError::validation("subject", "cannot be empty"));
        }

        let committed = self.locks.with_lock(issue_id, || -> Result<Committed> {
            let mut issue = self.services.issues.load(issue_id)?;
            let target = match &update.project_ids {
                Some(raw) => self.normalize_request(&issue, raw)?,
                None => {
                    self.ensure_primary_exists(&issue)?;
                    issue.project_ids.clone()
                }
            };
            let diff = differ::diff(&issue.project_ids, &target);
            let changes = update.apply_fields(&mut issue);

            if !diff.is_empty() || !changes.is_empty() {
                issue.project_ids = target;
                issue.updated_at = Utc::now();
                self.services.issues.save(&issue)?;
            }

            Ok(self.journal_commit(issue, actor, diff, &changes, update.notes.as_deref()))
        })?;

        Ok(self.after_commit(committed))
    }

    /// Create an issue associated with its primary project plus the
    /// requested ones, then notify. Creation writes no journal entry.
    ///
    /// # Errors
    ///
    /// Returns `Validation`, `InvalidProjectSet` or
    /// `PrimaryProjectMissingFromStore` before anything is stored, or a
    /// storage error if the issue could not be inserted.
    pub fn create_issue(&self, new: &NewIssue, actor: UserId) -> Result<UpdateOutcome> {
        if new.subject.trim().is_empty() {
            return Err(MultiprojectError::validation("subject", "cannot be empty"));
        }

        // The id is assigned once the project set has been validated.
        let mut issue = Issue::new(IssueId(0), new.subject.trim(), new.project_id, actor);
        issue.status = new.status.clone();
        issue.priority = new.priority;
        issue.assigned_to = new.assigned_to;
        issue.answers_on_secondary_projects = new.answers_on_secondary_projects;
        issue.custom_field_values.clone_from(&new.custom_field_values);

        let base = issue.project_ids.clone();
        issue.project_ids = self.normalize_request(&issue, &new.project_ids)?;

        {
            let _creating = self
                .create_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            issue.id = self.services.issues.next_id()?;
            self.services.issues.insert(&issue)?;
        }

        tracing::info!(
            issue = %issue.id,
            project = %issue.project_id,
            projects = ?issue.project_ids,
            actor = %actor,
            "Issue created"
        );

        let diff = differ::diff(&base, &issue.project_ids);
        Ok(self.after_commit(Committed {
            issue,
            journal: None,
            diff,
            notify: true,
            warnings: Vec::new(),
        }))
    }

    /// Whether `user` may perform `action` on the issue. Any failure denies.
    #[must_use]
    pub fn can_perform(&self, user: UserId, issue_id: IssueId, action: Action) -> bool {
        match self.services.issues.load(issue_id) {
            Ok(issue) => {
                AccessGate::new(self.services.oracle.as_ref()).can_perform(user, &issue, action)
            }
            Err(e) => {
                tracing::warn!(
                    user = %user,
                    issue = %issue_id,
                    error = %e,
                    "Cannot load issue; denying"
                );
                false
            }
        }
    }

    /// Users to notify about the issue for `permission`.
    ///
    /// # Errors
    ///
    /// Returns `IssueNotFound` or `OracleUnavailable`.
    pub fn resolve_notification_recipients(
        &self,
        issue_id: IssueId,
        permission: &str,
    ) -> Result<NotificationSet> {
        let issue = self.services.issues.load(issue_id)?;
        self.resolver().resolve(&issue, permission)
    }

    /// Journal entries of the issue, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the journal cannot be read.
    pub fn journal(&self, issue_id: IssueId) -> Result<Vec<JournalEntry>> {
        self.services.journal.entries_for(issue_id)
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    fn resolver(&self) -> RecipientResolver<'_> {
        RecipientResolver::new(self.services.oracle.as_ref(), self.services.users.as_ref())
    }

    fn ensure_primary_exists(&self, issue: &Issue) -> Result<()> {
        if self.services.projects.project_exists(issue.project_id)? {
            Ok(())
        } else {
            Err(MultiprojectError::PrimaryProjectMissingFromStore {
                issue_id: issue.id,
                project_id: issue.project_id,
            })
        }
    }

    /// Strip blanks, collapse duplicates, re-insert the primary project and
    /// reject newly linked projects the directory does not know.
    fn normalize_request<S: AsRef<str>>(
        &self,
        issue: &Issue,
        requested: &[S],
    ) -> Result<BTreeSet<ProjectId>> {
        self.ensure_primary_exists(issue)?;

        let mut target = differ::normalize(requested)?;
        let explicit = requested.iter().any(|r| !r.as_ref().trim().is_empty());
        if target.insert(issue.project_id) && explicit {
            tracing::debug!(
                issue = %issue.id,
                primary = %issue.project_id,
                "Primary project missing from request; keeping it"
            );
        }

        let mut unknown = Vec::new();
        for project in target.difference(&issue.project_ids) {
            if !self.services.projects.project_exists(*project)? {
                unknown.push(project.to_string());
            }
        }
        if !unknown.is_empty() {
            return Err(MultiprojectError::invalid_project_set(format!(
                "unknown projects: {}",
                unknown.join(", ")
            )));
        }
        if target.is_empty() {
            return Err(MultiprojectError::invalid_project_set("empty project set"));
        }

        Ok(target)
    }

    /// Write the journal entry for a persisted mutation. Journal failures
    /// become warnings; the persisted state is kept.
    fn journal_commit(
        &self,
        issue: Issue,
        actor: UserId,
        diff: ProjectSetDiff,
        changes: &[FieldChange],
        notes: Option<&str>,
    ) -> Committed {
        let mut warnings = Vec::new();
        let journal = match self.recorder.record(
            self.services.journal.as_ref(),
            &issue,
            actor,
            &diff,
            changes,
            notes,
        ) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::error!(issue = %issue.id, error = %e, "Journal write failed; update kept");
                warnings.push(e);
                None
            }
        };

        let notify = journal.is_some() || !warnings.is_empty();
        if notify {
            tracing::info!(
                issue = %issue.id,
                actor = %actor,
                added = ?diff.added,
                removed = ?diff.removed,
                fields = changes.len(),
                "Issue updated"
            );
        } else {
            tracing::debug!(issue = %issue.id, "Update changed nothing");
        }

        Committed {
            issue,
            journal,
            diff,
            notify,
            warnings,
        }
    }

    /// Resolve recipients and hand them to the notifier. Never fails.
    fn after_commit(&self, committed: Committed) -> UpdateOutcome {
        let Committed {
            issue,
            journal,
            diff,
            notify,
            mut warnings,
        } = committed;

        let recipients = if notify {
            match self
                .resolver()
                .resolve(&issue, &self.options.notifiable_permission)
            {
                Ok(set) => Some(set),
                Err(e) => {
                    tracing::warn!(issue = %issue.id, error = %e, "Recipient resolution failed");
                    warnings.push(e);
                    None
                }
            }
        } else {
            None
        };

        if let (Some(set), Some(notifier)) = (&recipients, &self.services.notifier) {
            if !set.is_empty() {
                if let Err(e) = notifier.deliver(&issue, journal.as_ref(), set) {
                    tracing::warn!(issue = %issue.id, error = %e, "Notification delivery failed");
                    warnings.push(match e {
                        MultiprojectError::NotificationFailed(_) => e,
                        other => MultiprojectError::NotificationFailed(other.to_string()),
                    });
                }
            }
        }

        UpdateOutcome {
            issue,
            journal,
            diff,
            recipients,
            warnings,
        }
    }
}
