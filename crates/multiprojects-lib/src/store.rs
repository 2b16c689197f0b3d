//! In-memory implementations of the host tracker's services.
//!
//! Useful on their own for tests and the CLI, and as a reference for hosts
//! wiring the ports to real storage.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, PoisonError, RwLock};

use chrono::Utc;

use crate::error::{MultiprojectError, Result};
use crate::model::{
    Issue, IssueId, JournalEntry, Member, NotificationSet, Project, ProjectId, Role, User, UserId,
    UserPreferences,
};
use crate::ports::{
    IssueStore, JournalStore, Notifier, PermissionOracle, ProjectDirectory, UserDirectory,
};

// ============================================================================
// Directory (projects, users, roles, memberships)
// ============================================================================

/// Projects, users, roles and memberships held in memory.
///
/// Admin users hold every permission on every active project; everyone else
/// holds the union of their member roles' permissions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    projects: BTreeMap<ProjectId, Project>,
    users: BTreeMap<UserId, User>,
    roles: BTreeMap<String, Role>,
    members: Vec<Member>,
}

impl InMemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from loaded records.
    #[must_use]
    pub fn from_parts(
        projects: Vec<Project>,
        users: Vec<User>,
        roles: Vec<Role>,
        members: Vec<Member>,
    ) -> Self {
        let mut dir = Self::new();
        projects.into_iter().for_each(|p| dir.add_project(p));
        users.into_iter().for_each(|u| dir.add_user(u));
        roles.into_iter().for_each(|r| dir.add_role(r));
        members.into_iter().for_each(|m| dir.add_member(m));
        dir
    }

    pub fn add_project(&mut self, project: Project) {
        self.projects.insert(project.id, project);
    }

    /// Insert or replace a user.
    pub fn add_user(&mut self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn add_role(&mut self, role: Role) {
        self.roles.insert(role.name.clone(), role);
    }

    /// Add a membership, merging roles if the user already belongs to the
    /// project.
    pub fn add_member(&mut self, member: Member) {
        if let Some(existing) = self
            .members
            .iter_mut()
            .find(|m| m.user == member.user && m.project == member.project)
        {
            for role in member.roles {
                if !existing.roles.contains(&role) {
                    existing.roles.push(role);
                }
            }
        } else {
            self.members.push(member);
        }
    }

    pub fn remove_project(&mut self, project: ProjectId) -> Option<Project> {
        self.members.retain(|m| m.project != project);
        self.projects.remove(&project)
    }

    #[must_use]
    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get(&id)
    }

    #[must_use]
    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    fn is_active(&self, project: ProjectId) -> bool {
        self.projects.get(&project).is_some_and(|p| p.active)
    }
}

impl PermissionOracle for InMemoryDirectory {
    fn has_permission(&self, user: UserId, project: ProjectId, permission: &str) -> Result<bool> {
        if !self.is_active(project) {
            return Ok(false);
        }
        if self.users.get(&user).is_some_and(|u| u.admin) {
            return Ok(true);
        }

        Ok(self
            .members
            .iter()
            .filter(|m| m.user == user && m.project == project)
            .flat_map(|m| m.roles.iter())
            .filter_map(|name| self.roles.get(name))
            .any(|role| role.permissions.contains(permission)))
    }

    fn members_of(&self, project: ProjectId) -> Result<Vec<UserId>> {
        Ok(self
            .members
            .iter()
            .filter(|m| m.project == project)
            .map(|m| m.user)
            .collect())
    }
}

impl UserDirectory for InMemoryDirectory {
    fn preferences_of(&self, user: UserId) -> Result<UserPreferences> {
        let record = self
            .users
            .get(&user)
            .ok_or_else(|| MultiprojectError::Storage(format!("unknown user {user}")))?;
        Ok(UserPreferences {
            notifications_enabled: record.notifications_enabled,
            mail: record.mail.clone(),
        })
    }
}

impl ProjectDirectory for InMemoryDirectory {
    fn project_exists(&self, project: ProjectId) -> Result<bool> {
        Ok(self.is_active(project))
    }
}

// ============================================================================
// Issues
// ============================================================================

/// Issues held in memory behind a read/write lock.
#[derive(Debug, Default)]
pub struct InMemoryIssueStore {
    issues: RwLock<BTreeMap<IssueId, Issue>>,
}

impl InMemoryIssueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from loaded issues, restoring the primary-membership
    /// invariant on each.
    #[must_use]
    pub fn from_issues(issues: impl IntoIterator<Item = Issue>) -> Self {
        let map = issues
            .into_iter()
            .map(|mut issue| {
                issue.ensure_primary_associated();
                (issue.id, issue)
            })
            .collect();
        Self {
            issues: RwLock::new(map),
        }
    }

    /// Copy of every issue, ordered by id.
    #[must_use]
    pub fn all(&self) -> Vec<Issue> {
        self.issues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Put back a record captured before a failed write; `None` removes it.
    pub fn restore(&self, id: IssueId, previous: Option<Issue>) {
        let mut issues = self.issues.write().unwrap_or_else(PoisonError::into_inner);
        match previous {
            Some(issue) => {
                issues.insert(id, issue);
            }
            None => {
                issues.remove(&id);
            }
        }
    }
}

impl IssueStore for InMemoryIssueStore {
    fn load(&self, id: IssueId) -> Result<Issue> {
        self.issues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(MultiprojectError::IssueNotFound { id })
    }

    fn insert(&self, issue: &Issue) -> Result<()> {
        let mut issues = self.issues.write().unwrap_or_else(PoisonError::into_inner);
        if issues.contains_key(&issue.id) {
            return Err(MultiprojectError::IdCollision { id: issue.id });
        }
        issues.insert(issue.id, issue.clone());
        Ok(())
    }

    fn save(&self, issue: &Issue) -> Result<()> {
        let mut issues = self.issues.write().unwrap_or_else(PoisonError::into_inner);
        let slot = issues
            .get_mut(&issue.id)
            .ok_or(MultiprojectError::IssueNotFound { id: issue.id })?;
        slot.clone_from(issue);
        Ok(())
    }

    fn save_associated_projects(&self, id: IssueId, projects: &BTreeSet<ProjectId>) -> Result<()> {
        let mut issues = self.issues.write().unwrap_or_else(PoisonError::into_inner);
        let issue = issues
            .get_mut(&id)
            .ok_or(MultiprojectError::IssueNotFound { id })?;
        issue.project_ids.clone_from(projects);
        issue.updated_at = Utc::now();
        Ok(())
    }

    fn next_id(&self) -> Result<IssueId> {
        let issues = self.issues.read().unwrap_or_else(PoisonError::into_inner);
        match issues.keys().next_back() {
            None => Ok(IssueId(1)),
            Some(last) => last
                .0
                .checked_add(1)
                .map(IssueId)
                .ok_or_else(|| MultiprojectError::Storage(format!("issue ids exhausted after {last}"))),
        }
    }
}

// ============================================================================
// Journal
// ============================================================================

#[derive(Debug, Default)]
struct JournalLog {
    entries: Vec<JournalEntry>,
    next_id: u64,
}

impl JournalLog {
    fn push(&mut self, issue: IssueId, mut entry: JournalEntry) -> JournalEntry {
        self.next_id = self.next_id.max(1);
        entry.id = self.next_id;
        entry.issue_id = issue;
        self.next_id += 1;
        self.entries.push(entry.clone());
        entry
    }
}

/// Journal held in memory.
#[derive(Debug, Default)]
pub struct InMemoryJournalStore {
    log: Mutex<JournalLog>,
}

impl InMemoryJournalStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry across all issues, oldest first.
    #[must_use]
    pub fn all(&self) -> Vec<JournalEntry> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JournalStore for InMemoryJournalStore {
    fn append(&self, issue: IssueId, entry: JournalEntry) -> Result<JournalEntry> {
        Ok(self
            .log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(issue, entry))
    }

    fn entries_for(&self, issue: IssueId) -> Result<Vec<JournalEntry>> {
        Ok(self
            .log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .filter(|e| e.issue_id == issue)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Notification
// ============================================================================

/// One captured delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub issue_id: IssueId,
    pub journal_id: Option<u64>,
    pub recipients: NotificationSet,
}

/// Notifier that keeps deliveries in memory instead of sending mail.
#[derive(Debug, Default)]
pub struct Outbox {
    deliveries: Mutex<Vec<Delivery>>,
}

impl Outbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<Delivery> {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn clear(&self) {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Notifier for Outbox {
    fn deliver(
        &self,
        issue: &Issue,
        journal: Option<&JournalEntry>,
        recipients: &NotificationSet,
    ) -> Result<()> {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Delivery {
                issue_id: issue.id,
                journal_id: journal.map(|j| j.id),
                recipients: recipients.clone(),
            });
        Ok(())
    }
}

/// Notifier that only logs what it would send.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver(
        &self,
        issue: &Issue,
        journal: Option<&JournalEntry>,
        recipients: &NotificationSet,
    ) -> Result<()> {
        tracing::info!(
            issue = %issue.id,
            journal = journal.map(|j| j.id),
            bcc = %recipients.mails().join(", "),
            "Notification sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> InMemoryDirectory {
        InMemoryDirectory::from_parts(
            vec![
                Project {
                    id: ProjectId(1),
                    name: "eCookbook".into(),
                    identifier: Some("ecookbook".into()),
                    active: true,
                },
                Project {
                    id: ProjectId(2),
                    name: "OnlineStore".into(),
                    identifier: None,
                    active: false,
                },
            ],
            vec![
                User {
                    id: UserId(1),
                    login: "admin".into(),
                    mail: "admin@somenet.foo".into(),
                    notifications_enabled: true,
                    admin: true,
                },
                User {
                    id: UserId(2),
                    login: "jsmith".into(),
                    mail: "jsmith@somenet.foo".into(),
                    notifications_enabled: true,
                    admin: false,
                },
            ],
            vec![Role {
                name: "Manager".into(),
                permissions: ["view_issues".to_string(), "edit_issues".to_string()].into(),
            }],
            vec![Member {
                user: UserId(2),
                project: ProjectId(1),
                roles: vec!["Manager".into()],
            }],
        )
    }

    #[test]
    fn test_member_role_permissions() {
        let dir = directory();
        assert!(dir.has_permission(UserId(2), ProjectId(1), "edit_issues").unwrap());
        assert!(!dir.has_permission(UserId(2), ProjectId(1), "delete_issues").unwrap());
    }

    #[test]
    fn test_admin_has_every_permission_on_active_projects() {
        let dir = directory();
        assert!(dir.has_permission(UserId(1), ProjectId(1), "delete_issues").unwrap());
        assert!(!dir.has_permission(UserId(1), ProjectId(2), "view_issues").unwrap());
    }

    #[test]
    fn test_inactive_project_does_not_exist_for_new_links() {
        let dir = directory();
        assert!(dir.project_exists(ProjectId(1)).unwrap());
        assert!(!dir.project_exists(ProjectId(2)).unwrap());
        assert!(!dir.project_exists(ProjectId(9)).unwrap());
    }

    #[test]
    fn test_add_member_merges_roles() {
        let mut dir = directory();
        dir.add_member(Member {
            user: UserId(2),
            project: ProjectId(1),
            roles: vec!["Reporter".into(), "Manager".into()],
        });
        assert_eq!(dir.members().len(), 1);
        assert_eq!(dir.members()[0].roles, vec!["Manager", "Reporter"]);
    }

    #[test]
    fn test_issue_store_roundtrip() {
        let store = InMemoryIssueStore::new();
        let issue = Issue::new(IssueId(1), "Test", ProjectId(1), UserId(2));
        store.insert(&issue).unwrap();
        assert!(matches!(
            store.insert(&issue),
            Err(MultiprojectError::IdCollision { .. })
        ));

        let projects = BTreeSet::from([ProjectId(1), ProjectId(5)]);
        store
            .save_associated_projects(IssueId(1), &projects)
            .unwrap();
        assert_eq!(store.load(IssueId(1)).unwrap().project_ids, projects);
        assert_eq!(store.next_id().unwrap(), IssueId(2));
    }

    #[test]
    fn test_issue_store_missing() {
        let store = InMemoryIssueStore::new();
        assert!(matches!(
            store.load(IssueId(7)),
            Err(MultiprojectError::IssueNotFound { .. })
        ));
        assert_eq!(store.next_id().unwrap(), IssueId(1));
    }

    #[test]
    fn test_next_id_exhausted() {
        let store =
            InMemoryIssueStore::from_issues([Issue::new(IssueId(u32::MAX), "Last", ProjectId(1), UserId(2))]);
        assert!(matches!(store.next_id(), Err(MultiprojectError::Storage(_))));
    }

    #[test]
    fn test_restore_undoes_a_write() {
        let store = InMemoryIssueStore::new();
        let issue = Issue::new(IssueId(1), "Test", ProjectId(1), UserId(2));
        store.insert(&issue).unwrap();
        store
            .save_associated_projects(IssueId(1), &BTreeSet::from([ProjectId(1), ProjectId(5)]))
            .unwrap();

        store.restore(IssueId(1), Some(issue.clone()));
        assert_eq!(store.load(IssueId(1)).unwrap(), issue);
        store.restore(IssueId(1), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_from_issues_restores_primary() {
        let mut issue = Issue::new(IssueId(3), "Test", ProjectId(4), UserId(2));
        issue.project_ids.clear();
        let store = InMemoryIssueStore::from_issues([issue]);
        assert!(store.load(IssueId(3)).unwrap().project_ids.contains(&ProjectId(4)));
    }

    #[test]
    fn test_journal_ids_are_sequential() {
        let journal = InMemoryJournalStore::new();
        let entry = JournalEntry {
            id: 0,
            issue_id: IssueId(1),
            author: UserId(2),
            created_at: Utc::now(),
            notes: Some("first".into()),
            details: Vec::new(),
        };
        let a = journal.append(IssueId(1), entry.clone()).unwrap();
        let b = journal.append(IssueId(2), entry).unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(b.issue_id, IssueId(2));
        assert_eq!(journal.entries_for(IssueId(1)).unwrap().len(), 1);
    }
}
