//! Access gate.
//!
//! A user may act on an issue if any associated project grants the action's
//! permission. Oracle failures always deny.

use crate::error::{MultiprojectError, Result};
use crate::model::{Action, Issue, ProjectId, UserId};
use crate::ports::PermissionOracle;

/// Authorizes actions on an issue across its associated projects.
pub struct AccessGate<'a> {
    oracle: &'a dyn PermissionOracle,
}

impl<'a> AccessGate<'a> {
    #[must_use]
    pub fn new(oracle: &'a dyn PermissionOracle) -> Self {
        Self { oracle }
    }

    /// Projects consulted for `action` on `issue`, primary first.
    fn scopes(issue: &Issue, action: Action) -> Vec<ProjectId> {
        let mut scopes = vec![issue.project_id];
        if action == Action::ViewIssue || issue.answers_on_secondary_projects {
            scopes.extend(issue.secondary_project_ids());
        }
        scopes
    }

    /// Check `action` for `user`, surfacing oracle failures.
    ///
    /// Stops at the first granting project. A project the oracle cannot
    /// answer for does not stop the scan, but if no project grants the
    /// permission the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns `OracleUnavailable` if no project granted the permission and
    /// at least one could not be checked.
    pub fn check(&self, user: UserId, issue: &Issue, action: Action) -> Result<bool> {
        let permission = action.permission();
        let mut failure: Option<MultiprojectError> = None;

        for project in Self::scopes(issue, action) {
            match self.oracle.has_permission(user, project, permission) {
                Ok(true) => {
                    tracing::trace!(
                        user = %user,
                        issue = %issue.id,
                        project = %project,
                        permission,
                        "Access granted"
                    );
                    return Ok(true);
                }
                Ok(false) => {}
                Err(e) => {
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(false),
        }
    }

    /// Whether `user` may perform `action` on `issue`. Failures deny.
    #[must_use]
    pub fn can_perform(&self, user: UserId, issue: &Issue, action: Action) -> bool {
        match self.check(user, issue, action) {
            Ok(allowed) => allowed,
            Err(e) => {
                tracing::warn!(
                    user = %user,
                    issue = %issue.id,
                    action = %action,
                    error = %e,
                    "Permission check failed; denying"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IssueId;
    use std::collections::{BTreeSet, HashSet};

    /// Grants `edit_issues`/`view_issues` on listed pairs; fails on listed projects.
    struct FakeOracle {
        grants: HashSet<(u32, u32, &'static str)>,
        broken: HashSet<u32>,
    }

    impl PermissionOracle for FakeOracle {
        fn has_permission(&self, user: UserId, project: ProjectId, permission: &str) -> Result<bool> {
            if self.broken.contains(&project.0) {
                return Err(MultiprojectError::OracleUnavailable("timeout".into()));
            }
            Ok(self
                .grants
                .iter()
                .any(|(u, p, perm)| *u == user.0 && *p == project.0 && *perm == permission))
        }

        fn members_of(&self, _project: ProjectId) -> Result<Vec<UserId>> {
            Ok(Vec::new())
        }
    }

    fn issue() -> Issue {
        let mut issue = Issue::new(IssueId(4), "Shared bug", ProjectId(1), UserId(2));
        issue.project_ids = BTreeSet::from([ProjectId(1), ProjectId(5)]);
        issue
    }

    fn oracle(grants: &[(u32, u32, &'static str)], broken: &[u32]) -> FakeOracle {
        FakeOracle {
            grants: grants.iter().copied().collect(),
            broken: broken.iter().copied().collect(),
        }
    }

    #[test]
    fn test_secondary_project_grants_access() {
        let o = oracle(&[(6, 5, "edit_issues")], &[]);
        assert!(AccessGate::new(&o).can_perform(UserId(6), &issue(), Action::EditIssue));
    }

    #[test]
    fn test_no_permission_anywhere_denies() {
        let o = oracle(&[(6, 5, "view_issues")], &[]);
        assert!(!AccessGate::new(&o).can_perform(UserId(6), &issue(), Action::EditIssue));
        assert!(!AccessGate::new(&o).can_perform(UserId(7), &issue(), Action::ViewIssue));
    }

    #[test]
    fn test_secondary_answers_disabled_limits_to_view() {
        let o = oracle(&[(6, 5, "edit_issues"), (6, 5, "view_issues")], &[]);
        let mut issue = issue();
        issue.answers_on_secondary_projects = false;
        let gate = AccessGate::new(&o);
        assert!(!gate.can_perform(UserId(6), &issue, Action::EditIssue));
        assert!(gate.can_perform(UserId(6), &issue, Action::ViewIssue));
    }

    #[test]
    fn test_oracle_failure_fails_closed() {
        let o = oracle(&[], &[1, 5]);
        let gate = AccessGate::new(&o);
        assert!(matches!(
            gate.check(UserId(6), &issue(), Action::EditIssue),
            Err(MultiprojectError::OracleUnavailable(_))
        ));
        assert!(!gate.can_perform(UserId(6), &issue(), Action::EditIssue));
    }

    #[test]
    fn test_failure_on_primary_still_checks_secondary() {
        let o = oracle(&[(6, 5, "add_issue_notes")], &[1]);
        assert!(AccessGate::new(&o).can_perform(UserId(6), &issue(), Action::AddNotes));
    }
}
