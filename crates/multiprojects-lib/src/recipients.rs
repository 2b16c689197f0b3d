//! Recipient resolver.
//!
//! Collects who should hear about an issue across every associated project,
//! not just the primary one.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::model::{Issue, NotificationSet, ProjectId, Recipient, UserId};
use crate::ports::{PermissionOracle, UserDirectory};

/// Resolves notification recipients for an issue.
pub struct RecipientResolver<'a> {
    oracle: &'a dyn PermissionOracle,
    users: &'a dyn UserDirectory,
}

impl<'a> RecipientResolver<'a> {
    #[must_use]
    pub fn new(oracle: &'a dyn PermissionOracle, users: &'a dyn UserDirectory) -> Self {
        Self { oracle, users }
    }

    /// Members of any associated project who hold `permission` on at least
    /// one of them, have notifications enabled, and have a mail address.
    ///
    /// # Errors
    ///
    /// Returns `OracleUnavailable` if membership or permissions cannot be
    /// read. Members whose preferences cannot be read are skipped.
    pub fn resolve(&self, issue: &Issue, permission: &str) -> Result<NotificationSet> {
        let projects: Vec<ProjectId> = if issue.project_ids.is_empty() {
            vec![issue.project_id]
        } else {
            issue.project_ids.iter().copied().collect()
        };

        let mut candidates: BTreeSet<UserId> = BTreeSet::new();
        for project in &projects {
            candidates.extend(self.oracle.members_of(*project)?);
        }

        let mut recipients = Vec::new();
        for user in candidates {
            if !self.allowed_anywhere(user, &projects, permission)? {
                tracing::trace!(user = %user, permission, "Skipping member without permission");
                continue;
            }

            let prefs = match self.users.preferences_of(user) {
                Ok(prefs) => prefs,
                Err(e) => {
                    tracing::warn!(user = %user, error = %e, "Skipping member without readable preferences");
                    continue;
                }
            };
            if !prefs.notifications_enabled {
                tracing::trace!(user = %user, "Skipping user with notifications disabled");
                continue;
            }
            let mail = prefs.mail.trim();
            if mail.is_empty() {
                tracing::trace!(user = %user, "Skipping user without mail address");
                continue;
            }

            recipients.push(Recipient {
                user_id: user,
                mail: mail.to_string(),
            });
        }

        let set = NotificationSet::from_recipients(recipients);
        tracing::debug!(
            issue = %issue.id,
            projects = projects.len(),
            recipients = set.len(),
            "Resolved notification recipients"
        );
        Ok(set)
    }

    fn allowed_anywhere(&self, user: UserId, projects: &[ProjectId], permission: &str) -> Result<bool> {
        for project in projects {
            if self.oracle.has_permission(user, *project, permission)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
