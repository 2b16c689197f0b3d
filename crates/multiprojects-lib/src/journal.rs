//! Journal recorder.
//!
//! Decides what a mutation writes to the audit trail: at most one entry,
//! holding ordinary field changes first and associated project changes
//! after, or nothing at all when the mutation changed nothing observable.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::differ::ProjectSetDiff;
use crate::error::{MultiprojectError, Result};
use crate::model::{FieldChange, Issue, JournalDetail, JournalEntry, UserId};
use crate::ports::JournalStore;

/// Relative order of project additions and removals within an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailOrder {
    #[default]
    AddedFirst,
    RemovedFirst,
}

impl std::str::FromStr for DetailOrder {
    type Err = MultiprojectError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "added_first" => Ok(Self::AddedFirst),
            "removed_first" => Ok(Self::RemovedFirst),
            other => Err(MultiprojectError::Config(format!(
                "unknown detail order: {other}"
            ))),
        }
    }
}

/// Turns a project set delta plus field changes into a journal entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct JournalRecorder {
    order: DetailOrder,
}

impl JournalRecorder {
    #[must_use]
    pub const fn new(order: DetailOrder) -> Self {
        Self { order }
    }

    /// Build the entry for one mutation, or `None` if there is nothing to
    /// record. The returned entry has id 0 until a store assigns one.
    #[must_use]
    pub fn build(
        &self,
        issue: &Issue,
        author: UserId,
        diff: &ProjectSetDiff,
        field_changes: &[FieldChange],
        notes: Option<&str>,
    ) -> Option<JournalEntry> {
        let notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(ToString::to_string);

        let mut details: Vec<JournalDetail> = field_changes
            .iter()
            .filter(|change| change.old_value != change.new_value)
            .cloned()
            .map(JournalDetail::from)
            .collect();

        // BTreeSet iteration is already ascending by project id.
        let added = diff.added.iter().copied().map(JournalDetail::added);
        let removed = diff.removed.iter().copied().map(JournalDetail::removed);
        match self.order {
            DetailOrder::AddedFirst => details.extend(added.chain(removed)),
            DetailOrder::RemovedFirst => details.extend(removed.chain(added)),
        }

        if details.is_empty() && notes.is_none() {
            return None;
        }

        Some(JournalEntry {
            id: 0,
            issue_id: issue.id,
            author,
            created_at: Utc::now(),
            notes,
            details,
        })
    }

    /// Build and append the entry for one mutation.
    ///
    /// # Errors
    ///
    /// Returns `JournalWriteFailed` if the store rejects the entry.
    pub fn record(
        &self,
        store: &dyn JournalStore,
        issue: &Issue,
        author: UserId,
        diff: &ProjectSetDiff,
        field_changes: &[FieldChange],
        notes: Option<&str>,
    ) -> Result<Option<JournalEntry>> {
        let Some(entry) = self.build(issue, author, diff, field_changes, notes) else {
            tracing::debug!(issue = %issue.id, "Nothing to journal");
            return Ok(None);
        };

        let stored = store.append(issue.id, entry).map_err(|e| match e {
            MultiprojectError::JournalWriteFailed(_) => e,
            other => MultiprojectError::JournalWriteFailed(other.to_string()),
        })?;
        tracing::debug!(
            issue = %issue.id,
            journal = stored.id,
            details = stored.details.len(),
            "Journal entry recorded"
        );
        Ok(Some(stored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::diff;
    use crate::model::{IssueId, ProjectId};
    use crate::store::InMemoryJournalStore;
    use std::collections::BTreeSet;

    fn set(ids: &[u32]) -> BTreeSet<ProjectId> {
        ids.iter().copied().map(ProjectId).collect()
    }

    fn issue() -> Issue {
        Issue::new(IssueId(1), "Cannot print recipes", ProjectId(1), UserId(2))
    }

    #[test]
    fn test_no_change_no_entry() {
        let d = diff(&set(&[1]), &set(&[1]));
        let entry = JournalRecorder::default().build(&issue(), UserId(2), &d, &[], None);
        assert!(entry.is_none());
    }

    #[test]
    fn test_blank_notes_are_not_a_change() {
        let d = ProjectSetDiff::default();
        let entry = JournalRecorder::default().build(&issue(), UserId(2), &d, &[], Some("  "));
        assert!(entry.is_none());
    }

    #[test]
    fn test_unchanged_field_is_skipped() {
        let d = ProjectSetDiff::default();
        let same = FieldChange::new("category", Some("1".into()), Some("1".into()));
        let entry = JournalRecorder::default().build(&issue(), UserId(2), &d, &[same], None);
        assert!(entry.is_none());
    }

    #[test]
    fn test_single_added_detail() {
        let d = diff(&set(&[1]), &set(&[1, 5]));
        let entry = JournalRecorder::default()
            .build(&issue(), UserId(2), &d, &[], None)
            .unwrap();
        assert_eq!(entry.details, vec![JournalDetail::added(ProjectId(5))]);
    }

    #[test]
    fn test_removed_details_ascending() {
        let d = diff(&set(&[1, 5, 4]), &set(&[1]));
        let entry = JournalRecorder::default()
            .build(&issue(), UserId(2), &d, &[], None)
            .unwrap();
        assert_eq!(entry.removed_projects(), vec![ProjectId(4), ProjectId(5)]);
        assert_eq!(entry.details.len(), 2);
    }

    #[test]
    fn test_field_changes_come_first() {
        let d = diff(&set(&[1, 4, 5]), &set(&[1, 6]));
        let priority = FieldChange::new("priority", Some("normal".into()), Some("low".into()));
        let entry = JournalRecorder::default()
            .build(&issue(), UserId(2), &d, &[priority], None)
            .unwrap();
        assert_eq!(
            entry.details,
            vec![
                JournalDetail::Attribute {
                    name: "priority".into(),
                    old_value: Some("normal".into()),
                    new_value: Some("low".into()),
                },
                JournalDetail::added(ProjectId(6)),
                JournalDetail::removed(ProjectId(4)),
                JournalDetail::removed(ProjectId(5)),
            ]
        );
    }

    #[test]
    fn test_removed_first_order() {
        let d = diff(&set(&[1, 4]), &set(&[1, 6]));
        let entry = JournalRecorder::new(DetailOrder::RemovedFirst)
            .build(&issue(), UserId(2), &d, &[], None)
            .unwrap();
        assert_eq!(
            entry.details,
            vec![
                JournalDetail::removed(ProjectId(4)),
                JournalDetail::added(ProjectId(6)),
            ]
        );
    }

    #[test]
    fn test_notes_only_entry() {
        let entry = JournalRecorder::default()
            .build(
                &issue(),
                UserId(6),
                &ProjectSetDiff::default(),
                &[],
                Some("bla bla bla"),
            )
            .unwrap();
        assert!(entry.details.is_empty());
        assert_eq!(entry.notes.as_deref(), Some("bla bla bla"));
    }

    #[test]
    fn test_record_assigns_id() {
        let store = InMemoryJournalStore::new();
        let d = diff(&set(&[1]), &set(&[1, 5]));
        let stored = JournalRecorder::default()
            .record(&store, &issue(), UserId(2), &d, &[], None)
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, 1);
        assert_eq!(store.entries_for(IssueId(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_detail_order_parse() {
        assert_eq!(
            "removed-first".parse::<DetailOrder>().unwrap(),
            DetailOrder::RemovedFirst
        );
        assert!("random".parse::<DetailOrder>().is_err());
    }
}
