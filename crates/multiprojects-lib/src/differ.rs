//! Project set differ.
//!
//! Pure set arithmetic over associated project ids. Form submissions carry a
//! blank entry meaning "no selection"; blanks are stripped here so nothing
//! downstream has to tell blank, absent and empty apart.

use std::collections::BTreeSet;

use crate::error::{MultiprojectError, Result};
use crate::model::ProjectId;

/// Delta between two associated project sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSetDiff {
    pub added: BTreeSet<ProjectId>,
    pub removed: BTreeSet<ProjectId>,
}

impl ProjectSetDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Replay the delta onto `base`.
    #[must_use]
    pub fn apply_to(&self, base: &BTreeSet<ProjectId>) -> BTreeSet<ProjectId> {
        base.union(&self.added)
            .filter(|id| !self.removed.contains(id))
            .copied()
            .collect()
    }
}

/// Parse a raw selection into a set, dropping blank placeholders and
/// collapsing duplicates.
///
/// # Errors
///
/// Returns `InvalidProjectSet` if a non-blank entry is not a project id.
pub fn normalize<S: AsRef<str>>(raw: &[S]) -> Result<BTreeSet<ProjectId>> {
    raw.iter()
        .map(AsRef::as_ref)
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| {
            entry.parse::<ProjectId>().map_err(|_| {
                MultiprojectError::invalid_project_set(format!("not a project id: {entry:?}"))
            })
        })
        .collect()
}

/// Compute `(new \ old, old \ new)`.
#[must_use]
pub fn diff(old: &BTreeSet<ProjectId>, new: &BTreeSet<ProjectId>) -> ProjectSetDiff {
    ProjectSetDiff {
        added: new.difference(old).copied().collect(),
        removed: old.difference(new).copied().collect(),
    }
}

/// Normalize two raw selections and diff them.
///
/// # Errors
///
/// Returns `InvalidProjectSet` if either selection holds a non-blank entry
/// that is not a project id.
pub fn diff_selections<S: AsRef<str>>(old: &[S], new: &[S]) -> Result<ProjectSetDiff> {
    Ok(diff(&normalize(old)?, &normalize(new)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(ids: &[u32]) -> BTreeSet<ProjectId> {
        ids.iter().copied().map(ProjectId).collect()
    }

    #[test]
    fn test_added_project() {
        let d = diff(&set(&[1]), &set(&[1, 5]));
        assert_eq!(d.added, set(&[5]));
        assert!(d.removed.is_empty());
    }

    #[test]
    fn test_removed_projects() {
        let d = diff(&set(&[1, 4, 5]), &set(&[1]));
        assert!(d.added.is_empty());
        assert_eq!(d.removed, set(&[4, 5]));
    }

    #[test]
    fn test_empty_inputs() {
        let d = diff(&set(&[]), &set(&[]));
        assert!(d.is_empty());
    }

    #[test]
    fn test_blank_placeholder_is_no_selection() {
        let d = diff_selections(&["2"], &[""]).unwrap();
        assert!(d.added.is_empty());
        assert_eq!(d.removed, set(&[2]));
    }

    #[test]
    fn test_order_and_duplicates_do_not_matter() {
        let d = diff_selections(&["5", "1", "1"], &["1", "5", " ", "5"]).unwrap();
        assert!(d.is_empty());
    }

    #[test]
    fn test_non_numeric_entry_rejected() {
        let err = normalize(&["1", "ecookbook"]).unwrap_err();
        assert!(matches!(err, MultiprojectError::InvalidProjectSet { .. }));
    }

    proptest! {
        #[test]
        fn prop_added_and_removed_disjoint(
            a in proptest::collection::btree_set(0u32..20, 0..10),
            b in proptest::collection::btree_set(0u32..20, 0..10),
        ) {
            let a: BTreeSet<ProjectId> = a.into_iter().map(ProjectId).collect();
            let b: BTreeSet<ProjectId> = b.into_iter().map(ProjectId).collect();
            let d = diff(&a, &b);
            prop_assert!(d.added.is_disjoint(&d.removed));
            prop_assert_eq!(d.apply_to(&a), b);
        }

        #[test]
        fn prop_diff_with_self_is_empty(
            a in proptest::collection::vec(0u32..20, 0..10),
        ) {
            let raw: Vec<String> = a.iter().map(ToString::to_string).collect();
            let mut shuffled = raw.clone();
            shuffled.reverse();
            shuffled.push(String::new());
            let d = diff_selections(&raw, &shuffled).unwrap();
            prop_assert!(d.is_empty());
        }
    }
}
