//! Per-issue mutual exclusion.
//!
//! One lock per issue id, created on first use and dropped once no caller
//! holds or waits on it. Mutations of different issues never share a lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::model::IssueId;

/// Registry of per-issue locks.
#[derive(Debug, Default)]
pub struct IssueLocks {
    slots: Mutex<HashMap<IssueId, Arc<Mutex<()>>>>,
}

impl IssueLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `id`.
    ///
    /// The slot is released even if `f` panics.
    pub fn with_lock<T>(&self, id: IssueId, f: impl FnOnce() -> T) -> T {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(id).or_default())
        };
        let release = Release {
            locks: self,
            id,
            slot,
        };

        // The guarded value is `()`, so a poisoned lock carries no torn state.
        let _guard = release.slot.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Number of issues with a live lock.
    #[must_use]
    pub fn active(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Drops an issue's slot once its last user is done with it.
struct Release<'a> {
    locks: &'a IssueLocks,
    id: IssueId,
    slot: Arc<Mutex<()>>,
}

impl Drop for Release<'_> {
    fn drop(&mut self) {
        let mut slots = self
            .locks
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Only the map and this release still reference the slot.
        if slots
            .get(&self.id)
            .is_some_and(|s| Arc::ptr_eq(s, &self.slot) && Arc::strong_count(s) == 2)
        {
            slots.remove(&self.id);
        }
    }
}
