//! Command implementations.
//!
//! Every command opens the workspace through [`Session`], which stands the
//! JSON snapshot and JSONL journal up as the host services the association
//! manager expects.

pub mod can;
pub mod create;
pub mod init;
pub mod journal;
pub mod recipients;
pub mod show;
pub mod update;
pub mod version;

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use fs2::FileExt;
use multiprojects_lib::jsonl::{JsonlJournalStore, SnapshotIssueStore};
use multiprojects_lib::model::{IssueId, UserId};
use multiprojects_lib::store::{InMemoryDirectory, LogNotifier};
use multiprojects_lib::{AssociationManager, ManagerOptions, MultiprojectError, Services};
use serde::Serialize;

use crate::config::{CliOverrides, Workspace};

/// Lock file guarding a workspace against concurrent `mpi` processes.
pub const LOCK_FILE: &str = ".lock";

/// An opened workspace.
///
/// The session holds an exclusive lock on the workspace until it is dropped.
/// Every issue change is written to the snapshot before it is journaled.
pub struct Session {
    pub workspace: Workspace,
    pub directory: Arc<InMemoryDirectory>,
    pub issues: Arc<SnapshotIssueStore>,
    pub manager: AssociationManager,
    _lock: File,
}

impl Session {
    /// Lock the workspace, then load the snapshot and journal.
    ///
    /// Blocks while another session holds the workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid, the workspace was never
    /// initialized, or the snapshot or journal cannot be parsed.
    pub fn open(overrides: &CliOverrides) -> Result<Self> {
        let workspace = Workspace::resolve(overrides)?;
        if !workspace.root.is_dir() {
            anyhow::bail!(
                "no workspace at {}; run `mpi init` first",
                workspace.root.display()
            );
        }
        let lock = lock_workspace(&workspace.root)?;

        let data_path = workspace.data_path();
        let issues = match SnapshotIssueStore::open(&data_path) {
            Ok(issues) => Arc::new(issues),
            Err(MultiprojectError::FileNotFound(path)) => {
                anyhow::bail!(
                    "no snapshot at {}; run `mpi init` first",
                    path.display()
                )
            }
            Err(e) => {
                return Err(e).with_context(|| format!("loading {}", data_path.display()));
            }
        };
        let directory = issues.directory().clone();
        let journal = JsonlJournalStore::open(workspace.journal_path())
            .with_context(|| format!("opening {}", workspace.journal_path().display()))?;

        let manager = AssociationManager::new(
            Services {
                issues: issues.clone(),
                projects: directory.clone(),
                oracle: directory.clone(),
                users: directory.clone(),
                journal: Arc::new(journal),
                notifier: Some(Arc::new(LogNotifier)),
            },
            ManagerOptions {
                notifiable_permission: workspace.settings.notifiable_permission.clone(),
                detail_order: workspace.settings.detail_order,
            },
        );
        tracing::debug!(
            root = %workspace.root.display(),
            issues = issues.issues().len(),
            "Workspace opened"
        );

        Ok(Self {
            workspace,
            directory,
            issues,
            manager,
            _lock: lock,
        })
    }
}

/// Take the exclusive workspace lock, waiting for any other holder.
///
/// # Errors
///
/// Returns an error if the lock file cannot be opened or locked.
pub(crate) fn lock_workspace(root: &Path) -> Result<File> {
    let path = root.join(LOCK_FILE);
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&path)
        .with_context(|| format!("opening {}", path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("locking {}", path.display()))?;
    tracing::trace!(path = %path.display(), "Workspace locked");
    Ok(file)
}

pub(crate) fn parse_issue(raw: &str) -> Result<IssueId> {
    raw.parse::<IssueId>()
        .with_context(|| format!("invalid issue id {raw:?}"))
}

pub(crate) fn parse_user(raw: &str) -> Result<UserId> {
    raw.parse::<UserId>()
        .with_context(|| format!("invalid user id {raw:?}"))
}

/// Parse an assignee flag; `none` (or empty) unassigns.
pub(crate) fn parse_assignee(raw: &str) -> Result<Option<UserId>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        Ok(None)
    } else {
        parse_user(trimmed).map(Some)
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
