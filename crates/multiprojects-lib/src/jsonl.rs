//! File persistence: an append-only JSONL journal and a JSON snapshot of
//! the directory and issues.

use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{MultiprojectError, Result};
use crate::model::{Issue, IssueId, JournalEntry, Member, Project, ProjectId, Role, User};
use crate::ports::{IssueStore, JournalStore};
use crate::store::{InMemoryDirectory, InMemoryIssueStore};

// ============================================================================
// Snapshot
// ============================================================================

/// Everything the CLI needs to stand in for a host tracker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl Snapshot {
    /// Split into the in-memory directory and issue store.
    #[must_use]
    pub fn into_stores(self) -> (InMemoryDirectory, InMemoryIssueStore) {
        let directory =
            InMemoryDirectory::from_parts(self.projects, self.users, self.roles, self.members);
        (directory, InMemoryIssueStore::from_issues(self.issues))
    }

    /// Reassemble a snapshot from the in-memory stores.
    #[must_use]
    pub fn from_stores(directory: &InMemoryDirectory, issues: &InMemoryIssueStore) -> Self {
        Self {
            projects: directory.projects().cloned().collect(),
            users: directory.users().cloned().collect(),
            roles: directory.roles().cloned().collect(),
            members: directory.members().to_vec(),
            issues: issues.all(),
        }
    }
}

fn open_existing(path: &Path) -> Result<fs::File> {
    fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MultiprojectError::FileNotFound(path.to_path_buf())
        } else {
            MultiprojectError::Io(e)
        }
    })
}

/// Load a snapshot from a JSON file.
///
/// # Errors
///
/// Returns `FileNotFound` if the file is missing, or `Json` if it is invalid.
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let file = open_existing(path)?;
    let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;
    Ok(snapshot)
}

/// Save a snapshot with atomic write (write-to-temp + rename).
///
/// # Errors
///
/// Returns `Io` if the file cannot be written.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&tmp_path)?;
    serde_json::to_writer_pretty(&mut file, snapshot)?;
    writeln!(file)?;
    file.flush()?;
    drop(file);

    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Issue store that rewrites the snapshot on every change.
///
/// A change whose snapshot write fails is undone in memory and reported as
/// `Storage`, so callers never journal a change that was not persisted.
#[derive(Debug)]
pub struct SnapshotIssueStore {
    path: PathBuf,
    directory: Arc<InMemoryDirectory>,
    issues: InMemoryIssueStore,
    writing: Mutex<()>,
}

impl SnapshotIssueStore {
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        directory: Arc<InMemoryDirectory>,
        issues: InMemoryIssueStore,
    ) -> Self {
        Self {
            path: path.into(),
            directory,
            issues,
            writing: Mutex::new(()),
        }
    }

    /// Load the snapshot at `path` and serve its issues.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if the file is missing, or `Json` if it is invalid.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let (directory, issues) = load_snapshot(&path)?.into_stores();
        Ok(Self::new(path, Arc::new(directory), issues))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn directory(&self) -> &Arc<InMemoryDirectory> {
        &self.directory
    }

    #[must_use]
    pub fn issues(&self) -> &InMemoryIssueStore {
        &self.issues
    }

    fn commit<F>(&self, id: IssueId, change: F) -> Result<()>
    where
        F: FnOnce(&InMemoryIssueStore) -> Result<()>,
    {
        let _writing = self.writing.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = self.issues.load(id).ok();
        change(&self.issues)?;

        let snapshot = Snapshot::from_stores(&self.directory, &self.issues);
        if let Err(e) = save_snapshot(&self.path, &snapshot) {
            self.issues.restore(id, previous);
            tracing::error!(issue = %id, path = %self.path.display(), error = %e, "Snapshot write failed; change undone");
            return Err(MultiprojectError::Storage(format!(
                "cannot write {}: {e}",
                self.path.display()
            )));
        }
        Ok(())
    }
}

impl IssueStore for SnapshotIssueStore {
    fn load(&self, id: IssueId) -> Result<Issue> {
        self.issues.load(id)
    }

    fn insert(&self, issue: &Issue) -> Result<()> {
        self.commit(issue.id, |issues| issues.insert(issue))
    }

    fn save(&self, issue: &Issue) -> Result<()> {
        self.commit(issue.id, |issues| issues.save(issue))
    }

    fn save_associated_projects(&self, id: IssueId, projects: &BTreeSet<ProjectId>) -> Result<()> {
        self.commit(id, |issues| issues.save_associated_projects(id, projects))
    }

    fn next_id(&self) -> Result<IssueId> {
        self.issues.next_id()
    }
}

// ============================================================================
// Journal
// ============================================================================

/// Load every journal entry from a JSONL file, skipping blank lines.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read, or `JsonlParse` if any line is invalid.
pub fn load_journal(path: &Path) -> Result<Vec<JournalEntry>> {
    let reader = BufReader::new(open_existing(path)?);
    let mut entries = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let entry: JournalEntry =
            serde_json::from_str(trimmed).map_err(|e| MultiprojectError::JsonlParse {
                line: line_num + 1,
                reason: e.to_string(),
            })?;
        entries.push(entry);
    }

    Ok(entries)
}

/// Journal appended one JSON line per entry.
///
/// Entry ids continue from the highest id in the file at append time, so
/// stores opened one after another on the same file never reuse an id.
/// Writers in different processes must still be serialized by the caller.
#[derive(Debug)]
pub struct JsonlJournalStore {
    path: PathBuf,
    appending: Mutex<()>,
}

impl JsonlJournalStore {
    /// Open (or prepare to create) a journal file.
    ///
    /// # Errors
    ///
    /// Returns `JsonlParse` if an existing file is corrupt.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            path: path.into(),
            appending: Mutex::new(()),
        };
        store.last_id()?;
        Ok(store)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn last_id(&self) -> Result<u64> {
        match load_journal(&self.path) {
            Ok(entries) => Ok(entries.iter().map(|e| e.id).max().unwrap_or(0)),
            Err(MultiprojectError::FileNotFound(_)) => Ok(0),
            Err(e) => Err(e),
        }
    }
}

impl JournalStore for JsonlJournalStore {
    fn append(&self, issue: IssueId, mut entry: JournalEntry) -> Result<JournalEntry> {
        let _appending = self.appending.lock().unwrap_or_else(PoisonError::into_inner);

        let mut write = || -> Result<()> {
            entry.id = self.last_id()? + 1;
            entry.issue_id = issue;
            let json = serde_json::to_string(&entry)?;
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            writeln!(file, "{json}")?;
            file.flush()?;
            Ok(())
        };
        write().map_err(|e| MultiprojectError::JournalWriteFailed(e.to_string()))?;

        Ok(entry)
    }

    fn entries_for(&self, issue: IssueId) -> Result<Vec<JournalEntry>> {
        match load_journal(&self.path) {
            Ok(entries) => Ok(entries.into_iter().filter(|e| e.issue_id == issue).collect()),
            Err(MultiprojectError::FileNotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}
