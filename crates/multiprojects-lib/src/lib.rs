//! `multiprojects-lib` - associate one issue with several projects.
//!
//! An issue keeps a single primary project and gains a set of associated
//! projects. This crate owns the behavior derived from that set: journaling
//! changes to it, notifying members of every associated project, and
//! authorizing users through any of them. Issues, projects, users and mail
//! stay with the host tracker and are reached through [`ports`].
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use multiprojects_lib::{AssociationManager, ManagerOptions, Services};
//! use multiprojects_lib::jsonl::load_snapshot;
//! use multiprojects_lib::model::{IssueId, UserId};
//! use multiprojects_lib::store::{InMemoryJournalStore, LogNotifier};
//!
//! let snapshot = load_snapshot(std::path::Path::new("data.json")).unwrap();
//! let (directory, issues) = snapshot.into_stores();
//! let directory = Arc::new(directory);
//! let manager = AssociationManager::new(
//!     Services {
//!         issues: Arc::new(issues),
//!         projects: directory.clone(),
//!         oracle: directory.clone(),
//!         users: directory,
//!         journal: Arc::new(InMemoryJournalStore::new()),
//!         notifier: Some(Arc::new(LogNotifier)),
//!     },
//!     ManagerOptions::default(),
//! );
//!
//! // Link project 5 to issue 1 on behalf of user 2.
//! let outcome = manager
//!     .apply_project_set(IssueId(1), &["1", "5"], UserId(2), &[])
//!     .unwrap();
//! assert!(outcome.journal.is_some());
//! ```

pub mod access;
pub mod association;
pub mod differ;
pub mod error;
pub mod journal;
pub mod jsonl;
pub mod locks;
pub mod model;
pub mod ports;
pub mod query;
pub mod recipients;
pub mod store;

pub use access::AccessGate;
pub use association::{AssociationManager, ManagerOptions, Services, UpdateOutcome};
pub use differ::{ProjectSetDiff, diff};
pub use error::{MultiprojectError, Result};
pub use journal::{DetailOrder, JournalRecorder};
pub use model::{Action, Issue, IssueId, JournalDetail, JournalEntry, ProjectId, UserId};
pub use query::{IssueUpdate, NewIssue};
pub use recipients::RecipientResolver;
