//! Error types for `multiprojects-lib`.
//!
//! Validation errors are raised before any state change. Errors that occur
//! after a project set has been committed (journal writes, recipient
//! resolution, delivery) are reported alongside the committed result rather
//! than returned as `Err`.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::{IssueId, ProjectId};

/// Primary error type for multiprojects-lib operations.
#[derive(Error, Debug)]
pub enum MultiprojectError {
    // === Issue Errors ===
    /// Issue with the specified ID was not found.
    #[error("Issue not found: {id}")]
    IssueNotFound { id: IssueId },

    /// Attempted to create an issue with an ID that already exists.
    #[error("Issue ID collision: {id}")]
    IdCollision { id: IssueId },

    // === Project Set Errors ===
    /// Requested project set is empty after normalization or names
    /// projects that do not exist.
    #[error("Invalid project set: {reason}")]
    InvalidProjectSet { reason: String },

    /// The issue's primary project is gone from the project directory.
    #[error("Primary project {project_id} of issue {issue_id} no longer exists")]
    PrimaryProjectMissingFromStore {
        issue_id: IssueId,
        project_id: ProjectId,
    },

    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Invalid status value.
    #[error("Invalid status: {status}")]
    InvalidStatus { status: String },

    /// Invalid priority value.
    #[error("Invalid priority: {priority}")]
    InvalidPriority { priority: String },

    // === Collaborator Errors ===
    /// The permission oracle could not answer.
    #[error("Permission oracle unavailable: {0}")]
    OracleUnavailable(String),

    /// Appending a journal entry failed.
    #[error("Journal write failed: {0}")]
    JournalWriteFailed(String),

    /// Handing recipients to the mail transport failed.
    #[error("Notification delivery failed: {0}")]
    NotificationFailed(String),

    // === Configuration Errors ===
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    // === Storage Errors ===
    /// Generic storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// File not found at the specified path.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Failed to parse a line in a JSONL file.
    #[error("JSONL parse error at line {line}: {reason}")]
    JsonlParse { line: usize, reason: String },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MultiprojectError {
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn invalid_project_set(reason: impl Into<String>) -> Self {
        Self::InvalidProjectSet {
            reason: reason.into(),
        }
    }

    /// Whether the caller may retry the same request later.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::OracleUnavailable(_) | Self::JournalWriteFailed(_) | Self::NotificationFailed(_)
        )
    }
}

/// Result type using `MultiprojectError`.
pub type Result<T> = std::result::Result<T, MultiprojectError>;
