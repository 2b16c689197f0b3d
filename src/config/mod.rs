//! Configuration management for `multiprojects_issue`.
//!
//! Configuration is loaded from YAML with support for:
//! - Workspace config (.mpi/config.yaml)
//! - An explicit `--config` path
//! - Environment variable overrides
//! - CLI overrides (highest precedence)

use std::fs;
use std::path::{Path, PathBuf};

use multiprojects_lib::DetailOrder;
use multiprojects_lib::association::DEFAULT_NOTIFIABLE_PERMISSION;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default workspace directory name.
pub const WORKSPACE_DIR: &str = ".mpi";
/// Config file name inside the workspace.
pub const CONFIG_FILE: &str = "config.yaml";

/// Environment variable overriding `notifiable_permission`.
pub const ENV_NOTIFIABLE_PERMISSION: &str = "MPI_NOTIFIABLE_PERMISSION";
/// Environment variable overriding `detail_order`.
pub const ENV_DETAIL_ORDER: &str = "MPI_DETAIL_ORDER";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Workspace settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Custom fields shown alongside an issue's associated projects.
    pub custom_field_ids: Vec<u32>,
    /// Permission a member needs to be notified.
    pub notifiable_permission: String,
    /// Whether project additions or removals are journaled first.
    pub detail_order: DetailOrder,
    /// Snapshot of projects, users, memberships and issues.
    pub data_path: PathBuf,
    /// Append-only journal.
    pub journal_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            custom_field_ids: Vec::new(),
            notifiable_permission: DEFAULT_NOTIFIABLE_PERMISSION.to_string(),
            detail_order: DetailOrder::default(),
            data_path: PathBuf::from("data.json"),
            journal_path: PathBuf::from("journal.jsonl"),
        }
    }
}

/// Overrides collected from the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub workspace: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub notifiable_permission: Option<String>,
}

impl Settings {
    /// Parse settings from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `Parse` if the YAML does not match the settings schema.
    pub fn from_yaml(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let blank = text.lines().all(|line| {
            let line = line.trim();
            line.is_empty() || line.starts_with('#')
        });
        if blank {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load settings from `path`, falling back to defaults if it is missing.
    ///
    /// # Errors
    ///
    /// Returns `Read` or `Parse` if the file exists but cannot be used.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_yaml(path, &text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}; using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` if an override cannot be parsed.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(permission) = lookup(ENV_NOTIFIABLE_PERMISSION) {
            let permission = permission.trim();
            if !permission.is_empty() {
                self.notifiable_permission = permission.to_string();
            }
        }
        if let Some(order) = lookup(ENV_DETAIL_ORDER) {
            self.detail_order = order.parse().map_err(|e: multiprojects_lib::MultiprojectError| {
                ConfigError::InvalidValue {
                    key: ENV_DETAIL_ORDER.to_string(),
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(())
    }

    /// Whether a custom field is shared across associated projects.
    #[must_use]
    pub fn is_cross_project_field(&self, field_id: u32) -> bool {
        self.custom_field_ids.contains(&field_id)
    }
}

/// Resolved workspace: root directory plus effective settings.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub settings: Settings,
}

impl Workspace {
    /// Resolve the workspace and its settings: file, then environment,
    /// then CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the config file or an override is invalid.
    pub fn resolve(overrides: &CliOverrides) -> Result<Self, ConfigError> {
        let root = overrides
            .workspace
            .clone()
            .unwrap_or_else(|| PathBuf::from(WORKSPACE_DIR));
        let config_path = overrides
            .config
            .clone()
            .unwrap_or_else(|| root.join(CONFIG_FILE));

        let mut settings = Settings::load(&config_path)?;
        settings.apply_env(|key| std::env::var(key).ok())?;
        if let Some(permission) = &overrides.notifiable_permission {
            settings.notifiable_permission.clone_from(permission);
        }

        Ok(Self { root, settings })
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.root.join(&self.settings.data_path)
    }

    #[must_use]
    pub fn journal_path(&self) -> PathBuf {
        self.root.join(&self.settings.journal_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_missing() {
        let settings = Settings::load(Path::new("/nonexistent/config.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.notifiable_permission, "view_issues");
    }

    #[test]
    fn test_yaml_partial_keys() {
        let yaml = "custom_field_ids: [2, 7]\ndetail_order: removed_first\n";
        let settings = Settings::from_yaml(Path::new("config.yaml"), yaml).unwrap();
        assert_eq!(settings.custom_field_ids, vec![2, 7]);
        assert_eq!(settings.detail_order, DetailOrder::RemovedFirst);
        assert_eq!(settings.journal_path, PathBuf::from("journal.jsonl"));
        assert!(settings.is_cross_project_field(7));
        assert!(!settings.is_cross_project_field(3));
    }

    #[test]
    fn test_comment_only_yaml_is_default() {
        let settings =
            Settings::from_yaml(Path::new("config.yaml"), "# detail_order: added_first\n").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_yaml_invalid() {
        let err = Settings::from_yaml(Path::new("config.yaml"), "custom_field_ids: nope").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_NOTIFIABLE_PERMISSION, "view_private_notes"),
            (ENV_DETAIL_ORDER, "removed_first"),
        ]);
        let mut settings = Settings::default();
        settings
            .apply_env(|key| env.get(key).map(ToString::to_string))
            .unwrap();
        assert_eq!(settings.notifiable_permission, "view_private_notes");
        assert_eq!(settings.detail_order, DetailOrder::RemovedFirst);
    }

    #[test]
    fn test_bad_env_order_rejected() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(|key| (key == ENV_DETAIL_ORDER).then(|| "sideways".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_workspace_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "data_path: fixtures.json\n").unwrap();
        let ws = Workspace::resolve(&CliOverrides {
            workspace: Some(dir.path().to_path_buf()),
            notifiable_permission: Some("edit_issues".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(ws.data_path(), dir.path().join("fixtures.json"));
        assert_eq!(ws.journal_path(), dir.path().join("journal.jsonl"));
        assert_eq!(ws.settings.notifiable_permission, "edit_issues");
    }
}
