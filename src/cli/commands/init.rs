//! Init command implementation.

use std::fs;

use anyhow::{Context, Result};
use multiprojects_lib::jsonl::{Snapshot, save_snapshot};

use super::{lock_workspace, print_json};
use crate::cli::InitArgs;
use crate::config::{CONFIG_FILE, CliOverrides, WORKSPACE_DIR};

const CONFIG_TEMPLATE: &str = r"# Multi-project issue settings
# custom_field_ids: []
# notifiable_permission: view_issues
# detail_order: added_first
# data_path: data.json
# journal_path: journal.jsonl
";

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the workspace already holds a snapshot (without
/// `--force`) or files cannot be written.
pub fn execute(overrides: &CliOverrides, args: &InitArgs, json: bool) -> Result<()> {
    let root = overrides
        .workspace
        .clone()
        .unwrap_or_else(|| WORKSPACE_DIR.into());
    fs::create_dir_all(&root).with_context(|| format!("creating {}", root.display()))?;
    let _lock = lock_workspace(&root)?;

    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        fs::write(&config_path, CONFIG_TEMPLATE)
            .with_context(|| format!("writing {}", config_path.display()))?;
    }

    let workspace = crate::config::Workspace::resolve(overrides)?;
    let data_path = workspace.data_path();
    if data_path.exists() && !args.force {
        anyhow::bail!(
            "workspace already initialized at {} (use --force to reset)",
            data_path.display()
        );
    }
    save_snapshot(&data_path, &Snapshot::default())?;
    tracing::info!(path = %data_path.display(), "Snapshot initialized");

    if json {
        print_json(&serde_json::json!({
            "workspace": root,
            "data_path": data_path,
            "journal_path": workspace.journal_path(),
        }))
    } else {
        println!("Initialized workspace in {}", root.display());
        Ok(())
    }
}
