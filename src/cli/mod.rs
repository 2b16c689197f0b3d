//! Command-line interface for `multiprojects_issue`.
//!
//! This module provides the CLI parsing and command routing using clap.

pub mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::config::CliOverrides;
use crate::logging;

/// `multiprojects_issue` (mpi) - associate issues with several projects.
#[derive(Parser, Debug)]
#[command(name = "mpi")]
#[command(
    author,
    version,
    about = "Associate one issue with several projects",
    long_about = None,
    after_help = "Data lives in a JSON snapshot; journal entries append to JSONL."
)]
pub struct Cli {
    /// Workspace directory (default: .mpi)
    #[arg(long, global = true, env = "MPI_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Config file (default: <workspace>/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format: text (default) or json
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    #[must_use]
    pub fn overrides(&self) -> CliOverrides {
        let notifiable_permission = match &self.command {
            Some(Commands::Recipients(args)) => args.permission.clone(),
            _ => None,
        };
        CliOverrides {
            workspace: self.workspace.clone(),
            config: self.config.clone(),
            notifiable_permission,
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a workspace
    Init(InitArgs),

    /// Create a new issue
    Create(CreateArgs),

    /// Update an issue and its associated projects
    Update(UpdateArgs),

    /// Check whether a user may act on an issue
    Can(CanArgs),

    /// List users notified about an issue
    Recipients(RecipientsArgs),

    /// Show issue details
    Show(IssueArg),

    /// Show an issue's journal
    Journal(IssueArg),

    /// Show version information
    Version,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing snapshot
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Issue subject
    #[arg(long)]
    pub subject: String,

    /// Primary project
    #[arg(long)]
    pub project: String,

    /// Associated projects (comma-separated)
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub projects: Vec<String>,

    /// Status (default: new)
    #[arg(long)]
    pub status: Option<String>,

    /// Priority (default: normal)
    #[arg(long)]
    pub priority: Option<String>,

    /// Assignee user id
    #[arg(long)]
    pub assignee: Option<String>,

    /// Custom field value as ID=VALUE (repeatable)
    #[arg(long = "field")]
    pub fields: Vec<String>,

    /// Only the primary project grants edit and notes
    #[arg(long)]
    pub primary_answers_only: bool,

    /// Acting user
    #[arg(long)]
    pub actor: String,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Issue id
    pub issue: String,

    /// Replace associated projects (comma-separated; empty keeps the primary only)
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub projects: Option<Vec<String>>,

    /// New subject
    #[arg(long)]
    pub subject: Option<String>,

    /// New status
    #[arg(long)]
    pub status: Option<String>,

    /// New priority
    #[arg(long)]
    pub priority: Option<String>,

    /// New assignee user id, or "none" to unassign
    #[arg(long)]
    pub assignee: Option<String>,

    /// Whether secondary projects grant edit and notes (true/false)
    #[arg(long)]
    pub answers_on_secondary_projects: Option<bool>,

    /// Notes to add
    #[arg(long)]
    pub notes: Option<String>,

    /// Acting user
    #[arg(long)]
    pub actor: String,
}

#[derive(Args, Debug)]
pub struct CanArgs {
    /// User id
    pub user: String,

    /// Issue id
    pub issue: String,

    /// Action: view, edit or add_notes
    pub action: String,
}

#[derive(Args, Debug)]
pub struct RecipientsArgs {
    /// Issue id
    pub issue: String,

    /// Permission recipients must hold (default from config)
    #[arg(long)]
    pub permission: Option<String>,
}

#[derive(Args, Debug)]
pub struct IssueArg {
    /// Issue id
    pub issue: String,
}

/// Run the CLI.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet, cli.json)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    let overrides = cli.overrides();
    let json = cli.json;
    match cli.command {
        Some(Commands::Init(args)) => commands::init::execute(&overrides, &args, json),
        Some(Commands::Create(args)) => commands::create::execute(&overrides, &args, json),
        Some(Commands::Update(args)) => commands::update::execute(&overrides, &args, json),
        Some(Commands::Can(args)) => commands::can::execute(&overrides, &args, json),
        Some(Commands::Recipients(args)) => commands::recipients::execute(&overrides, &args, json),
        Some(Commands::Show(args)) => commands::show::execute(&overrides, &args.issue, json),
        Some(Commands::Journal(args)) => commands::journal::execute(&overrides, &args.issue, json),
        Some(Commands::Version) => {
            commands::version::execute(json);
            Ok(())
        }
        None => {
            println!("mpi - multi-project issues. Use --help for usage.");
            Ok(())
        }
    }
}
