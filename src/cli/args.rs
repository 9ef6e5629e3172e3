//! CLI argument structures

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cleanup::CleanupAction;

/// Ports, name resolution and cleanup for parallel devcontainer workspaces
#[derive(Parser)]
#[command(name = "ocdc")]
#[command(about = "ocdc - Manage ports and cleanup for parallel devcontainer workspaces", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file (default: ~/.config/ocdc/config.yaml)
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage workspace port assignments
    Port {
        #[command(subcommand)]
        command: PortCommands,
    },
    /// Print the workspace path for a branch name or path
    Resolve {
        /// Branch name or absolute workspace path
        identifier: String,

        /// Only consider workspaces of this repository
        #[arg(long)]
        repo: Option<String>,
    },
    /// Manage the delayed cleanup queue
    Cleanup {
        #[command(subcommand)]
        command: CleanupCommands,
    },
}

#[derive(Subcommand)]
pub enum PortCommands {
    /// Assign a port to a workspace (prints the existing one if already assigned)
    Allocate {
        /// Workspace directory
        path: PathBuf,

        #[arg(long)]
        repo: String,

        #[arg(long)]
        branch: String,
    },
    /// Release a workspace's port
    Release {
        /// Workspace directory
        path: PathBuf,
    },
    /// List port assignments
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Fields shared by `cleanup add` and `cleanup check`
#[derive(clap::Args, Debug, Clone)]
pub struct WorkspaceArgs {
    /// Poll configuration that created the workspace
    #[arg(long, default_value = "")]
    pub poll_id: String,

    /// tmux session attached to the workspace
    #[arg(long, default_value = "")]
    pub session: String,

    /// Clone directory of the workspace
    #[arg(long)]
    pub clone_path: PathBuf,

    /// URL of the pull request or issue
    #[arg(long, default_value = "")]
    pub source_url: String,

    /// Source type (github_pr, github_issue, ...)
    #[arg(long, default_value = "")]
    pub source_type: String,
}

#[derive(Subcommand)]
pub enum CleanupCommands {
    /// Queue a workspace for cleanup
    Add {
        /// Unique key, e.g. "api-pr-12"
        key: String,

        /// Why the workspace is being cleaned up (merged, closed, ...)
        #[arg(long)]
        reason: String,

        #[command(flatten)]
        workspace: WorkspaceArgs,

        /// Delay before cleanup (30s, 5m, 2h; bare numbers are minutes)
        #[arg(long)]
        delay: Option<String>,
    },
    /// Remove a queued cleanup
    Remove { key: String },
    /// List queued cleanups
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List cleanups whose delay has elapsed
    Ready {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check the work item's state and queue the workspace if it is finished
    Check {
        key: String,

        #[command(flatten)]
        workspace: WorkspaceArgs,
    },
    /// Run cleanup actions for every ready item
    Sweep {
        /// Actions to run instead of the configured ones
        #[arg(long = "action", value_name = "ACTION", value_delimiter = ',')]
        actions: Vec<CleanupAction>,

        /// Output the summary as JSON
        #[arg(long)]
        json: bool,
    },
}
