//! Port command implementation

use anyhow::{Context, Result};

use crate::cli::args::PortCommands;
use crate::cli::context::CommandContext;
use crate::ports::{TrackedWorkspace, WorkspaceMeta};

/// Execute port-related commands
pub async fn run_port_command(ctx: &CommandContext, command: PortCommands) -> Result<()> {
    match command {
        PortCommands::Allocate { path, repo, branch } => {
            let assignment = ctx
                .ports
                .allocate(&path, WorkspaceMeta::new(repo, branch))
                .await
                .with_context(|| format!("Failed to allocate a port for {}", path.display()))?;
            println!("{}", assignment.port);
        }
        PortCommands::Release { path } => {
            if ctx.ports.release(&path).await? {
                println!("Released port for {}", path.display());
            } else {
                println!("No port assigned to {}", path.display());
            }
        }
        PortCommands::List { json } => {
            let tracked = ctx.ports.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tracked)?);
            } else {
                print_table(&tracked);
            }
        }
    }
    Ok(())
}

fn print_table(tracked: &[TrackedWorkspace]) {
    if tracked.is_empty() {
        println!("No workspaces have ports assigned");
        return;
    }

    println!("{:<6} {:<20} {:<24} PATH", "PORT", "REPO", "BRANCH");
    for entry in tracked {
        println!(
            "{:<6} {:<20} {:<24} {}",
            entry.assignment.port,
            entry.assignment.repo,
            entry.assignment.branch,
            entry.path.display()
        );
    }
}
