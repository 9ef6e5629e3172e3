//! Command routing and execution

use anyhow::Result;
use std::path::Path;

use crate::cli::args::Commands;
use crate::cli::commands::*;
use crate::cli::context::CommandContext;

/// Execute a CLI command based on the parsed arguments
pub async fn execute_command(command: Commands, config: Option<&Path>) -> Result<()> {
    let ctx = CommandContext::load(config).await?;
    match command {
        Commands::Port { command } => run_port_command(&ctx, command).await,
        Commands::Resolve { identifier, repo } => {
            run_resolve_command(&ctx, identifier, repo).await
        }
        Commands::Cleanup { command } => run_cleanup_command(&ctx, command).await,
    }
}
