//! Resolve command implementation

use anyhow::{anyhow, Result};

use crate::cli::context::CommandContext;
use crate::workspace::{Resolution, WorkspaceResolver};

/// Print the workspace path for `identifier`
pub async fn run_resolve_command(
    ctx: &CommandContext,
    identifier: String,
    repo: Option<String>,
) -> Result<()> {
    let resolver = WorkspaceResolver::new(&ctx.ports);
    match resolver.resolve(&identifier, repo.as_deref()).await? {
        Resolution::Found(workspace) => {
            println!("{}", workspace.path.display());
            Ok(())
        }
        Resolution::NotFound => Err(anyhow!("No workspace matches '{identifier}'")),
        Resolution::Ambiguous(paths) => {
            let listing = paths
                .iter()
                .map(|p| format!("  {}", p.display()))
                .collect::<Vec<_>>()
                .join("\n");
            Err(anyhow!(
                "'{identifier}' matches several workspaces; pass --repo or a full path:\n{listing}"
            ))
        }
    }
}
