//! Cleanup command implementation

use anyhow::{Context, Result};

use crate::cleanup::{CleanupCandidate, CleanupQueueItem, CleanupRequest};
use crate::cli::args::{CleanupCommands, WorkspaceArgs};
use crate::cli::context::CommandContext;
use crate::ports::canonical_path;

/// Execute cleanup-queue commands
pub async fn run_cleanup_command(ctx: &CommandContext, command: CleanupCommands) -> Result<()> {
    match command {
        CleanupCommands::Add {
            key,
            reason,
            workspace,
            delay,
        } => {
            let delay = delay.unwrap_or_else(|| ctx.config.cleanup.delay.clone());
            let request = CleanupRequest {
                key: key.clone(),
                poll_id: workspace.poll_id,
                reason,
                tmux_session: workspace.session,
                clone_path: canonical_path(&workspace.clone_path),
                source_url: workspace.source_url,
                source_type: workspace.source_type,
            };
            if ctx.queue.add(request, &delay).await? {
                println!("Queued cleanup for {key}");
            } else {
                println!("Cleanup for {key} is already queued");
            }
        }
        CleanupCommands::Remove { key } => {
            if ctx.queue.remove(&key).await? {
                println!("Removed {key} from the cleanup queue");
            } else {
                println!("{key} is not queued");
            }
        }
        CleanupCommands::List { json } => {
            print_items(&ctx.queue.list().await?, json)?;
        }
        CleanupCommands::Ready { json } => {
            print_items(&ctx.queue.get_ready().await?, json)?;
        }
        CleanupCommands::Check { key, workspace } => {
            let candidate = to_candidate(key.clone(), workspace);
            match ctx
                .sweeper()
                .evaluate(candidate, &ctx.config.cleanup)
                .await
                .with_context(|| format!("Failed to check {key}"))?
            {
                Some(true) => println!("Queued cleanup for {key}"),
                Some(false) => println!("Cleanup for {key} is already queued"),
                None => println!("{key} does not need cleanup"),
            }
        }
        CleanupCommands::Sweep { actions, json } => {
            let actions = if actions.is_empty() {
                ctx.config.cleanup.actions.clone()
            } else {
                actions
            };
            let summary = ctx.sweeper().sweep(&actions).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "Processed {} item(s): {} removed, {} kept, {} action failure(s)",
                    summary.processed, summary.removed, summary.retained, summary.action_failures
                );
            }
        }
    }
    Ok(())
}

fn to_candidate(key: String, workspace: WorkspaceArgs) -> CleanupCandidate {
    CleanupCandidate {
        key,
        poll_id: workspace.poll_id,
        tmux_session: workspace.session,
        clone_path: canonical_path(&workspace.clone_path),
        source_url: workspace.source_url,
        source_type: workspace.source_type,
    }
}

fn print_items(items: &[CleanupQueueItem], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("Cleanup queue is empty");
        return Ok(());
    }

    for item in items {
        println!(
            "{}\t{}\t{}\t{}",
            item.key,
            item.reason,
            item.cleanup_after.to_rfc3339(),
            item.clone_path.display()
        );
    }
    Ok(())
}
