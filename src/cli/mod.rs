//! CLI command handlers
//!
//! Argument parsing, collaborator wiring and one handler module per
//! subcommand.

pub mod args;
pub mod commands;
pub mod context;
pub mod help;
pub mod router;

pub use args::{Cli, Commands};
pub use context::CommandContext;
pub use help::get_log_level;
pub use router::execute_command;
