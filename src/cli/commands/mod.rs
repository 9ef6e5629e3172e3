//! Command implementation modules
//!
//! Each top-level subcommand is implemented in its own module.

pub mod cleanup;
pub mod port;
pub mod resolve;

pub use cleanup::run_cleanup_command;
pub use port::run_port_command;
pub use resolve::run_resolve_command;
