//! # ocdc
//!
//! Lifecycle engine for parallel devcontainer workspaces: each workspace
//! gets a unique host port, can be found again by branch name, and is torn
//! down after its pull request or issue is finished.
//!
//! ## Usage
//!
//! ```bash
//! ocdc port allocate <path> --repo <repo> --branch <branch>
//! ocdc resolve <branch> [--repo <repo>]
//! ocdc cleanup sweep
//! ```
//!
//! ## Modules
//!
//! - `abstractions` - Trait-based abstractions for docker, git, tmux and the issue tracker
//! - `cleanup` - Delayed cleanup queue, action executor and sweeper
//! - `cli` - Argument parsing and command handlers for the `ocdc` binary
//! - `config` - Configuration loading (YAML file plus `OCDC_*` environment overrides)
//! - `error` - Error types with numeric codes
//! - `ports` - Port allocation for workspaces
//! - `storage` - Cross-process file locks and lock-protected JSON state
//! - `subprocess` - Unified subprocess abstraction layer for testing
//! - `workspace` - Resolution of bare identifiers to tracked workspaces
pub mod abstractions;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod error;
pub mod ports;
pub mod storage;
pub mod subprocess;
pub mod workspace;

pub use error::{OcdcError, OcdcResult};
