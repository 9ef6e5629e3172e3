//! Workspace lookup by user-facing identifiers

pub mod resolver;


pub use resolver::{Resolution, WorkspaceResolver};
