//! Subprocess abstraction used by the collaborator adapters
//!
//! Everything that shells out (docker, git, tmux, gh) goes through a
//! [`ProcessRunner`] so tests can script the external tools with
//! [`MockProcessRunner`].

pub mod error;
pub mod mock;
pub mod runner;

pub use error::ProcessError;
pub use mock::{MockProcessRunner, RuleBuilder};
pub use runner::{ExitStatus, ProcessCommand, ProcessOutput, ProcessRunner, TokioProcessRunner};

use std::sync::Arc;

/// Shared handle to the process runner used by all adapters
#[derive(Clone)]
pub struct SubprocessManager {
    runner: Arc<dyn ProcessRunner>,
}

impl SubprocessManager {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    pub fn production() -> Self {
        Self::new(Arc::new(TokioProcessRunner))
    }

    /// Manager backed by a scripted runner, plus the handle to script it
    pub fn mock() -> (Self, MockProcessRunner) {
        let mock = MockProcessRunner::new();
        (Self::new(Arc::new(mock.clone())), mock)
    }

    pub async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        self.runner.run(command).await
    }
}
