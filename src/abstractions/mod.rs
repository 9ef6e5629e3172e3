//! Abstraction layers for external collaborators
//!
//! The lifecycle engine never talks to docker, git, tmux or GitHub directly.
//! It goes through these traits so tests can substitute in-memory mocks and
//! the real adapters can be driven by a scripted [`crate::subprocess::MockProcessRunner`].

pub mod container;
pub mod git;
pub mod session;
pub mod work_item;

pub use container::{ContainerLifecycle, DockerContainers, MockContainers};
pub use git::{GitCli, GitStatus, MockGitStatus};
pub use session::{MockSessions, SessionManager, Tmux};
pub use work_item::{GhCli, MockWorkItemState, StateCheck, WorkItemState};
