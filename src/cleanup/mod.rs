//! Delayed teardown of finished workspaces
//!
//! A workspace whose pull request or issue is finished is put on the
//! cleanup queue with a delay. A later sweep picks up ready items and runs
//! the configured [`CleanupAction`]s through the [`CleanupExecutor`].

pub mod action;
pub mod config;
pub mod delay;
pub mod executor;
pub mod queue;
pub mod sweep;

pub use action::{CleanupAction, CleanupReason};
pub use config::CleanupConfig;
pub use delay::{parse_delay, parse_delay_secs, DEFAULT_DELAY_SECS};
pub use executor::{ActionOutcome, ActionResult, CleanupExecutor, CleanupReport};
pub use queue::{CleanupQueue, CleanupQueueFile, CleanupQueueItem, CleanupRequest};
pub use sweep::{CleanupCandidate, CleanupSweeper, SweepSummary};
