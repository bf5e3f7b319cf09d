//! # Reconcile
//!
//! Inventory reconciliation: compare a declared set of items against what a
//! remote system currently holds, then remove and add items through that
//! system with bounded concurrency and per-item retry.
//!
//! ## Core Concepts
//!
//! - **DesiredItem**: expanded from numbered configuration entries by [`expand`]
//! - **ExistingItem**: one row of the remote snapshot, carrying an opaque removal handle
//! - **ReconciliationPlan**: what to remove and what to add for one run
//! - **ReliableSubmitter**: one remote mutation wrapped in classified retry
//! - **BoundedScheduler**: fill-to-limit, replace-on-first-completion executor
//! - **Orchestrator**: removal phase, then addition phase, with per-item outcomes
//!
//! ## Example
//!
//! ```ignore
//! use reconcile::{
//!     expand, removal_ids, NoProgress, Orchestrator, ReliableSubmitter, RetryConfig,
//!     SyncOptions,
//! };
//!
//! let desired = expand(1, 3, &settings)?;
//! let removal = removal_ids(1, 3, &settings);
//!
//! let submitter = ReliableSubmitter::new(client.clone(), RetryConfig::default());
//! let report = Orchestrator::new(submitter).run(
//!     client.as_ref(),
//!     &desired,
//!     &removal,
//!     &SyncOptions { upload: true, ..Default::default() },
//!     &mut NoProgress,
//! )?;
//! println!("{} uploaded", report.summary().uploaded.len());
//! ```
//!
//! ## Provider Traits
//!
//! - [`RemoteClient`]: performs adds and removes, classifying failures
//! - [`SnapshotProvider`]: fetches the current inventory in one round trip
//! - [`Authenticator`]: produces the shared [`Session`]
//! - [`ConfigSource`]: key/value lookups for range expansion
//! - [`ProgressCallback`]: receives per-task completions
//! - [`RetryPolicy`] / [`RetryCallback`]: attempt ceiling, backoff and classification

pub mod context;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod planner;
pub mod resolver;
pub mod retry;
pub mod types;

// Re-export main types at crate root
pub use context::{
    Authenticator, ConfigSource, NoProgress, ProgressCallback, RemoteClient, Session,
    SnapshotProvider,
};
pub use error::{ConfigError, ErrorCategory, SubmitError};
pub use executor::{BoundedScheduler, Task};
pub use orchestrator::Orchestrator;
pub use planner::{KnownItems, ReconciliationPlan, compute_removals, compute_uploads};
pub use resolver::{expand, removal_ids};
pub use retry::{
    LogCallback, NoCallback, ReliableSubmitter, RetryCallback, RetryConfig, RetryPolicy,
    with_retry,
};
pub use types::{
    Action, DesiredItem, ExistingItem, SyncOptions, SyncReport, SyncSummary, TaskOutcome,
    TaskResult,
};
