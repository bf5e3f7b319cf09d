//! Collaborator traits
//!
//! These traits keep the reconciliation core independent of any particular
//! remote service, configuration format or terminal UI.

use crate::error::SubmitError;
use crate::types::{Action, DesiredItem, ExistingItem, TaskOutcome};
use anyhow::Result;
use std::collections::BTreeMap;

/// Transport for remote mutations
///
/// Implementations must be safe to call from several worker threads at once
/// and must classify every failure as retryable or terminal.
pub trait RemoteClient: Send + Sync {
    /// Opaque capability needed to delete an existing item
    type Handle: Clone + Send + Sync + 'static;

    /// Add an item, returning the identifier it was stored under
    fn add(&self, item: &DesiredItem) -> Result<String, SubmitError>;

    /// Delete the item the handle refers to
    fn remove(&self, handle: &Self::Handle) -> Result<(), SubmitError>;
}

/// Source of the remote system's current inventory
pub trait SnapshotProvider {
    type Handle;

    /// Fetch every existing item in one round trip.
    ///
    /// A partial inventory is never returned; any failure fails the fetch.
    fn fetch(&self) -> Result<Vec<ExistingItem<Self::Handle>>>;
}

/// Endpoint and request headers shared read-only by every task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub endpoint: String,
    pub headers: Vec<(String, String)>,
}

impl Session {
    /// Look up a header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Produces an authenticated session; may prompt interactively
pub trait Authenticator {
    fn obtain_session(&self) -> Result<Session>;
}

/// Key/value settings for one profile
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<&str>;
}

impl ConfigSource for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        BTreeMap::get(self, key).map(String::as_str)
    }
}

/// Progress callback for scheduled phases
///
/// Called on the orchestrating thread only, so implementations need not be
/// thread-safe.
pub trait ProgressCallback {
    /// Called before a phase dispatches its tasks
    fn on_phase_start(&mut self, action: Action, total: usize);

    /// Called as each task completes, in completion order
    fn on_task_complete(&mut self, outcome: &TaskOutcome);

    /// Called after the final barrier of a phase
    fn on_phase_complete(&mut self, action: Action);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_phase_start(&mut self, _action: Action, _total: usize) {}
    fn on_task_complete(&mut self, _outcome: &TaskOutcome) {}
    fn on_phase_complete(&mut self, _action: Action) {}
}
