//! Core types for inventory reconciliation

use crate::error::SubmitError;
use std::fmt;

/// An item the configuration says should exist remotely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredItem {
    /// Unique identifier
    pub id: String,
    /// Where the item's content comes from, relative to the upload folder
    pub source_ref: String,
    /// Range position the item was expanded from
    pub position: i64,
}

/// An item observed in the remote inventory
///
/// `H` is the capability the remote client needs to delete the item. The
/// reconciliation core passes it through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingItem<H> {
    pub id: String,
    pub removal_handle: H,
}

/// Which remote mutation a task performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Add,
    Remove,
}

impl Action {
    /// Verb used in progress and log lines ("upload", "remove")
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Add => "upload",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Result of one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// The remote mutation was applied
    Succeeded,
    /// Dry run: the mutation would have been attempted
    WouldDo,
    /// The mutation failed; retryable failures only surface here when a
    /// task is run without the retry layer
    Failed(SubmitError),
}

impl TaskResult {
    /// Check if the result represents success (applied or would apply)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

impl From<Result<String, SubmitError>> for TaskResult {
    fn from(result: Result<String, SubmitError>) -> Self {
        match result {
            Ok(_) => Self::Succeeded,
            Err(e) => Self::Failed(e),
        }
    }
}

/// Outcome of one task, reported once per item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub id: String,
    pub action: Action,
    pub result: TaskResult,
}

/// Options for a sync run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Run the addition phase
    pub upload: bool,
    /// Run the removal phase
    pub remove: bool,
    /// Don't make changes, just report what would happen
    pub dry_run: bool,
    /// Concurrency ceiling for the addition phase
    pub threads: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            upload: false,
            remove: false,
            dry_run: false,
            threads: 4,
        }
    }
}

/// Outcomes of both phases of a sync run
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Number of items in the remote snapshot
    pub existing: usize,
    pub removals: Vec<TaskOutcome>,
    pub uploads: Vec<TaskOutcome>,
}

impl SyncReport {
    pub fn summary(&self) -> SyncSummary {
        let mut summary = SyncSummary::default();
        for outcome in self.removals.iter().chain(&self.uploads) {
            summary.add_outcome(outcome);
        }
        summary.sort();
        summary
    }
}

/// Final accounting of a sync run, by identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub removed: Vec<String>,
    pub uploaded: Vec<String>,
    pub would_remove: Vec<String>,
    pub would_upload: Vec<String>,
    /// (identifier, action, reason)
    pub failed: Vec<(String, Action, String)>,
}

impl SyncSummary {
    /// Add an outcome to the summary
    pub fn add_outcome(&mut self, outcome: &TaskOutcome) {
        let id = outcome.id.clone();
        match (&outcome.result, outcome.action) {
            (TaskResult::Succeeded, Action::Remove) => self.removed.push(id),
            (TaskResult::Succeeded, Action::Add) => self.uploaded.push(id),
            (TaskResult::WouldDo, Action::Remove) => self.would_remove.push(id),
            (TaskResult::WouldDo, Action::Add) => self.would_upload.push(id),
            (TaskResult::Failed(e), action) => self.failed.push((id, action, e.to_string())),
        }
    }

    fn sort(&mut self) {
        self.removed.sort();
        self.uploaded.sort();
        self.would_remove.sort();
        self.would_upload.sort();
        self.failed.sort_by(|a, b| a.0.cmp(&b.0));
    }

    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.removed.len() + self.uploaded.len()
    }

    /// Check if the run was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(id: &str, action: Action, result: TaskResult) -> TaskOutcome {
        TaskOutcome {
            id: id.to_string(),
            action,
            result,
        }
    }

    #[test]
    fn test_task_result_from_submit_result() {
        assert_eq!(
            TaskResult::from(Ok::<_, SubmitError>("party".to_string())),
            TaskResult::Succeeded
        );
        let failed = TaskResult::from(Err(SubmitError::terminal("bad image")));
        assert!(!failed.is_success());
    }

    #[test]
    fn test_would_do_counts_as_success() {
        assert!(TaskResult::WouldDo.is_success());
    }

    #[test]
    fn test_summary_sorts_and_buckets() {
        let report = SyncReport {
            existing: 3,
            removals: vec![
                outcome("zebra", Action::Remove, TaskResult::Succeeded),
                outcome("apple", Action::Remove, TaskResult::Succeeded),
            ],
            uploads: vec![
                outcome("kiwi", Action::Add, TaskResult::Succeeded),
                outcome(
                    "fig",
                    Action::Add,
                    TaskResult::Failed(SubmitError::terminal("HTTP 400")),
                ),
            ],
        };

        let summary = report.summary();
        assert_eq!(summary.removed, vec!["apple", "zebra"]);
        assert_eq!(summary.uploaded, vec!["kiwi"]);
        assert_eq!(
            summary.failed,
            vec![("fig".to_string(), Action::Add, "HTTP 400".to_string())]
        );
        assert_eq!(summary.total_changes(), 3);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_summary_dry_run_buckets() {
        let mut summary = SyncSummary::default();
        summary.add_outcome(&outcome("a", Action::Remove, TaskResult::WouldDo));
        summary.add_outcome(&outcome("b", Action::Add, TaskResult::WouldDo));
        assert_eq!(summary.would_remove, vec!["a"]);
        assert_eq!(summary.would_upload, vec!["b"]);
        assert_eq!(summary.total_changes(), 0);
        assert!(summary.is_success());
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::Add.to_string(), "upload");
        assert_eq!(Action::Remove.to_string(), "remove");
    }
}
