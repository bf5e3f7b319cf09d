//! Bounded scheduler - runs submit tasks with a concurrency ceiling
//!
//! The in-flight set is filled up to the limit; once full, the caller blocks
//! until the first task to finish (whichever it is) frees a slot, then the
//! next task is submitted. A final barrier waits for everything still in
//! flight. Dry runs never touch the pool.

use crate::context::ProgressCallback;
use crate::error::SubmitError;
use crate::types::{Action, TaskOutcome, TaskResult};
use anyhow::{Context, Result};
use log::debug;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;

type Work = Box<dyn FnOnce() -> TaskResult + Send + 'static>;

/// One unit of remote work, identified for reporting
pub struct Task {
    pub id: String,
    pub action: Action,
    work: Work,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        action: Action,
        work: impl FnOnce() -> TaskResult + Send + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            action,
            work: Box::new(work),
        }
    }

    /// Run the task on the current thread.
    ///
    /// A panic inside the task is reported as a terminal failure of this
    /// task only.
    pub fn execute(self) -> TaskOutcome {
        let Self { id, action, work } = self;
        let result = panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
            TaskResult::Failed(SubmitError::terminal(format!(
                "task panicked: {}",
                panic_message(payload.as_ref())
            )))
        });
        TaskOutcome { id, action, result }
    }

    /// The outcome reported for this task in a dry run
    fn would_do(self) -> TaskOutcome {
        TaskOutcome {
            id: self.id,
            action: self.action,
            result: TaskResult::WouldDo,
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

/// Executes tasks with at most `limit` in flight
#[derive(Debug, Clone, Copy)]
pub struct BoundedScheduler {
    limit: usize,
}

impl BoundedScheduler {
    /// A limit of zero is treated as one
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run every task and return their outcomes in completion order.
    ///
    /// In a dry run no task is executed; each yields a
    /// [`TaskResult::WouldDo`] outcome in submission order.
    pub fn run<P: ProgressCallback>(
        &self,
        tasks: Vec<Task>,
        dry_run: bool,
        progress: &mut P,
    ) -> Result<Vec<TaskOutcome>> {
        if dry_run {
            let outcomes: Vec<_> = tasks.into_iter().map(Task::would_do).collect();
            for outcome in &outcomes {
                progress.on_task_complete(outcome);
            }
            return Ok(outcomes);
        }

        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.limit)
            .thread_name(|i| format!("submit-{i}"))
            .build()
            .context("Failed to create worker pool")?;

        let (tx, rx) = mpsc::channel::<TaskOutcome>();
        let mut outcomes = Vec::with_capacity(tasks.len());
        let mut in_flight = 0usize;

        for task in tasks {
            if in_flight >= self.limit {
                let outcome = rx.recv().context("Worker pool stopped reporting")?;
                in_flight -= 1;
                progress.on_task_complete(&outcome);
                outcomes.push(outcome);
            }

            debug!("Submitting {} of \"{}\"", task.action, task.id);
            let tx = tx.clone();
            pool.spawn(move || {
                // The receiver only goes away if the caller already failed
                let _ = tx.send(task.execute());
            });
            in_flight += 1;
        }
        drop(tx);

        while in_flight > 0 {
            let outcome = rx.recv().context("Worker pool stopped reporting")?;
            in_flight -= 1;
            progress.on_task_complete(&outcome);
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}
