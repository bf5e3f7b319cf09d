//! Sync orchestration - removal phase, then addition phase

use crate::context::{ProgressCallback, RemoteClient, SnapshotProvider};
use crate::executor::BoundedScheduler;
use crate::planner::{KnownItems, ReconciliationPlan, compute_uploads};
use crate::retry::ReliableSubmitter;
use crate::types::{Action, DesiredItem, ExistingItem, SyncOptions, SyncReport, TaskOutcome};
use anyhow::{Context, Result};
use log::info;
use std::collections::BTreeSet;

/// Drives one reconciliation pass against a remote inventory.
///
/// The known-items view is only rebuilt here, between phases, never while
/// tasks are in flight.
pub struct Orchestrator<C: RemoteClient> {
    submitter: ReliableSubmitter<C>,
}

impl<C: RemoteClient + 'static> Orchestrator<C> {
    pub fn new(submitter: ReliableSubmitter<C>) -> Self {
        Self { submitter }
    }

    /// Fetch the snapshot, plan, then run the enabled phases.
    ///
    /// Only a snapshot failure is returned as an error; per-item failures
    /// are reported in the [`SyncReport`].
    pub fn run<S, P>(
        &self,
        snapshot: &S,
        desired: &[DesiredItem],
        removal_ids: &BTreeSet<String>,
        opts: &SyncOptions,
        progress: &mut P,
    ) -> Result<SyncReport>
    where
        S: SnapshotProvider<Handle = C::Handle>,
        P: ProgressCallback,
    {
        let existing = snapshot
            .fetch()
            .context("Failed to fetch the current inventory")?;
        info!("Found {} existing items", existing.len());

        let plan = ReconciliationPlan::compute(desired, removal_ids, &existing, opts.remove);
        info!(
            "Plan: {} to remove, {} to upload",
            plan.to_remove.len(),
            if opts.upload { plan.to_add.len() } else { 0 }
        );

        let mut report = SyncReport {
            existing: existing.len(),
            ..Default::default()
        };
        let mut known = KnownItems::from_snapshot(&existing);

        if opts.remove {
            report.removals = self.remove_phase(plan.to_remove, opts.dry_run, progress)?;
            known = known.without(
                report
                    .removals
                    .iter()
                    .filter(|outcome| outcome.result.is_success())
                    .map(|outcome| outcome.id.as_str()),
            );
        }

        if opts.upload {
            // Recomputed against the post-removal view: a failed removal
            // keeps its id occupied.
            let to_add = compute_uploads(desired, &known);
            report.uploads = self.upload_phase(to_add, opts, progress)?;
        }

        Ok(report)
    }

    /// Removals run one at a time and each failure is isolated
    fn remove_phase<P: ProgressCallback>(
        &self,
        to_remove: Vec<ExistingItem<C::Handle>>,
        dry_run: bool,
        progress: &mut P,
    ) -> Result<Vec<TaskOutcome>> {
        let names = joined_ids(to_remove.iter().map(|item| item.id.as_str()));
        if !to_remove.is_empty() {
            if dry_run {
                info!("Would remove \"{names}\"");
            } else {
                info!("Removing: \"{names}\"");
            }
        }

        let tasks = to_remove
            .into_iter()
            .map(|item| self.submitter.remove_task(item))
            .collect::<Vec<_>>();

        progress.on_phase_start(Action::Remove, tasks.len());
        let outcomes = BoundedScheduler::new(1).run(tasks, dry_run, progress)?;
        progress.on_phase_complete(Action::Remove);
        Ok(outcomes)
    }

    fn upload_phase<P: ProgressCallback>(
        &self,
        to_add: Vec<DesiredItem>,
        opts: &SyncOptions,
        progress: &mut P,
    ) -> Result<Vec<TaskOutcome>> {
        if opts.dry_run {
            for item in &to_add {
                info!("Would upload \"{}\"", item.id);
            }
        }

        let tasks = to_add
            .into_iter()
            .map(|item| self.submitter.upload_task(item))
            .collect::<Vec<_>>();

        progress.on_phase_start(Action::Add, tasks.len());
        let outcomes = BoundedScheduler::new(opts.threads).run(tasks, opts.dry_run, progress)?;
        progress.on_phase_complete(Action::Add);
        Ok(outcomes)
    }
}

fn joined_ids<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    let mut ids: Vec<_> = ids.collect();
    ids.sort_unstable();
    ids.join("\", \"")
}
