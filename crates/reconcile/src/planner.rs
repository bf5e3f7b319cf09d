//! Reconciliation planner - diffs desired items against the remote snapshot

use crate::types::{DesiredItem, ExistingItem};
use std::collections::{BTreeSet, HashSet};

/// The removals and additions for one run
#[derive(Debug, Clone)]
pub struct ReconciliationPlan<H> {
    /// Existing items to delete (always a subset of the snapshot)
    pub to_remove: Vec<ExistingItem<H>>,
    /// Desired items not present once the removals are applied
    pub to_add: Vec<DesiredItem>,
}

impl<H: Clone> ReconciliationPlan<H> {
    /// Build a plan from the desired items, the explicit removal set and the
    /// snapshot.
    ///
    /// Removals are applied to a working copy of the snapshot before uploads
    /// are computed, so an id that is both removed and desired is re-added.
    pub fn compute(
        desired: &[DesiredItem],
        removal_ids: &BTreeSet<String>,
        snapshot: &[ExistingItem<H>],
        removal_enabled: bool,
    ) -> Self {
        let to_remove = if removal_enabled {
            compute_removals(removal_ids, snapshot)
        } else {
            Vec::new()
        };

        let working = KnownItems::from_snapshot(snapshot)
            .without(to_remove.iter().map(|item| item.id.as_str()));
        let to_add = compute_uploads(desired, &working);

        Self { to_remove, to_add }
    }
}

/// Snapshot items whose id was explicitly configured for removal.
///
/// Snapshot order is kept and each item appears at most once.
pub fn compute_removals<H: Clone>(
    removal_ids: &BTreeSet<String>,
    snapshot: &[ExistingItem<H>],
) -> Vec<ExistingItem<H>> {
    let mut seen = HashSet::new();
    snapshot
        .iter()
        .filter(|item| removal_ids.contains(&item.id))
        .filter(|item| seen.insert(item.id.clone()))
        .cloned()
        .collect()
}

/// Desired items that are not already known to exist, in input order.
pub fn compute_uploads(desired: &[DesiredItem], current: &KnownItems) -> Vec<DesiredItem> {
    desired
        .iter()
        .filter(|item| !current.contains(&item.id))
        .cloned()
        .collect()
}

/// Immutable view of the identifiers currently known to exist remotely
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownItems {
    ids: BTreeSet<String>,
}

impl KnownItems {
    pub fn from_snapshot<H>(snapshot: &[ExistingItem<H>]) -> Self {
        Self {
            ids: snapshot.iter().map(|item| item.id.clone()).collect(),
        }
    }

    /// A fresh view with the given ids forgotten
    pub fn without<'a>(&self, gone: impl IntoIterator<Item = &'a str>) -> Self {
        let mut ids = self.ids.clone();
        for id in gone {
            ids.remove(id);
        }
        Self { ids }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }
}
