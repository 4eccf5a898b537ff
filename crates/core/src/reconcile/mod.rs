//! Reconciliation: turning catalog, installed state, on-disk presence and
//! remote revisions into the minimal ordered set of items to fetch.
//!
//! The steps are split so the remote lookup can sit between them:
//!
//! 1. [`partition`] installed ids into present / empty-or-missing.
//! 2. [`update_candidates`] picks the catalog ids whose revision is worth
//!    checking remotely.
//! 3. [`plan`] combines everything into a [`FetchPlan`].

use serde::Serialize;
use std::collections::HashSet;

use crate::catalog::{Catalog, ItemId};
use crate::details::RemoteLookup;
use crate::presence::PresenceProbe;
use crate::state::InstalledRecord;

/// Installed ids split by whether their content is really on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub present: HashSet<ItemId>,
    pub empty_or_missing: HashSet<ItemId>,
}

/// Split installed ids by on-disk presence.
///
/// With `require_nonempty` off every installed id counts as present.
pub fn partition<P>(installed: &InstalledRecord, probe: &P, require_nonempty: bool) -> Partition
where
    P: PresenceProbe + ?Sized,
{
    if !require_nonempty {
        return Partition {
            present: installed.keys().cloned().collect(),
            empty_or_missing: HashSet::new(),
        };
    }

    let mut result = Partition::default();
    for id in installed.keys() {
        if probe.has_content(id) {
            result.present.insert(id.clone());
        } else {
            result.empty_or_missing.insert(id.clone());
        }
    }
    result
}

/// Catalog ids, in catalog order, whose installed revision can be compared
/// against the remote one.
pub fn update_candidates(catalog: &Catalog, partition: &Partition) -> Vec<ItemId> {
    catalog.retain_order(&partition.present)
}

/// Whether and how installed revisions were compared against the remote.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateCheck {
    Disabled,
    Remote(RemoteLookup<u64>),
}

/// The reconciled fetch set plus the counts behind it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchPlan {
    /// Ordered subsequence of the catalog to fetch.
    pub fetch_set: Vec<ItemId>,
    pub catalog_size: usize,
    pub installed: usize,
    /// Catalog ids without confirmed content.
    pub new: usize,
    pub need_update: usize,
    pub up_to_date: usize,
    pub empty_or_missing: usize,
    /// Remote lookup batches that failed (their ids were left as they are).
    pub failed_batches: usize,
}

impl FetchPlan {
    /// Plan that fetches the whole catalog.
    pub fn everything(catalog: &Catalog, installed: usize) -> Self {
        Self {
            fetch_set: catalog.ids().to_vec(),
            catalog_size: catalog.len(),
            installed,
            new: catalog.len(),
            ..Self::default()
        }
    }

    pub fn skipped(&self) -> usize {
        self.catalog_size - self.fetch_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fetch_set.is_empty()
    }
}

/// Compute the fetch plan.
///
/// - Nothing installed: fetch the whole catalog.
/// - Otherwise fetch catalog ids that are not present on disk, installed ids
///   with empty or missing content, and (when checked) present ids whose
///   remote revision is strictly newer than the installed one.
///
/// The result always follows catalog order. An id with no installed record
/// is new regardless of stray files on disk.
pub fn plan(
    catalog: &Catalog,
    installed: &InstalledRecord,
    partition: &Partition,
    check: &UpdateCheck,
) -> FetchPlan {
    if installed.is_empty() {
        return FetchPlan::everything(catalog, 0);
    }

    let new_ids: Vec<&ItemId> = catalog
        .iter()
        .filter(|id| !partition.present.contains(*id))
        .collect();

    let mut selected: HashSet<ItemId> = new_ids.iter().map(|id| (*id).clone()).collect();
    selected.extend(partition.empty_or_missing.iter().cloned());

    let mut need_update = 0;
    let mut up_to_date = 0;
    let mut failed_batches = 0;

    if let UpdateCheck::Remote(remote) = check {
        failed_batches = remote.failed_batches();
        for id in update_candidates(catalog, partition) {
            let local = installed.get(&id).copied().unwrap_or(0);
            let remote_updated = remote.get(&id).copied().unwrap_or(0);
            if remote_updated > local {
                need_update += 1;
                selected.insert(id);
            } else {
                up_to_date += 1;
            }
        }
    }

    FetchPlan {
        fetch_set: catalog.retain_order(&selected),
        catalog_size: catalog.len(),
        installed: installed.len(),
        new: new_ids.len(),
        need_update,
        up_to_date,
        empty_or_missing: partition.empty_or_missing.len(),
        failed_batches,
    }
}
