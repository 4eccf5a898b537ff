//! Post-fetch verification.

use serde::Serialize;
use std::path::Path;

use crate::catalog::{write_lines, ItemId};
use crate::presence::PresenceProbe;
use crate::state::InstalledRecord;

use super::FetchError;

/// File the failure list is written to.
pub const FAILED_IDS_FILE: &str = "failed_ids.txt";

/// Outcome per requested id, both lists in fetch order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub succeeded: Vec<ItemId>,
    pub failed: Vec<ItemId>,
}

impl Verification {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// An id succeeded iff it is in the refreshed installed state and its
/// content is on disk.
pub fn verify<P>(fetch_set: &[ItemId], refreshed: &InstalledRecord, probe: &P) -> Verification
where
    P: PresenceProbe + ?Sized,
{
    let mut result = Verification::default();
    for id in fetch_set {
        if refreshed.contains_key(id) && probe.has_content(id) {
            result.succeeded.push(id.clone());
        } else {
            result.failed.push(id.clone());
        }
    }
    result
}

/// Write one failed id per line. Nothing is written when there are no
/// failures. Returns whether the file was written.
pub fn write_failures(path: &Path, failed: &[ItemId]) -> Result<bool, FetchError> {
    if failed.is_empty() {
        return Ok(false);
    }
    write_lines(path, failed.iter().map(ItemId::as_str))?;
    Ok(true)
}
