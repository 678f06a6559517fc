//! Per-scope instance cache.

use std::sync::Arc;

use ahash::AHashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::registration::AnyArc;

/// Registration id to construct-once cell.
///
/// The map lock is held only to fetch or insert a cell, never while an
/// instance is being built, so racing first resolutions wait on the cell
/// and exactly one of them constructs.
#[derive(Default)]
pub(crate) struct InstanceCache {
    cells: Mutex<AHashMap<u64, Arc<OnceCell<AnyArc>>>>,
}

impl InstanceCache {
    pub(crate) fn cell(&self, registration: u64) -> Arc<OnceCell<AnyArc>> {
        self.cells.lock().entry(registration).or_default().clone()
    }

    /// Number of constructed instances.
    pub(crate) fn len(&self) -> usize {
        self.cells.lock().values().filter(|c| c.get().is_some()).count()
    }

    pub(crate) fn clear(&self) {
        self.cells.lock().clear();
    }
}
