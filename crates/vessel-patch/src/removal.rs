//! Deferred array removal.
//!
//! Splicing an element out of an array while a patch is being replayed would
//! shift every later index in that array, and later operations in the same
//! patch were computed against the unshifted indices. Removals are therefore
//! recorded as [`Slot::PendingRemoval`] markers while the patch is walked and
//! physically applied in one compaction pass at the end.

use std::collections::BTreeMap;

use vessel_types::{Path, Value};

use crate::error::{PatchError, PatchResult};

/// State of one array element during a replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Live,
    PendingRemoval,
}

/// Arrays that received removals during the current replay, keyed by path.
#[derive(Debug, Default)]
pub struct PendingRemovals {
    arrays: BTreeMap<Path, Vec<Slot>>,
}

impl PendingRemovals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Mark `index` of the array at `array` (currently `len` long) as removed.
    pub fn mark(&mut self, array: &Path, index: usize, len: usize) {
        let slots = self
            .arrays
            .entry(array.clone())
            .or_insert_with(|| vec![Slot::Live; len]);
        if slots.len() < len {
            slots.resize(len, Slot::Live);
        }
        slots[index] = Slot::PendingRemoval;
    }

    /// Clear a removal mark, e.g. when a later operation writes the slot again.
    pub fn unmark(&mut self, array: &Path, index: usize) {
        if let Some(slot) = self
            .arrays
            .get_mut(array)
            .and_then(|slots| slots.get_mut(index))
        {
            *slot = Slot::Live;
        }
    }

    pub fn is_marked(&self, array: &Path, index: usize) -> bool {
        self.arrays
            .get(array)
            .and_then(|slots| slots.get(index))
            .is_some_and(|slot| *slot == Slot::PendingRemoval)
    }

    /// Drop every marked element from `root`, returning how many were removed.
    ///
    /// Deeper arrays are compacted first so that the paths of arrays nested
    /// inside other marked arrays still resolve.
    pub fn compact(self, root: &mut Value) -> PatchResult<usize> {
        let mut arrays: Vec<(Path, Vec<Slot>)> = self.arrays.into_iter().collect();
        arrays.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));

        let mut removed = 0;
        for (path, slots) in arrays {
            let node = root
                .pointer_mut(&path)
                .ok_or_else(|| PatchError::PathNotFound { path: path.clone() })?;
            let found = node.kind_name();
            let items = node
                .as_array_mut()
                .ok_or(PatchError::NotAContainer { path, found })?;

            let before = items.len();
            let mut index = 0;
            items.retain(|_| {
                let keep = slots.get(index) != Some(&Slot::PendingRemoval);
                index += 1;
                keep
            });
            removed += before - items.len();
        }
        Ok(removed)
    }
}
