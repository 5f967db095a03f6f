//! A single undoable step.

use std::collections::HashSet;

use vessel_patch::{apply_patch, Applied, PatchResult};
use vessel_types::{Direction, Patch, Path, Value};

/// One committed step of history.
///
/// A plain mutation commits a single patch. A resumed batch commits every
/// patch recorded while paused, in the order they were recorded; each is
/// replayed with its own removal compaction so indices computed against an
/// already-compacted array stay valid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryEntry {
    patches: Vec<Patch>,
}

impl HistoryEntry {
    /// An entry holding one patch.
    pub fn single(patch: Patch) -> Self {
        Self {
            patches: vec![patch],
        }
    }

    /// An entry holding a batch of patches in recording order.
    pub fn batch(patches: Vec<Patch>) -> Self {
        Self { patches }
    }

    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Total number of operations across every patch.
    pub fn op_count(&self) -> usize {
        self.patches.iter().map(Patch::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.iter().all(Patch::is_empty)
    }

    /// Replay the entry onto `snapshot`.
    ///
    /// Forward replays patches first to last. Inverse replays them last to
    /// first, each inverted, so the batch is undone as one unit.
    pub fn apply(&self, snapshot: &Value, direction: Direction) -> PatchResult<Applied> {
        let mut value = snapshot.clone();
        let mut seen = HashSet::new();
        let mut touched = Vec::new();

        let mut replay = |patch: &Patch| -> PatchResult<()> {
            let applied = apply_patch(&value, patch, direction)?;
            value = applied.value;
            for path in applied.touched {
                if seen.insert(path.clone()) {
                    touched.push(path);
                }
            }
            Ok(())
        };

        match direction {
            Direction::Forward => self.patches.iter().try_for_each(&mut replay)?,
            Direction::Inverse => self.patches.iter().rev().try_for_each(&mut replay)?,
        }

        touched.sort_by_key(Path::len);
        Ok(Applied { value, touched })
    }
}
