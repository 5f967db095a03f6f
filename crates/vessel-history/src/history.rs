//! Linear undo/redo history with pause/resume batching.
//!
//! Entries form a timeline with a cursor. `applied` counts the entries that
//! are currently reflected in the live snapshot: undo moves it back, redo
//! moves it forward, and committing a new entry discards everything after it.
//!
//! While paused, recorded patches accumulate in a pending buffer instead of
//! the timeline. Resuming (or undoing/redoing while paused) flushes the
//! buffer as a single entry.

use tracing::{debug, warn};

use vessel_patch::Applied;
use vessel_types::{Direction, Patch, Value};

use crate::entry::HistoryEntry;
use crate::error::{HistoryError, HistoryResult};

/// What happened to a patch handed to [`History::record`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recorded {
    /// The patch became a new entry on the timeline.
    Committed,
    /// The history is paused; the patch joined the pending batch.
    Buffered,
    /// The patch had no operations and was dropped.
    Skipped,
}

/// A successful undo or redo.
#[derive(Clone, Debug)]
pub struct Step {
    /// Timeline index of the entry that was replayed.
    pub index: usize,
    /// The snapshot after the replay, plus the container paths it touched.
    pub applied: Applied,
}

/// The history manager.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    applied: usize,
    paused: bool,
    pending: Vec<Patch>,
    limit: Option<usize>,
}

impl History {
    /// Create an empty, unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty history retaining at most `limit` entries.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    /// Record the patch of a committed mutation.
    pub fn record(&mut self, patch: Patch) -> Recorded {
        if patch.is_empty() {
            return Recorded::Skipped;
        }
        if self.paused {
            self.pending.push(patch);
            debug!(pending = self.pending.len(), "patch buffered while paused");
            Recorded::Buffered
        } else {
            self.commit(HistoryEntry::single(patch));
            Recorded::Committed
        }
    }

    fn commit(&mut self, entry: HistoryEntry) {
        let discarded = self.entries.len() - self.applied;
        self.entries.truncate(self.applied);
        let ops = entry.op_count();
        self.entries.push(entry);
        self.applied += 1;

        if let Some(limit) = self.limit {
            if self.entries.len() > limit {
                let excess = self.entries.len() - limit;
                self.entries.drain(..excess);
                self.applied -= excess;
                warn!(evicted = excess, limit, "history limit reached, oldest entries evicted");
            }
        }

        debug!(ops, discarded, pointer = ?self.pointer(), "history entry committed");
    }

    /// Commit the pending batch as one entry. Returns `true` if anything was
    /// pending.
    pub fn flush(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        let patches = std::mem::take(&mut self.pending);
        debug!(patches = patches.len(), "flushing paused batch");
        self.commit(HistoryEntry::batch(patches));
        true
    }

    // -----------------------------------------------------------------------
    // Pause / resume
    // -----------------------------------------------------------------------

    /// Stop committing entries. Idempotent.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Flush the pending batch, if any, and start committing again.
    /// Returns `true` if a batch was flushed.
    pub fn resume(&mut self) -> bool {
        let flushed = self.flush();
        self.paused = false;
        flushed
    }

    // -----------------------------------------------------------------------
    // Undo / redo
    // -----------------------------------------------------------------------

    /// Invert the most recently applied entry against `current`.
    ///
    /// A pending batch is flushed first and the history leaves the paused
    /// state, so the batch itself is what gets undone. Returns `Ok(None)`
    /// when there is nothing to undo. On error the cursor is unchanged.
    pub fn undo(&mut self, current: &Value) -> HistoryResult<Option<Step>> {
        if self.paused {
            self.flush();
            self.paused = false;
        }
        if self.applied == 0 {
            return Ok(None);
        }

        let index = self.applied - 1;
        let applied = self.replay(index, current, Direction::Inverse)?;
        self.applied = index;
        debug!(index, pointer = ?self.pointer(), "undo");
        Ok(Some(Step { index, applied }))
    }

    /// Re-apply the entry after the cursor against `current`.
    ///
    /// A pending batch is flushed and nothing else happens: the batch is
    /// already reflected in `current`, so there is nothing to redo. Returns
    /// `Ok(None)` when there is nothing to redo. On error the cursor is
    /// unchanged.
    pub fn redo(&mut self, current: &Value) -> HistoryResult<Option<Step>> {
        if self.paused {
            if self.flush() {
                return Ok(None);
            }
            self.paused = false;
        }
        if self.applied >= self.entries.len() {
            return Ok(None);
        }

        let index = self.applied;
        let applied = self.replay(index, current, Direction::Forward)?;
        self.applied = index + 1;
        debug!(index, pointer = ?self.pointer(), "redo");
        Ok(Some(Step { index, applied }))
    }

    fn replay(&self, index: usize, current: &Value, direction: Direction) -> HistoryResult<Applied> {
        self.entries[index]
            .apply(current, direction)
            .map_err(|source| HistoryError::Replay {
                index,
                direction,
                source,
            })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Whether an undo would change anything. A pending batch counts, since
    /// undo flushes it first.
    pub fn can_undo(&self) -> bool {
        self.applied > 0 || (self.paused && !self.pending.is_empty())
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.entries.len()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether patches are waiting in the pending batch.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending(&self) -> &[Patch] {
        &self.pending
    }

    /// Index of the last applied entry, or `None` when nothing is applied.
    pub fn pointer(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}
