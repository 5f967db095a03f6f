//! Notifications delivered to subscribers.

use std::fmt;

use serde::{Deserialize, Serialize};

use vessel_types::{Patch, Value};

/// What caused a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A mutation was committed (or buffered while paused).
    Change,
    /// History recording was paused.
    Pause,
    /// History recording was resumed.
    Resume,
    /// An entry was undone.
    Undo,
    /// An entry was redone.
    Redo,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Change => "change",
            EventKind::Pause => "pause",
            EventKind::Resume => "resume",
            EventKind::Undo => "undo",
            EventKind::Redo => "redo",
        };
        f.write_str(s)
    }
}

/// A notification as seen by a listener.
///
/// Borrowed from the store for the duration of the callback. Listeners that
/// need the snapshot later can clone it; cloning shares structure.
#[derive(Clone, Copy, Debug)]
pub struct Notification<'a> {
    pub kind: EventKind,
    /// The snapshot after the operation.
    pub state: &'a Value,
    /// The patches that produced `state`: one for a change, the whole entry
    /// for an undo or redo, none for pause and resume.
    pub patches: &'a [Patch],
    /// The dotted path a path-scoped listener subscribed to. `None` for
    /// any-change listeners.
    pub path: Option<&'a str>,
}

impl<'a> Notification<'a> {
    pub fn new(kind: EventKind, state: &'a Value, patches: &'a [Patch]) -> Self {
        Self {
            kind,
            state,
            patches,
            path: None,
        }
    }

    /// The same notification, scoped to `path`.
    pub fn at(self, path: &'a str) -> Self {
        Self {
            path: Some(path),
            ..self
        }
    }

    /// The node at the scoped path in the new snapshot, if it still exists.
    pub fn value(&self) -> Option<&'a Value> {
        match self.path {
            None | Some("") => Some(self.state),
            Some(path) => path
                .split('.')
                .try_fold(self.state, |node, step| match node {
                    Value::Array(_) => step.parse::<usize>().ok().and_then(|i| node.get(&i.into())),
                    _ => node.get(&step.into()),
                }),
        }
    }
}
