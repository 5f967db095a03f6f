//! Patch operations.
//!
//! Each operation carries enough of the old tree to be inverted on its own,
//! so a patch doubles as its own undo record.

use serde::{Deserialize, Serialize};

use crate::path::Path;
use crate::value::Value;

/// Which way a patch is replayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Inverse,
}

/// Operation discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpKind {
    Create,
    Change,
    Remove,
}

/// A single edit at a path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Operation {
    /// A node that did not exist now holds `value`.
    Create { path: Path, value: Value },
    /// A node changed from `old_value` to `value`.
    Change {
        path: Path,
        value: Value,
        #[serde(rename = "oldValue")]
        old_value: Value,
    },
    /// A node holding `old_value` no longer exists.
    Remove {
        path: Path,
        #[serde(rename = "oldValue")]
        old_value: Value,
    },
}

/// What replaying an operation does to its target slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Effect<'a> {
    Set(&'a Value),
    Delete,
}

impl Operation {
    pub fn create(path: Path, value: impl Into<Value>) -> Self {
        Operation::Create {
            path,
            value: value.into(),
        }
    }

    pub fn change(path: Path, old_value: impl Into<Value>, value: impl Into<Value>) -> Self {
        Operation::Change {
            path,
            value: value.into(),
            old_value: old_value.into(),
        }
    }

    pub fn remove(path: Path, old_value: impl Into<Value>) -> Self {
        Operation::Remove {
            path,
            old_value: old_value.into(),
        }
    }

    pub fn kind(&self) -> OpKind {
        match self {
            Operation::Create { .. } => OpKind::Create,
            Operation::Change { .. } => OpKind::Change,
            Operation::Remove { .. } => OpKind::Remove,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Operation::Create { path, .. }
            | Operation::Change { path, .. }
            | Operation::Remove { path, .. } => path,
        }
    }

    /// Effect of replaying this operation in `direction`.
    ///
    /// | op     | forward      | inverse         |
    /// |--------|--------------|-----------------|
    /// | CREATE | set `value`  | delete          |
    /// | CHANGE | set `value`  | set `old_value` |
    /// | REMOVE | delete       | set `old_value` |
    pub fn effect(&self, direction: Direction) -> Effect<'_> {
        match (self, direction) {
            (Operation::Create { value, .. }, Direction::Forward)
            | (Operation::Change { value, .. }, Direction::Forward) => Effect::Set(value),
            (Operation::Change { old_value, .. }, Direction::Inverse)
            | (Operation::Remove { old_value, .. }, Direction::Inverse) => Effect::Set(old_value),
            (Operation::Create { .. }, Direction::Inverse)
            | (Operation::Remove { .. }, Direction::Forward) => Effect::Delete,
        }
    }

    /// The operation that undoes this one.
    pub fn inverse(&self) -> Operation {
        match self {
            Operation::Create { path, value } => Operation::Remove {
                path: path.clone(),
                old_value: value.clone(),
            },
            Operation::Change {
                path,
                value,
                old_value,
            } => Operation::Change {
                path: path.clone(),
                value: old_value.clone(),
                old_value: value.clone(),
            },
            Operation::Remove { path, old_value } => Operation::Create {
                path: path.clone(),
                value: old_value.clone(),
            },
        }
    }
}

/// Ordered operations forming one atomic transition between two snapshots.
///
/// Order is significant and must survive storage and replay.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch(Vec<Operation>);

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ops(ops: Vec<Operation>) -> Self {
        Self(ops)
    }

    pub fn push(&mut self, op: Operation) {
        self.0.push(op);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn ops(&self) -> &[Operation] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.0.iter()
    }

    pub fn into_ops(self) -> Vec<Operation> {
        self.0
    }

    /// Paths of every operation, in order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.0.iter().map(Operation::path)
    }

    /// A patch whose forward replay equals this patch's inverse replay.
    ///
    /// Operation order is kept: within one patch no path is a prefix of
    /// another, and ascending array indices keep re-insertions contiguous.
    pub fn inverse(&self) -> Patch {
        Self(self.0.iter().map(Operation::inverse).collect())
    }

    /// Number of operations of each kind: `(creates, changes, removes)`.
    pub fn counts(&self) -> (usize, usize, usize) {
        self.0.iter().fold((0, 0, 0), |(c, u, r), op| match op.kind() {
            OpKind::Create => (c + 1, u, r),
            OpKind::Change => (c, u + 1, r),
            OpKind::Remove => (c, u, r + 1),
        })
    }
}

impl From<Vec<Operation>> for Patch {
    fn from(ops: Vec<Operation>) -> Self {
        Self(ops)
    }
}

impl FromIterator<Operation> for Patch {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Operation> for Patch {
    fn extend<I: IntoIterator<Item = Operation>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Patch {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Patch {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
