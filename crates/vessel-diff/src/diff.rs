//! Structural diff of two value trees.
//!
//! Keys of the old container are visited in their natural order. A key the
//! new container lacks becomes a REMOVE; a key holding containers of the same
//! shape on both sides is descended into; any other differing pair becomes a
//! CHANGE. Keys only the new container has become CREATE operations, in the
//! new container's order, after everything else at that level.
//!
//! Arrays are keyed containers whose keys are indices. No index-shift
//! handling happens here: both trees are final, so a shorter array simply
//! yields REMOVEs for its missing tail. Compensating for in-place removal is
//! the patch applier's job.

use tracing::trace;

use vessel_types::{Map, Operation, Patch, Path, Value};

use crate::equality::{loosely_equal, same_shape};

/// Compute the patch that transforms `old` into `new`.
///
/// Subtrees shared by reference between the two trees are skipped without
/// being visited. When the roots are not containers of the same shape the
/// result is a single CHANGE at the root path, or nothing if they are equal.
pub fn diff(old: &Value, new: &Value) -> Patch {
    let mut ops = Vec::new();
    let mut path = Path::root();
    diff_entry(&mut ops, &mut path, old, new);

    let patch = Patch::from_ops(ops);
    let (creates, changes, removes) = patch.counts();
    trace!(creates, changes, removes, "diff computed");
    patch
}

fn diff_entry(ops: &mut Vec<Operation>, path: &mut Path, old: &Value, new: &Value) {
    if old.ptr_eq(new) {
        return;
    }
    if same_shape(old, new) {
        match (old, new) {
            (Value::Object(o), Value::Object(n)) => diff_objects(ops, path, o, n),
            (Value::Array(o), Value::Array(n)) => diff_arrays(ops, path, o, n),
            _ => {}
        }
    } else if !loosely_equal(old, new) {
        ops.push(Operation::Change {
            path: path.clone(),
            value: new.clone(),
            old_value: old.clone(),
        });
    }
}

fn diff_objects(ops: &mut Vec<Operation>, path: &mut Path, old: &Map, new: &Map) {
    for (key, old_value) in old {
        path.push(key.as_str());
        match new.get(key) {
            Some(new_value) => diff_entry(ops, path, old_value, new_value),
            None => ops.push(Operation::Remove {
                path: path.clone(),
                old_value: old_value.clone(),
            }),
        }
        path.pop();
    }

    for (key, new_value) in new {
        if !old.contains_key(key) {
            ops.push(Operation::Create {
                path: path.child(key.as_str()),
                value: new_value.clone(),
            });
        }
    }
}

fn diff_arrays(ops: &mut Vec<Operation>, path: &mut Path, old: &[Value], new: &[Value]) {
    for (index, old_value) in old.iter().enumerate() {
        path.push(index);
        match new.get(index) {
            Some(new_value) => diff_entry(ops, path, old_value, new_value),
            None => ops.push(Operation::Remove {
                path: path.clone(),
                old_value: old_value.clone(),
            }),
        }
        path.pop();
    }

    for (index, new_value) in new.iter().enumerate().skip(old.len()) {
        ops.push(Operation::Create {
            path: path.child(index),
            value: new_value.clone(),
        });
    }
}
