//! Copy-on-write patch replay.
//!
//! The input snapshot is never modified. Replay starts from a cheap clone of
//! the root and walks each operation's path with [`Arc::make_mut`] semantics:
//! the first visit to a container that is still shared with the input copies
//! it shallowly, later visits reuse that copy, and containers no operation
//! reaches stay shared by reference with the input.
//!
//! [`Arc::make_mut`]: std::sync::Arc::make_mut

use std::collections::HashSet;

use tracing::trace;

use vessel_types::{Direction, Effect, Patch, Path, Seg, Value};

use crate::error::{PatchError, PatchResult};
use crate::removal::PendingRemovals;

/// Result of replaying a patch.
#[derive(Clone, Debug)]
pub struct Applied {
    /// The new snapshot.
    pub value: Value,
    /// Every container path the replay copied, root first, without
    /// duplicates, in first-visit order.
    pub touched: Vec<Path>,
}

/// Replay `patch` onto `snapshot` in `direction`.
///
/// Operations run in patch order for both directions. Array removals are
/// deferred until every operation has run (see [`crate::removal`]).
pub fn apply_patch(snapshot: &Value, patch: &Patch, direction: Direction) -> PatchResult<Applied> {
    let mut next = snapshot.clone();
    let mut touched = Touched::default();
    let mut pending = PendingRemovals::new();

    for op in patch {
        let path = op.path();
        touched.record(path);
        match op.effect(direction) {
            Effect::Set(value) => set(&mut next, path, value.clone(), &mut pending)?,
            Effect::Delete => delete(&mut next, path, &mut pending)?,
        }
    }

    let compacted = if pending.is_empty() {
        0
    } else {
        pending.compact(&mut next)?
    };

    trace!(
        ops = patch.len(),
        ?direction,
        touched = touched.paths.len(),
        compacted,
        "patch applied"
    );

    Ok(Applied {
        value: next,
        touched: touched.paths,
    })
}

/// The container paths replaying `patch` would touch, without replaying it.
///
/// Same order and contents as [`Applied::touched`].
pub fn touched_paths(patch: &Patch) -> Vec<Path> {
    let mut touched = Touched::default();
    for path in patch.paths() {
        touched.record(path);
    }
    touched.paths
}

#[derive(Default)]
struct Touched {
    seen: HashSet<Path>,
    paths: Vec<Path>,
}

impl Touched {
    fn record(&mut self, path: &Path) {
        // A root replacement has no proper prefix but still changes the root.
        if path.is_empty() {
            self.insert(Path::root());
            return;
        }
        for prefix in path.prefixes() {
            self.insert(Path::from(prefix));
        }
    }

    fn insert(&mut self, path: Path) {
        if self.seen.insert(path.clone()) {
            self.paths.push(path);
        }
    }
}

/// Split `path` into its parent path and last segment.
fn split(path: &Path) -> Option<(Path, &Seg)> {
    let (last, parent) = path.segments().split_last()?;
    Some((Path::from(parent), last))
}

/// Walk to the container at `parent`, unsharing every step.
fn container_mut<'a>(root: &'a mut Value, parent: &Path) -> PatchResult<&'a mut Value> {
    root.pointer_mut(parent)
        .ok_or_else(|| PatchError::PathNotFound {
            path: parent.clone(),
        })
}

fn set(root: &mut Value, path: &Path, value: Value, pending: &mut PendingRemovals) -> PatchResult<()> {
    let Some((parent, last)) = split(path) else {
        *root = value;
        return Ok(());
    };

    let node = container_mut(root, &parent)?;
    let found = node.kind_name();
    match last {
        Seg::Key(key) => {
            let obj = node.as_object_mut().ok_or_else(|| PatchError::NotAContainer {
                path: parent.clone(),
                found,
            })?;
            obj.insert(key.clone(), value);
            Ok(())
        }
        Seg::Index(index) => {
            let items = node.as_array_mut().ok_or_else(|| PatchError::NotAContainer {
                path: parent.clone(),
                found,
            })?;
            let len = items.len();
            if *index < len {
                items[*index] = value;
                pending.unmark(&parent, *index);
                Ok(())
            } else if *index == len {
                items.push(value);
                Ok(())
            } else {
                Err(PatchError::IndexOutOfBounds {
                    path: parent,
                    index: *index,
                    len,
                })
            }
        }
    }
}

fn delete(root: &mut Value, path: &Path, pending: &mut PendingRemovals) -> PatchResult<()> {
    let Some((parent, last)) = split(path) else {
        return Err(PatchError::RootDelete);
    };

    let node = container_mut(root, &parent)?;
    let found = node.kind_name();
    match last {
        Seg::Key(key) => {
            let obj = node.as_object_mut().ok_or_else(|| PatchError::NotAContainer {
                path: parent.clone(),
                found,
            })?;
            match obj.shift_remove(key) {
                Some(_) => Ok(()),
                None => Err(PatchError::PathNotFound { path: path.clone() }),
            }
        }
        Seg::Index(index) => {
            let items = node.as_array_mut().ok_or_else(|| PatchError::NotAContainer {
                path: parent.clone(),
                found,
            })?;
            let len = items.len();
            if *index >= len {
                return Err(PatchError::IndexOutOfBounds {
                    path: parent,
                    index: *index,
                    len,
                });
            }
            pending.mark(&parent, *index, len);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use vessel_diff::diff;
    use vessel_types::{Map, Operation};

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn roundtrip(a: &Value, b: &Value) {
        let patch = diff(a, b);
        let forward = apply_patch(a, &patch, Direction::Forward).unwrap();
        assert_eq!(&forward.value, b, "forward replay of {patch:?}");
        let inverse = apply_patch(b, &patch, Direction::Inverse).unwrap();
        assert_eq!(&inverse.value, a, "inverse replay of {patch:?}");
    }

    // -----------------------------------------------------------------------
    // Forward / inverse effects
    // -----------------------------------------------------------------------

    #[test]
    fn top_level_array_growth() {
        roundtrip(&v(json!({"fruits": ["apple"]})), &v(json!({"fruits": ["apple", "pear"]})));
    }

    #[test]
    fn nested_array_growth_and_change() {
        roundtrip(
            &v(json!({"options": [[1, 0]]})),
            &v(json!({"options": [[2, 0], [1, 1]]})),
        );
    }

    #[test]
    fn multiple_removals_from_one_array_leave_no_gaps() {
        let a = v(json!({"fruits": ["apple", "pear", "kiwi"]}));
        let b = v(json!({"fruits": ["apple"]}));
        let applied = apply_patch(&a, &diff(&a, &b), Direction::Forward).unwrap();
        assert_eq!(applied.value["fruits"], json!(["apple"]));
        assert_eq!(applied.value["fruits"].len(), 1);
        roundtrip(&a, &b);
    }

    #[test]
    fn removal_and_change_in_the_same_array() {
        let a = v(json!([{"id": 1}, {"id": 2}, {"id": 3}]));
        let b = v(json!([{"id": 1}, {"id": 9}]));
        roundtrip(&a, &b);
    }

    #[test]
    fn object_key_removal_and_creation() {
        roundtrip(
            &v(json!({"user": {"name": "Steve", "age": 93}})),
            &v(json!({"user": {"name": "Steve", "nick": "S"}})),
        );
    }

    #[test]
    fn root_replacement() {
        roundtrip(&v(json!([1, 2])), &v(json!({"a": 1})));
        roundtrip(&v(json!(1)), &v(json!("one")));
    }

    #[test]
    fn input_snapshot_is_untouched() {
        let a = v(json!({"a": {"b": 1}, "list": [1, 2, 3]}));
        let before = a.deep_clone();
        let patch: Patch = vec![
            Operation::change(Path::root().key("a").key("b"), 1, 2),
            Operation::remove(Path::root().key("list").index(2), 3),
        ]
        .into();
        apply_patch(&a, &patch, Direction::Forward).unwrap();
        assert_eq!(a, before);
    }

    // -----------------------------------------------------------------------
    // Structural sharing
    // -----------------------------------------------------------------------

    #[test]
    fn untouched_siblings_stay_shared() {
        let a = v(json!({"a": {"b": {"leaf": 1}}, "c": {"deep": [1, 2, 3]}}));
        let patch: Patch = vec![Operation::change(Path::root().key("a").key("b").key("leaf"), 1, 2)].into();
        let applied = apply_patch(&a, &patch, Direction::Forward).unwrap();

        assert!(applied.value["c"].ptr_eq(&a["c"]));
        assert!(!applied.value["a"].ptr_eq(&a["a"]));
        assert!(!applied.value["a"]["b"].ptr_eq(&a["a"]["b"]));
    }

    #[test]
    fn touched_paths_are_every_ancestor_once() {
        let a = v(json!({"nodes": {"n1": {"x": 0, "y": 0}, "n2": {"x": 0}}}));
        let patch: Patch = vec![
            Operation::change(Path::root().key("nodes").key("n1").key("x"), 0, 1),
            Operation::change(Path::root().key("nodes").key("n1").key("y"), 0, 1),
        ]
        .into();
        let applied = apply_patch(&a, &patch, Direction::Forward).unwrap();
        let dotted: Vec<String> = applied.touched.iter().map(Path::to_dotted).collect();
        assert_eq!(dotted, vec!["", "nodes", "nodes.n1"]);
    }

    #[test]
    fn touched_paths_match_a_replay() {
        let a = v(json!({"a": [1, {"b": 2}], "c": {"d": 1}}));
        let b = v(json!({"a": [1, {"b": 3}, 4], "c": {}}));
        let patch = diff(&a, &b);
        let applied = apply_patch(&a, &patch, Direction::Forward).unwrap();
        assert_eq!(touched_paths(&patch), applied.touched);
    }

    #[test]
    fn root_replacement_touches_the_root() {
        let patch: Patch = vec![Operation::change(Path::root(), 1, 2)].into();
        let applied = apply_patch(&v(json!(1)), &patch, Direction::Forward).unwrap();
        assert_eq!(applied.value, json!(2));
        assert_eq!(applied.touched, vec![Path::root()]);
    }

    // -----------------------------------------------------------------------
    // Errors
    // -----------------------------------------------------------------------

    #[test]
    fn missing_parent_is_reported() {
        let patch: Patch = vec![Operation::create(Path::root().key("x").key("y"), 1)].into();
        let err = apply_patch(&v(json!({})), &patch, Direction::Forward).unwrap_err();
        assert_eq!(err, PatchError::PathNotFound { path: Path::root().key("x") });
    }

    #[test]
    fn write_past_array_end_is_reported() {
        let patch: Patch = vec![Operation::create(Path::root().index(5), 1)].into();
        let err = apply_patch(&v(json!([0])), &patch, Direction::Forward).unwrap_err();
        assert!(matches!(err, PatchError::IndexOutOfBounds { index: 5, len: 1, .. }));
    }

    #[test]
    fn deleting_the_root_is_rejected() {
        let patch: Patch = vec![Operation::remove(Path::root(), 1)].into();
        let err = apply_patch(&v(json!(1)), &patch, Direction::Forward).unwrap_err();
        assert_eq!(err, PatchError::RootDelete);
    }

    // -----------------------------------------------------------------------
    // Round-trip law over generated trees
    // -----------------------------------------------------------------------

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            (-50i32..50).prop_map(Value::from),
            "[a-z]{0,4}".prop_map(Value::from),
        ]
    }

    fn tree() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(4, 48, 5, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..5).prop_map(Value::from),
                prop::collection::btree_map("[a-e]", inner, 0..5)
                    .prop_map(|entries| Value::from(entries.into_iter().collect::<Map>())),
            ]
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn diff_then_apply_round_trips(a in tree(), b in tree()) {
            let patch = diff(&a, &b);
            let forward = apply_patch(&a, &patch, Direction::Forward).unwrap();
            prop_assert_eq!(&forward.value, &b);
            let inverse = apply_patch(&b, &patch, Direction::Inverse).unwrap();
            prop_assert_eq!(&inverse.value, &a);
        }

        #[test]
        fn inverse_patch_replays_forward_as_undo(a in tree(), b in tree()) {
            let patch = diff(&a, &b);
            let undone = apply_patch(&b, &patch.inverse(), Direction::Forward).unwrap();
            prop_assert_eq!(&undone.value, &a);
        }
    }
}
