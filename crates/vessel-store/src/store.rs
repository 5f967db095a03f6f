//! The versioned state container.

use std::convert::Infallible;
use std::fmt;

use tracing::{debug, info};

use vessel_diff::diff;
use vessel_history::{History, HistoryEntry};
use vessel_patch::{apply_patch, touched_paths};
use vessel_types::{Direction, Patch, Path, Value};

use crate::bus::{Listener, SubscriptionBus, SubscriptionId};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::event::{EventKind, Notification};

/// Hook run on every edited draft before it is diffed.
pub type Processor = Box<dyn Fn(Value) -> Value + Send + Sync>;

/// A versioned in-memory state container.
///
/// Holds the current snapshot, the undo/redo history, and the subscribers.
/// Every operation runs to completion, notifications included, before it
/// returns. Mutating operations take `&mut self` and listeners only ever see
/// a shared borrow of the store's data, so a listener cannot re-enter the
/// store.
pub struct Store {
    state: Value,
    history: History,
    bus: SubscriptionBus,
    config: StoreConfig,
    processor: Option<Processor>,
}

impl Store {
    /// Create a store with the default configuration.
    pub fn new(initial: impl Into<Value>) -> Self {
        Self::with_config(initial, StoreConfig::default())
    }

    pub fn with_config(initial: impl Into<Value>, config: StoreConfig) -> Self {
        let state = initial.into();
        info!(
            kind = state.kind_name(),
            draft = ?config.draft,
            history_limit = ?config.history_limit,
            "store created"
        );
        Self {
            state,
            history: History::with_limit(config.history_limit),
            bus: SubscriptionBus::new(),
            config,
            processor: None,
        }
    }

    /// Install a hook that post-processes every edited draft.
    pub fn with_processor(mut self, processor: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.processor = Some(Box::new(processor));
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Edit a draft of the current snapshot and commit the difference.
    ///
    /// The committed snapshot is built by replaying the diff onto the
    /// current snapshot, so it shares every untouched subtree with it no
    /// matter how the draft was made.
    pub fn mutate<F>(&mut self, edit: F) -> StoreResult<&mut Self>
    where
        F: FnOnce(&mut Value),
    {
        self.try_mutate(|draft| {
            edit(draft);
            Ok::<(), Infallible>(())
        })
    }

    /// Like [`mutate`](Self::mutate), with an edit function that can fail.
    /// On failure nothing is committed and the error is returned as
    /// [`StoreError::Mutator`].
    pub fn try_mutate<F, E>(&mut self, edit: F) -> StoreResult<&mut Self>
    where
        F: FnOnce(&mut Value) -> Result<(), E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let mut draft = self.config.draft.draft(&self.state);
        edit(&mut draft).map_err(|e| StoreError::Mutator(e.into()))?;
        let draft = self.process(draft);

        let patch = diff(&self.state, &draft);
        if patch.is_empty() {
            debug!("mutation produced no changes");
            return Ok(self);
        }
        let applied = apply_patch(&self.state, &patch, Direction::Forward)?;
        self.commit(applied.value, patch, &applied.touched);
        Ok(self)
    }

    /// Edit a shallow copy of the current snapshot and commit it as is.
    ///
    /// Containers are still copied on first write, so the edit cannot leak
    /// into the previous snapshot; the draft simply becomes the next
    /// snapshot without a replay.
    pub fn update<F>(&mut self, edit: F) -> &mut Self
    where
        F: FnOnce(&mut Value),
    {
        let mut draft = self.state.clone();
        edit(&mut draft);
        let draft = self.process(draft);
        self.commit_draft(draft);
        self
    }

    /// Like [`update`](Self::update), with an edit function that can fail.
    pub fn try_update<F, E>(&mut self, edit: F) -> StoreResult<&mut Self>
    where
        F: FnOnce(&mut Value) -> Result<(), E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let mut draft = self.state.clone();
        edit(&mut draft).map_err(|e| StoreError::Mutator(e.into()))?;
        let draft = self.process(draft);
        self.commit_draft(draft);
        Ok(self)
    }

    fn process(&self, draft: Value) -> Value {
        match &self.processor {
            Some(processor) => processor(draft),
            None => draft,
        }
    }

    fn commit_draft(&mut self, draft: Value) {
        let patch = diff(&self.state, &draft);
        if patch.is_empty() {
            debug!("update produced no changes");
            return;
        }
        let touched = touched_paths(&patch);
        self.commit(draft, patch, &touched);
    }

    fn commit(&mut self, next: Value, patch: Patch, touched: &[Path]) {
        self.state = next;
        let ops = patch.len();
        let recorded = self.history.record(patch.clone());
        debug!(ops, ?recorded, pointer = ?self.history.pointer(), "mutation committed");
        self.bus
            .publish(EventKind::Change, &self.state, std::slice::from_ref(&patch), touched);
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Stop recording history entries; later mutations are batched until
    /// [`resume`](Self::resume).
    pub fn pause(&mut self) -> &mut Self {
        self.history.pause();
        debug!("history paused");
        self.bus.publish(EventKind::Pause, &self.state, &[], &[]);
        self
    }

    /// Commit the batched mutations, if any, as one history entry and
    /// resume recording.
    pub fn resume(&mut self) -> &mut Self {
        let flushed = self.history.resume();
        debug!(flushed, history_len = self.history.len(), "history resumed");
        self.bus.publish(EventKind::Resume, &self.state, &[], &[]);
        self
    }

    /// Revert the last history entry. A paused batch is committed and then
    /// reverted as a whole. Does nothing when there is nothing to undo.
    pub fn undo(&mut self) -> StoreResult<&mut Self> {
        let Some(step) = self.history.undo(&self.state)? else {
            debug!("nothing to undo");
            return Ok(self);
        };
        self.state = step.applied.value;
        let patches = self.history.get(step.index).map(HistoryEntry::patches).unwrap_or_default();
        debug!(index = step.index, pointer = ?self.history.pointer(), "undo applied");
        self.bus
            .publish(EventKind::Undo, &self.state, patches, &step.applied.touched);
        Ok(self)
    }

    /// Re-apply the next history entry. While paused with pending changes
    /// this only commits the batch. Does nothing when there is nothing to
    /// redo.
    pub fn redo(&mut self) -> StoreResult<&mut Self> {
        let Some(step) = self.history.redo(&self.state)? else {
            debug!("nothing to redo");
            return Ok(self);
        };
        self.state = step.applied.value;
        let patches = self.history.get(step.index).map(HistoryEntry::patches).unwrap_or_default();
        debug!(index = step.index, pointer = ?self.history.pointer(), "redo applied");
        self.bus
            .publish(EventKind::Redo, &self.state, patches, &step.applied.touched);
        Ok(self)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn get_state(&self) -> &Value {
        &self.state
    }

    pub fn state(&self) -> &Value {
        &self.state
    }

    pub fn get_is_paused(&self) -> bool {
        self.history.is_paused()
    }

    pub fn get_can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn get_can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Number of committed history entries.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Index of the last applied history entry, `None` before the first.
    pub fn pointer(&self) -> Option<usize> {
        self.history.pointer()
    }

    /// Whether mutations made while paused are waiting to be committed.
    pub fn is_dirty(&self) -> bool {
        self.history.has_pending()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Call `listener` after every change, pause, resume, undo, and redo.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Notification<'_>) + Send + 'static,
    {
        self.bus.subscribe(Box::new(listener) as Listener)
    }

    /// Call `listener` whenever an operation touches the container at the
    /// dotted `path` (`""` for the root, `"todos.0"` for the first todo).
    pub fn subscribe_path<F>(&mut self, path: &str, listener: F) -> SubscriptionId
    where
        F: FnMut(&Notification<'_>) + Send + 'static,
    {
        self.bus.subscribe_path(path, Box::new(listener) as Listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("history", &self.history)
            .field("bus", &self.bus)
            .field("config", &self.config)
            .field("processor", &self.processor.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::DraftStrategy;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn store(initial: serde_json::Value) -> Store {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        Store::new(Value::from(initial))
    }

    type Log = Arc<Mutex<Vec<String>>>;

    fn log_into(log: &Log, name: &'static str) -> impl FnMut(&Notification<'_>) + Send + 'static {
        let log = Arc::clone(log);
        move |n: &Notification<'_>| {
            let entry = match n.path {
                Some(path) => format!("{name}:{}@{path}", n.kind),
                None => format!("{name}:{}", n.kind),
            };
            log.lock().unwrap().push(entry);
        }
    }

    // -----------------------------------------------------------------------
    // Scenarios
    // -----------------------------------------------------------------------

    #[test]
    fn fruits_undo_redo() {
        let mut s = store(json!({"fruits": ["apple"]}));
        s.mutate(|state| state["fruits"] = Value::from(json!(["apple", "pear"])))
            .unwrap();
        assert_eq!(s.state()["fruits"], json!(["apple", "pear"]));

        s.undo().unwrap();
        assert_eq!(s.state()["fruits"], json!(["apple"]));

        s.redo().unwrap();
        assert_eq!(s.state()["fruits"], json!(["apple", "pear"]));
    }

    #[test]
    fn nested_array_edits_undo() {
        let mut s = store(json!({"options": [[1, 0]]}));
        s.mutate(|state| {
            state["options"][0][0] = Value::from(2);
            state["options"][1] = Value::from(json!([1, 1]));
        })
        .unwrap();
        assert_eq!(s.state()["options"], json!([[2, 0], [1, 1]]));

        s.undo().unwrap();
        assert_eq!(s.state()["options"], json!([[1, 0]]));
    }

    #[test]
    fn two_pops_in_one_mutation() {
        let mut s = store(json!({"fruits": ["apple", "pear", "kiwi"]}));
        s.mutate(|state| {
            state["fruits"].pop().unwrap();
            state["fruits"].pop().unwrap();
        })
        .unwrap();
        assert_eq!(s.state()["fruits"], json!(["apple"]));
        assert_eq!(s.state()["fruits"].len(), 1);

        s.undo().unwrap();
        assert_eq!(s.state()["fruits"], json!(["apple", "pear", "kiwi"]));
    }

    #[test]
    fn splicing_the_middle_of_an_array() {
        let mut s = store(json!({"todos": ["a", "b", "c", "d"]}));
        s.mutate(|state| {
            state["todos"].remove_at(1).unwrap();
            state["todos"].insert_at(0, "z").unwrap();
        })
        .unwrap();
        assert_eq!(s.state()["todos"], json!(["z", "a", "c", "d"]));

        s.undo().unwrap();
        assert_eq!(s.state()["todos"], json!(["a", "b", "c", "d"]));
    }

    // -----------------------------------------------------------------------
    // History laws
    // -----------------------------------------------------------------------

    #[test]
    fn n_undos_then_n_redos() {
        let initial = json!({"count": 0, "log": []});
        let mut s = store(initial.clone());
        for i in 1..=5 {
            s.mutate(|state| {
                state["count"] = Value::from(i);
                state["log"].push(i).unwrap();
            })
            .unwrap();
        }
        let last = s.state().clone();
        assert_eq!(s.history_len(), 5);

        for _ in 0..5 {
            s.undo().unwrap();
        }
        assert_eq!(s.state(), &initial);
        assert!(!s.get_can_undo());

        for _ in 0..5 {
            s.redo().unwrap();
        }
        assert_eq!(s.state(), &last);
        assert!(!s.get_can_redo());
    }

    #[test]
    fn mutating_after_undo_discards_redo() {
        let mut s = store(json!({"n": 0}));
        s.mutate(|state| state["n"] = Value::from(1)).unwrap();
        s.mutate(|state| state["n"] = Value::from(2)).unwrap();
        s.undo().unwrap();
        assert!(s.get_can_redo());

        s.mutate(|state| state["n"] = Value::from(10)).unwrap();
        assert!(!s.get_can_redo());
        s.redo().unwrap();
        assert_eq!(s.state()["n"], json!(10));
    }

    #[test]
    fn undo_and_redo_with_nothing_to_do_are_no_ops() {
        let mut s = store(json!({"n": 0}));
        s.undo().unwrap().redo().unwrap();
        assert_eq!(s.state(), &json!({"n": 0}));
        assert_eq!(s.pointer(), None);
    }

    #[test]
    fn pause_batches_mutations_into_one_entry() {
        let mut s = store(json!({"x": 0, "y": 0, "trail": []}));
        s.pause();
        assert!(s.get_is_paused());
        s.mutate(|state| {
            state["x"] = Value::from(1);
            state["trail"].push(1).unwrap();
        })
        .unwrap();
        s.mutate(|state| {
            state["y"] = Value::from(1);
            state["trail"].pop().unwrap();
        })
        .unwrap();
        assert!(s.is_dirty());
        assert_eq!(s.history_len(), 0);
        assert_eq!(s.state(), &json!({"x": 1, "y": 1, "trail": []}));

        s.resume();
        assert!(!s.get_is_paused());
        assert!(!s.is_dirty());
        assert_eq!(s.history_len(), 1);

        s.undo().unwrap();
        assert_eq!(s.state(), &json!({"x": 0, "y": 0, "trail": []}));
        s.redo().unwrap();
        assert_eq!(s.state(), &json!({"x": 1, "y": 1, "trail": []}));
    }

    #[test]
    fn pending_change_is_undoable_before_resume() {
        let mut s = store(json!({"x": 0}));
        s.pause();
        assert!(!s.get_can_undo());
        s.mutate(|state| state["x"] = Value::from(5)).unwrap();
        assert_eq!(s.pointer(), None);
        assert!(s.get_can_undo());

        s.undo().unwrap();
        assert_eq!(s.state()["x"], json!(0));
        assert!(!s.get_is_paused());
        assert!(s.get_can_redo());
    }

    #[test]
    fn history_limit_from_config() {
        let mut s = Store::with_config(Value::from(json!({"n": 0})), StoreConfig::bounded(3));
        for n in 1..=10 {
            s.mutate(|state| state["n"] = Value::from(n)).unwrap();
        }
        assert_eq!(s.history_len(), 3);
        for _ in 0..10 {
            s.undo().unwrap();
        }
        assert_eq!(s.state()["n"], json!(7));
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    #[test]
    fn untouched_siblings_are_shared() {
        let mut s = store(json!({"a": {"b": {"leaf": 1}}, "c": {"big": [1, 2, 3]}}));
        let before = s.state().clone();
        s.mutate(|state| state["a"]["b"]["leaf"] = Value::from(2)).unwrap();

        assert!(s.state()["c"].ptr_eq(&before["c"]));
        assert!(!s.state()["a"].ptr_eq(&before["a"]));
        assert_eq!(before["a"]["b"]["leaf"], json!(1));
    }

    #[test]
    fn deep_clone_drafts_still_share_untouched_subtrees() {
        let config = StoreConfig {
            draft: DraftStrategy::DeepClone,
            ..Default::default()
        };
        let mut s = Store::with_config(Value::from(json!({"a": {"x": 1}, "c": {"y": 1}})), config);
        let before = s.state().clone();
        s.mutate(|state| state["a"]["x"] = Value::from(2)).unwrap();
        assert!(s.state()["c"].ptr_eq(&before["c"]));
        assert_eq!(s.state()["a"]["x"], json!(2));
    }

    #[test]
    fn failed_mutator_changes_nothing() {
        let mut s = store(json!({"n": 0}));
        s.mutate(|state| state["n"] = Value::from(1)).unwrap();
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        s.subscribe(move |_: &Notification<'_>| *counter.lock().unwrap() += 1);

        let err = s
            .try_mutate(|state| {
                state["n"] = Value::from(99);
                Err("validation failed")
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Mutator(_)));
        assert_eq!(err.to_string(), "mutator failed: validation failed");

        assert_eq!(s.state()["n"], json!(1));
        assert_eq!(s.history_len(), 1);
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn no_op_mutation_records_nothing() {
        let mut s = store(json!({"n": 0}));
        s.mutate(|state| state["n"] = Value::from(0)).unwrap();
        assert_eq!(s.history_len(), 0);
        assert!(!s.get_can_undo());
    }

    #[test]
    fn update_commits_the_draft() {
        let mut s = store(json!({"user": {"address": {"street": "Elm"}}, "other": {}}));
        let before = s.state().clone();
        s.update(|state| state["user"]["address"]["street"] = Value::from("Main"));

        assert_eq!(s.state()["user"]["address"]["street"], json!("Main"));
        assert_eq!(before["user"]["address"]["street"], json!("Elm"));
        assert!(s.state()["other"].ptr_eq(&before["other"]));

        s.undo().unwrap();
        assert_eq!(s.state()["user"]["address"]["street"], json!("Elm"));
    }

    #[test]
    fn try_update_propagates_errors() {
        let mut s = store(json!({"n": 0}));
        let result = s.try_update(|state| {
            state["n"] = Value::from(1);
            Err(std::fmt::Error)
        });
        assert!(matches!(result, Err(StoreError::Mutator(_))));
        assert_eq!(s.state()["n"], json!(0));
    }

    #[test]
    fn processor_runs_before_diffing() {
        let mut s = store(json!({"items": [], "count": 0})).with_processor(|mut state| {
            let count = state["items"].len();
            state["count"] = Value::from(count);
            state
        });
        s.mutate(|state| state["items"].push("a").unwrap()).unwrap();
        assert_eq!(s.state()["count"], json!(1));

        s.undo().unwrap();
        assert_eq!(s.state(), &json!({"items": [], "count": 0}));
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    #[test]
    fn change_notifies_any_then_touched_paths() {
        let log = Log::default();
        let mut s = store(json!({"user": {"name": "Steve"}, "settings": {"dark": false}}));
        s.subscribe_path("user", log_into(&log, "user"));
        s.subscribe_path("settings", log_into(&log, "settings"));
        s.subscribe_path("", log_into(&log, "root"));
        s.subscribe(log_into(&log, "any"));

        s.mutate(|state| state["user"]["name"] = Value::from("Ana")).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["any:change", "root:change@", "user:change@user"]
        );
    }

    #[test]
    fn every_operation_notifies() {
        let log = Log::default();
        let mut s = store(json!({"n": 0}));
        s.subscribe(log_into(&log, "any"));

        s.pause();
        s.mutate(|state| state["n"] = Value::from(1)).unwrap();
        s.resume();
        s.undo().unwrap();
        s.redo().unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["any:pause", "any:change", "any:resume", "any:undo", "any:redo"]
        );
    }

    #[test]
    fn listeners_see_the_new_state_and_patch() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut s = store(json!({"n": 0}));
        s.subscribe(move |n: &Notification<'_>| {
            let ops: usize = n.patches.iter().map(Patch::len).sum();
            sink.lock().unwrap().push((n.state["n"].to_json(), ops));
        });

        s.mutate(|state| state["n"] = Value::from(1)).unwrap();
        s.undo().unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![(json!(1), 1), (json!(0), 1)]);
    }

    #[test]
    fn path_listener_reads_its_subtree() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut s = store(json!({"todos": [{"done": false}]}));
        s.subscribe_path("todos.0", move |n: &Notification<'_>| {
            if let Some(todo) = n.value() {
                sink.lock().unwrap().push(todo["done"].to_json());
            }
        });

        s.mutate(|state| state["todos"][0]["done"] = Value::from(true)).unwrap();
        s.undo().unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![json!(true), json!(false)]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let log = Log::default();
        let mut s = store(json!({"n": 0}));
        let id = s.subscribe(log_into(&log, "any"));
        s.mutate(|state| state["n"] = Value::from(1)).unwrap();
        assert!(s.unsubscribe(id));
        s.mutate(|state| state["n"] = Value::from(2)).unwrap();
        assert_eq!(log.lock().unwrap().len(), 1);
    }
}
