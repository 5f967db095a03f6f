//! Draft creation for mutations.

use serde::{Deserialize, Serialize};

use vessel_types::Value;

/// How a mutation's scratch copy of the snapshot is made.
///
/// The choice only affects how much the draft shares with the live
/// snapshot while the edit function runs; the diff and the committed
/// snapshot are the same either way.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStrategy {
    /// Share the snapshot; containers are copied on first write.
    #[default]
    CopyOnWrite,
    /// Copy the whole tree up front.
    DeepClone,
}

impl DraftStrategy {
    /// Make a scratch copy of `snapshot` that can be edited freely.
    pub fn draft(self, snapshot: &Value) -> Value {
        match self {
            DraftStrategy::CopyOnWrite => snapshot.clone(),
            DraftStrategy::DeepClone => snapshot.deep_clone(),
        }
    }
}
