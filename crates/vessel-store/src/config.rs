//! Store configuration.

use serde::{Deserialize, Serialize};

use crate::draft::DraftStrategy;
use crate::error::{StoreError, StoreResult};

/// Configuration for a [`Store`](crate::Store).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// How mutation drafts are created.
    pub draft: DraftStrategy,
    /// Maximum number of history entries kept. The oldest are evicted once
    /// exceeded. `None` keeps everything.
    pub history_limit: Option<usize>,
}

impl StoreConfig {
    /// A configuration keeping at most `limit` history entries.
    pub fn bounded(limit: usize) -> Self {
        Self {
            history_limit: Some(limit),
            ..Default::default()
        }
    }

    /// Parse a configuration from TOML. Missing fields take their defaults.
    pub fn from_toml_str(input: &str) -> StoreResult<Self> {
        toml::from_str(input).map_err(|e| StoreError::Config(e.to_string()))
    }
}
