//! Durable per-endpoint verdict records across runs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::probe::{ProbeReason, Verdict};

/// Last observed verdict for one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    pub healthy: bool,
    pub reason: ProbeReason,
    pub updated_at: DateTime<Utc>,
}

impl StateRecord {
    pub fn from_verdict(verdict: &Verdict) -> Self {
        Self {
            healthy: verdict.healthy,
            reason: verdict.reason,
            updated_at: verdict.observed_at,
        }
    }
}

/// Endpoint key -> last observed record. At most one record per key.
pub type StateMap = BTreeMap<String, StateRecord>;

/// File-backed store for the state map.
///
/// The whole map is rewritten on every save; endpoints no longer configured
/// drop out of the file.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted map.
    ///
    /// A missing or unreadable file is a first run or a lost cache, not a
    /// failure: both yield an empty map.
    pub fn load(&self) -> StateMap {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No state file at {:?}, starting empty", self.path);
                return StateMap::new();
            }
            Err(e) => {
                tracing::warn!("Failed to read state file {:?}: {}", self.path, e);
                return StateMap::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(
                    "State file {:?} is corrupt ({}), starting empty",
                    self.path,
                    e
                );
                StateMap::new()
            }
        }
    }

    /// Persist the full map, atomically enough that a crash mid-write never
    /// mixes stale and fresh records: write to a sibling temp file, then
    /// rename over the target.
    pub fn save(&self, map: &StateMap) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut content = serde_json::to_string_pretty(map)?;
        content.push('\n');

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!("Saved {} state records to {:?}", map.len(), self.path);
        Ok(())
    }
}
