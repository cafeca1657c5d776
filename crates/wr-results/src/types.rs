//! Result data types.

use std::fmt;

use serde::{Deserialize, Serialize};
use wr_core::{compact_label, decimal_label};

pub type RunId = String;

/// One (wind speed, wind direction) pair of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArchiveKey {
    pub speed: f64,
    pub direction: f64,
}

impl ArchiveKey {
    pub fn new(speed: f64, direction: f64) -> Self {
        Self { speed, direction }
    }

    /// Name of the archive directory holding this pair's fields.
    pub fn dir_name(&self) -> String {
        self.to_string()
    }

    /// Run identifier used in convergence tables (`wd_90_ws_3.0`).
    pub fn run_id(&self) -> RunId {
        format!(
            "wd_{}_ws_{}",
            compact_label(self.direction),
            decimal_label(self.speed)
        )
    }
}

impl fmt::Display for ArchiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wspeed_{}_wdir_{}",
            decimal_label(self.speed),
            compact_label(self.direction)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepManifest {
    pub spec_hash: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub entries: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub key: String,
    pub speed: f64,
    pub direction: f64,
    pub run_index: usize,
    pub finished_at: String,
    pub outcome: PairOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PairOutcome {
    Archived {
        latest_time: String,
        files: Vec<String>,
    },
    Cached,
    Failed {
        message: String,
    },
}

impl SweepManifest {
    pub fn new(spec_hash: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            spec_hash: spec_hash.into(),
            created_at: now.clone(),
            updated_at: now,
            entries: Vec::new(),
        }
    }

    /// Add an entry, replacing an earlier one for the same key.
    pub fn record(&mut self, key: ArchiveKey, run_index: usize, outcome: PairOutcome) {
        let now = chrono::Utc::now().to_rfc3339();
        let key_name = key.dir_name();
        self.entries.retain(|e| e.key != key_name);
        self.entries.push(ManifestEntry {
            key: key_name,
            speed: key.speed,
            direction: key.direction,
            run_index,
            finished_at: now.clone(),
            outcome,
        });
        self.updated_at = now;
    }

    pub fn entry(&self, key: &ArchiveKey) -> Option<&ManifestEntry> {
        let key_name = key.dir_name();
        self.entries.iter().find(|e| e.key == key_name)
    }
}
