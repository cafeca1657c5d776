//! Sweep manifest storage.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::SweepManifest;
use crate::{ResultsError, ResultsResult};

pub const MANIFEST_FILE_NAME: &str = "sweep_manifest.json";

#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(archive_dir: &Path) -> Self {
        Self {
            path: archive_dir.join(MANIFEST_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> ResultsResult<Option<SweepManifest>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| ResultsError::io(&self.path, e))?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Existing manifest when it was written for `spec_hash`, otherwise a
    /// fresh one.
    pub fn load_or_new(&self, spec_hash: &str) -> ResultsResult<SweepManifest> {
        match self.load()? {
            Some(manifest) if manifest.spec_hash == spec_hash => Ok(manifest),
            _ => Ok(SweepManifest::new(spec_hash)),
        }
    }

    pub fn save(&self, manifest: &SweepManifest) -> ResultsResult<()> {
        let json = serde_json::to_string_pretty(manifest)?;
        fs::write(&self.path, json).map_err(|e| ResultsError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArchiveKey, PairOutcome};

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(tmp.path());
        assert!(store.load().unwrap().is_none());

        let mut manifest = SweepManifest::new("h1");
        manifest.record(ArchiveKey::new(3.0, 0.0), 1, PairOutcome::Cached);
        store.save(&manifest).unwrap();

        let loaded = store.load_or_new("h1").unwrap();
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.entries[0].key, "wspeed_3.0_wdir_0");

        assert!(store.load_or_new("h2").unwrap().entries.is_empty());
    }
}
