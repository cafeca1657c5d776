//! Exclusive access to a case directory.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::{CaseError, CaseResult};

pub const LOCK_FILE_NAME: &str = ".windrunner.lock";

/// Held for the duration of a sweep; the lock file is removed on drop.
///
/// A lock left behind by a crashed run has to be removed by hand.
#[derive(Debug)]
pub struct CaseLock {
    path: PathBuf,
}

impl CaseLock {
    pub fn acquire(case_root: &Path) -> CaseResult<Self> {
        let path = case_root.join(LOCK_FILE_NAME);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(CaseError::CaseLocked {
                    path: case_root.to_path_buf(),
                    lock: path,
                });
            }
            Err(e) => return Err(CaseError::io(&path, e)),
        };
        writeln!(file, "{}", std::process::id()).map_err(|e| CaseError::io(&path, e))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CaseLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
