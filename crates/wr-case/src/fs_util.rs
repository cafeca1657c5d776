//! Directory copy helpers.

use std::fs;
use std::path::Path;

use crate::{CaseError, CaseResult};

/// Recursively copy `src` into `dst` (created if missing), skipping entries
/// whose file name fails `keep`.
pub fn copy_dir_filtered(src: &Path, dst: &Path, keep: &dyn Fn(&str) -> bool) -> CaseResult<()> {
    fs::create_dir_all(dst).map_err(|e| CaseError::io(dst, e))?;

    for entry in fs::read_dir(src).map_err(|e| CaseError::io(src, e))? {
        let entry = entry.map_err(|e| CaseError::io(src, e))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !keep(&name) {
            continue;
        }
        let from = entry.path();
        let to = dst.join(&name);
        if from.is_dir() {
            copy_dir_filtered(&from, &to, keep)?;
        } else {
            fs::copy(&from, &to).map_err(|e| CaseError::io(&from, e))?;
        }
    }
    Ok(())
}

pub fn copy_dir(src: &Path, dst: &Path) -> CaseResult<()> {
    copy_dir_filtered(src, dst, &|_| true)
}

pub fn remove_dir_if_exists(path: &Path) -> CaseResult<()> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|e| CaseError::io(path, e))?;
    }
    Ok(())
}
