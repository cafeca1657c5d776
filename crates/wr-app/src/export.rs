//! Access to existing archives from the command line tools.

use std::path::Path;

use tracing::Span;
use wr_results::{Archive, ExportMode};

use crate::error::{AppError, AppResult};

/// Open an archive directory that must already exist.
pub fn open_archive(path: &Path, span: Span) -> AppResult<Archive> {
    if !path.is_dir() {
        return Err(AppError::ArchiveNotFound {
            path: path.to_path_buf(),
        });
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            Ok(Archive::open(parent, &name.to_string_lossy(), false, span)?)
        }
        _ => Err(AppError::ArchiveNotFound {
            path: path.to_path_buf(),
        }),
    }
}

/// Make every archived field visible in `dest` as `<field>_<pair>`.
pub fn export_archive(
    archive: &Path,
    dest: &Path,
    mode: ExportMode,
    span: Span,
) -> AppResult<usize> {
    Ok(open_archive(archive, span)?.export_to_runtime(dest, mode)?)
}
