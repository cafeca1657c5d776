//! Point a case at one wind direction without running the solver.

use std::path::PathBuf;

use tracing::{Span, info};
use wr_bc::Octant;
use wr_case::{CaseHandler, CaseLock};
use wr_results::ArchiveKey;

use crate::error::{AppError, AppResult};
use crate::export::open_archive;

#[derive(Debug, Clone)]
pub struct SetDirectionRequest {
    pub case_root: PathBuf,
    /// Wind direction in degrees.
    pub direction: f64,
    /// Wind speed of the archived pair; needed with `archive`.
    pub speed: Option<f64>,
    /// Archive to restore the pair's fields from, relative to the case
    /// unless absolute.
    pub archive: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetDirectionOutcome {
    pub octant: Octant,
    /// Fields copied from the archive into the initial directory.
    pub restored: Vec<String>,
}

/// Remove results, rewrite the initial boundary conditions for the
/// direction and optionally restore archived fields for the pair.
///
/// The initial fields are backed up first unless a backup already exists.
pub fn set_direction(request: &SetDirectionRequest, span: Span) -> AppResult<SetDirectionOutcome> {
    // Check the inputs before touching the case.
    Octant::from_degrees(request.direction)?;
    let archive = match &request.archive {
        Some(archive) => {
            let Some(speed) = request.speed else {
                return Err(AppError::InvalidInput(
                    "a wind speed is needed to restore fields from an archive".to_string(),
                ));
            };
            let path = if archive.is_absolute() {
                archive.clone()
            } else {
                request.case_root.join(archive)
            };
            Some((open_archive(&path, span.clone())?, speed))
        }
        None => None,
    };

    let _lock = CaseLock::acquire(&request.case_root)?;
    let mut case = CaseHandler::open(&request.case_root, span.clone())?;
    case.backup_initial_fields()?;
    case.prune_times(None, None)?;

    let initial = case.first_time()?.label.clone();
    let octant = case.rewrite_boundary_for_direction(&initial, request.direction)?;

    let mut restored = Vec::new();
    if let Some((archive, speed)) = archive {
        let key = ArchiveKey::new(speed, request.direction);
        restored = archive.restore(&key.dir_name(), &case.initial_dir()?, None)?;
        info!(parent: &span, key = %key, files = ?restored, "restored fields from archive");
    }

    Ok(SetDirectionOutcome { octant, restored })
}
