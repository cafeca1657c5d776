//! Default control file.

use std::path::Path;

use crate::{ProjectError, ProjectResult};

pub const DEFAULT_CONTROL_FILE: &str = "\
#===============Template for controlfile==================
#--------------Meteorology---------------
# z0: one value, or one value per wind direction
z0: 0.1
wspeeds: 3.0
wdirs: 0 45 90 135 180 225 270 315

#---------------Numerics-----------------
iterations: 20
solver: windFoam
initialize: setWindInlet

#---------------Archives-----------------
flowArchiveDirName: flowArchive
fieldsToArchive: U p epsilon k
restoreArchived: False
# reuseArchive defaults to the opposite of restoreArchived
#reuseArchive: True

#--------------Computation----------------
# CPUs wins over nodes; nodes alone means 16 processes per node
#nodes: 1
CPUs: 1
continueOnFailure: False

#----------------Output-------------------
compress: False

#=========================================================
";

/// Write [`DEFAULT_CONTROL_FILE`] to `path`; an existing file is kept
/// unless `force` is set.
pub fn write_template(path: &Path, force: bool) -> ProjectResult<()> {
    if path.exists() && !force {
        return Err(ProjectError::TemplateExists {
            path: path.to_path_buf(),
        });
    }
    std::fs::write(path, DEFAULT_CONTROL_FILE)?;
    Ok(())
}
