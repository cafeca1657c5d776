//! Run specification from a legacy control file.

use wr_dict::{ControlFile, DictResult};

use crate::schema::{DEFAULT_INIT_COMMAND, DEFAULT_SOLVER, RunSpec};

/// Read every sweep setting from `cf`.
///
/// `reuseArchive` defaults to the opposite of `restoreArchived`: without
/// the key, archived pairs are skipped unless they are to be restored.
pub fn from_control_file(cf: &ControlFile) -> DictResult<RunSpec> {
    let restore_archived = cf.opt_bool("restoreArchived")?.unwrap_or(false);
    Ok(RunSpec {
        wspeeds: cf.float_list("wspeeds")?,
        wdirs: cf.float_list("wdirs")?,
        z0: cf.float_list("z0")?,
        iterations: cf.int("iterations")?,
        solver: cf
            .opt_string("solver")
            .unwrap_or_else(|| DEFAULT_SOLVER.to_string()),
        initialize: cf
            .opt_string_list("initialize")
            .unwrap_or_else(|| vec![DEFAULT_INIT_COMMAND.to_string()]),
        flow_archive_dir_name: cf.string("flowArchiveDirName")?,
        fields_to_archive: cf.string_list("fieldsToArchive")?,
        restore_archived,
        reuse_archive: cf.opt_bool("reuseArchive")?.unwrap_or(!restore_archived),
        nodes: cf.opt_int("nodes")?,
        cpus: cf.opt_int("CPUs")?,
        compress: cf.opt_bool("compress")?.unwrap_or(false),
        continue_on_failure: cf.opt_bool("continueOnFailure")?.unwrap_or(false),
        boundary_templates: Vec::new(),
    })
}
