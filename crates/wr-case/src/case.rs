//! Case directory handling.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{Span, debug, info};
use wr_bc::{BoundaryTemplates, FieldKind, Octant, Patch, role_for};
use wr_core::parse_time_label;
use wr_dict::{ReadMode, logical_name};

use crate::boundary::{read_patch_type, rewrite_patch};
use crate::fs_util::{copy_dir, copy_dir_filtered, remove_dir_if_exists};
use crate::{CaseError, CaseResult};

/// Default name of the initial-field backup inside the case.
pub const BACKUP_DIR_NAME: &str = "backupInitialDir";

const PROCESSOR_PREFIX: &str = "processor";

/// A time directory: its on-disk name and numeric value.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeDir {
    pub label: String,
    pub value: f64,
}

/// Editor backups (`.bak`), swap files (`~`) and disabled files (`#...`).
pub fn is_field_artifact(name: &str) -> bool {
    name.contains(".bak") || name.contains('~') || name.starts_with('#')
}

fn is_backup_artifact(name: &str) -> bool {
    name.ends_with(".bak") || name.contains('~')
}

/// Owns one case directory.
///
/// The list of time directories is cached; operations that add or remove
/// time directories outside this handler must be followed by [`reread`].
///
/// [`reread`]: CaseHandler::reread
#[derive(Debug)]
pub struct CaseHandler {
    root: PathBuf,
    backup_dir: PathBuf,
    times: Vec<TimeDir>,
    templates: BoundaryTemplates,
    span: Span,
}

impl CaseHandler {
    pub fn open(root: &Path, span: Span) -> CaseResult<Self> {
        let mut handler = Self {
            root: root.to_path_buf(),
            backup_dir: root.join(BACKUP_DIR_NAME),
            times: Vec::new(),
            templates: BoundaryTemplates::new(span.clone()),
            span,
        };
        handler.reread()?;
        Ok(handler)
    }

    pub fn with_templates(mut self, templates: BoundaryTemplates) -> Self {
        self.templates = templates;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn templates(&self) -> &BoundaryTemplates {
        &self.templates
    }

    pub fn system_dir(&self) -> PathBuf {
        self.root.join("system")
    }

    pub fn control_dict_path(&self) -> PathBuf {
        self.system_dir().join("controlDict")
    }

    pub fn decompose_par_dict_path(&self) -> PathBuf {
        self.system_dir().join("decomposeParDict")
    }

    /// Refresh the cached list of time directories.
    pub fn reread(&mut self) -> CaseResult<()> {
        let mut times = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(|e| CaseError::io(&self.root, e))? {
            let entry = entry.map_err(|e| CaseError::io(&self.root, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            let label = entry.file_name().to_string_lossy().to_string();
            if let Ok(value) = parse_time_label(&label) {
                times.push(TimeDir { label, value });
            }
        }
        times.sort_by(|a, b| a.value.total_cmp(&b.value));
        self.times = times;
        Ok(())
    }

    /// Time directories in ascending numeric order.
    pub fn times(&self) -> &[TimeDir] {
        &self.times
    }

    pub fn time_labels(&self) -> Vec<String> {
        self.times.iter().map(|t| t.label.clone()).collect()
    }

    pub fn first_time(&self) -> CaseResult<&TimeDir> {
        self.times.first().ok_or_else(|| CaseError::NoTimeDirectories {
            path: self.root.clone(),
        })
    }

    pub fn latest_time(&self) -> CaseResult<&TimeDir> {
        self.times.last().ok_or_else(|| CaseError::NoTimeDirectories {
            path: self.root.clone(),
        })
    }

    pub fn time_dir(&self, label: &str) -> PathBuf {
        self.root.join(label)
    }

    /// Directory of the first (initial) time.
    pub fn initial_dir(&self) -> CaseResult<PathBuf> {
        Ok(self.time_dir(&self.first_time()?.label))
    }

    pub fn latest_dir(&self) -> CaseResult<PathBuf> {
        Ok(self.time_dir(&self.latest_time()?.label))
    }

    /// Delete every time directory outside `[keep_after, keep_before]`.
    ///
    /// A missing bound defaults to the first time, so calling this with no
    /// bounds deletes every result and keeps only the initial directory.
    /// Returns the labels that were removed.
    pub fn prune_times(
        &mut self,
        keep_after: Option<f64>,
        keep_before: Option<f64>,
    ) -> CaseResult<Vec<String>> {
        self.reread()?;
        let first = self.first_time()?.value;
        let lower = keep_after.unwrap_or(first);
        let upper = keep_before.unwrap_or(first);

        let mut removed = Vec::new();
        for time in &self.times {
            if time.value < lower || time.value > upper {
                let dir = self.time_dir(&time.label);
                fs::remove_dir_all(&dir).map_err(|e| CaseError::io(&dir, e))?;
                removed.push(time.label.clone());
            }
        }
        if !removed.is_empty() {
            debug!(parent: &self.span, removed = ?removed, "pruned time directories");
        }

        self.reread()?;
        Ok(removed)
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn has_backup(&self) -> bool {
        self.backup_dir.is_dir()
    }

    /// Copy the initial directory into the backup location.
    ///
    /// Does nothing when a backup already exists. Returns whether a backup
    /// was made.
    pub fn backup_initial_fields(&self) -> CaseResult<bool> {
        if self.has_backup() {
            return Ok(false);
        }
        let initial = self.initial_dir()?;
        copy_dir_filtered(&initial, &self.backup_dir, &|name| !is_backup_artifact(name))?;
        info!(
            parent: &self.span,
            backup = %self.backup_dir.display(),
            "backup made of initial fields"
        );
        Ok(true)
    }

    /// Replace the initial directory with the backup.
    ///
    /// The backup is first copied next to the initial directory and then
    /// renamed into place, so an interrupted restore never leaves a
    /// half-copied initial directory behind.
    pub fn restore_initial_fields(&self) -> CaseResult<()> {
        if !self.has_backup() {
            return Err(CaseError::BackupMissing {
                path: self.backup_dir.clone(),
            });
        }
        let label = &self.first_time()?.label;
        let initial = self.time_dir(label);
        let staging = self.root.join(format!(".{label}.restore"));

        remove_dir_if_exists(&staging)?;
        copy_dir(&self.backup_dir, &staging)?;
        remove_dir_if_exists(&initial)?;
        fs::rename(&staging, &initial).map_err(|e| CaseError::io(&initial, e))?;

        debug!(parent: &self.span, "restored initial fields from backup");
        Ok(())
    }

    /// Field files at `label`, sorted by name.
    pub fn list_fields_at(&self, label: &str) -> CaseResult<Vec<String>> {
        let dir = self.time_dir(label);
        if !dir.is_dir() {
            return Err(CaseError::UnknownTime {
                label: label.to_string(),
                path: self.root.clone(),
            });
        }

        let mut fields = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| CaseError::io(&dir, e))? {
            let entry = entry.map_err(|e| CaseError::io(&dir, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.path().is_file() && !is_field_artifact(&name) {
                fields.push(name);
            }
        }
        fields.sort();
        Ok(fields)
    }

    /// Rewrite the north/east/south/west patch blocks of every field at
    /// `label` for wind coming from `degrees`.
    ///
    /// All new contents are computed before any file is written, so an
    /// invalid direction, a missing patch or an unhandled condition leaves
    /// the time directory untouched.
    pub fn rewrite_boundary_for_direction(&self, label: &str, degrees: f64) -> CaseResult<Octant> {
        let octant = Octant::from_degrees(degrees)?;
        let dir = self.time_dir(label);

        let mut rewritten = Vec::new();
        for file_name in self.list_fields_at(label)? {
            let path = dir.join(&file_name);
            let kind = FieldKind::from_field_name(logical_name(&file_name));
            let context = path.display().to_string();

            let mut content = wr_dict::read(&path, ReadMode::Raw)?;
            for patch in Patch::ALL {
                let role = role_for(octant, patch);
                let condition = self.templates.condition_for(&kind, role)?;
                content = rewrite_patch(&content, patch.name(), condition, &context)?;
            }
            rewritten.push((path, content));
        }

        for (path, content) in &rewritten {
            wr_dict::write(path, content)?;
        }
        info!(
            parent: &self.span,
            time = label,
            direction = degrees,
            octant = %octant,
            fields = rewritten.len(),
            "boundary conditions modified"
        );
        Ok(octant)
    }

    /// `type` of `patch` in a field file.
    pub fn read_boundary_type(&self, field_path: &Path, patch: &str) -> CaseResult<String> {
        let content = wr_dict::read(field_path, ReadMode::Raw)?;
        read_patch_type(&content, patch)?.ok_or_else(|| {
            CaseError::Dict(wr_dict::DictError::MissingPatchOrPattern {
                pattern: format!("{patch} {{ type ...; }}"),
                context: field_path.display().to_string(),
            })
        })
    }

    /// Remove `processor*` directories left by a decomposed run.
    pub fn remove_processor_dirs(&self) -> CaseResult<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.root).map_err(|e| CaseError::io(&self.root, e))? {
            let entry = entry.map_err(|e| CaseError::io(&self.root, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(PROCESSOR_PREFIX) && entry.path().is_dir() {
                remove_dir_if_exists(&entry.path())?;
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(parent: &self.span, removed, "removed decomposed processor directories");
        }
        Ok(removed)
    }
}
