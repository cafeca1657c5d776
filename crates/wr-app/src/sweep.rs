//! Wind sweep execution.
//!
//! Speeds form the outer loop and directions the inner loop. Each pair
//! mutates the initial fields, runs the external tools, records
//! convergence data and archives the latest time. The case is pruned and
//! the initial fields restored after every pair, on success, error or
//! panic alike.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{Span, info, warn};
use wr_bc::BoundaryTemplates;
use wr_case::{CaseHandler, CaseLock};
use wr_core::{deg, mps};
use wr_dict::{DictionaryFile, logical_name};
use wr_project::{RunSpec, validate_spec};
use wr_results::{
    Archive, ArchiveKey, ConvergenceTable, ManifestStore, PairOutcome, analyze_solver_log,
    compute_spec_hash,
};

use crate::abl::update_abl_conditions;
use crate::error::{AppError, AppResult};
use crate::external::ExternalTools;
use crate::progress::{SweepProgressEvent, SweepStage};

/// Residual tables recorded after each solver run.
pub const RESIDUAL_FIELDS: [&str; 4] = ["linear_Ux", "linear_Uy", "linear_k", "linear_epsilon"];

/// Probe tables recorded after each solver run.
pub const PROBE_FIELDS: [&str; 4] = ["U", "k", "epsilon", "p"];

const ABL_INCLUDE: &str = "include/ABLConditions";

/// What happens to the sweep when one pair fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the sweep and return the error.
    #[default]
    Abort,
    /// Record the failure and go on with the next pair.
    Continue,
}

#[derive(Debug, Clone)]
pub struct SweepOptions {
    pub failure_policy: FailurePolicy,
    /// Checked between pairs; setting it stops the sweep after the
    /// current pair.
    pub cancel: Option<Arc<AtomicBool>>,
    pub span: Span,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            cancel: None,
            span: Span::none(),
        }
    }
}

impl SweepOptions {
    /// Abort or continue according to `continue_on_failure`.
    pub fn for_spec(spec: &RunSpec) -> Self {
        Self {
            failure_policy: if spec.continue_on_failure {
                FailurePolicy::Continue
            } else {
                FailurePolicy::Abort
            },
            ..Self::default()
        }
    }
}

pub struct SweepRequest<'a> {
    pub case_root: &'a Path,
    pub spec: &'a RunSpec,
    pub options: SweepOptions,
}

#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub archive_dir: PathBuf,
    pub completed: Vec<ArchiveKey>,
    pub cached: Vec<ArchiveKey>,
    pub failed: Vec<(ArchiveKey, String)>,
    pub solver_runs: usize,
    pub cancelled: bool,
    pub elapsed_wall_s: f64,
}

struct Progress<'a> {
    cb: Option<&'a mut dyn FnMut(SweepProgressEvent)>,
    started: Instant,
    total_runs: usize,
}

impl Progress<'_> {
    fn emit(
        &mut self,
        stage: SweepStage,
        key: Option<ArchiveKey>,
        run_index: usize,
        message: Option<String>,
    ) {
        if let Some(cb) = self.cb.as_deref_mut() {
            cb(SweepProgressEvent {
                stage,
                key,
                run_index,
                total_runs: self.total_runs,
                elapsed_wall_s: self.started.elapsed().as_secs_f64(),
                message,
            });
        }
    }
}

/// Restores the original text of a dictionary when dropped.
struct DictionaryScope {
    dict: DictionaryFile,
    span: Span,
}

impl Drop for DictionaryScope {
    fn drop(&mut self) {
        if let Err(e) = self.dict.restore_original() {
            warn!(
                parent: &self.span,
                file = %self.dict.path().display(),
                error = %e,
                "could not restore dictionary"
            );
        }
    }
}

/// Gives access to the case for one pair; prunes results and restores the
/// initial fields when finished or dropped.
struct CaseScope<'a> {
    case: &'a mut CaseHandler,
    armed: bool,
    span: Span,
}

impl<'a> CaseScope<'a> {
    fn new(case: &'a mut CaseHandler, span: Span) -> Self {
        Self {
            case,
            armed: true,
            span,
        }
    }

    fn reset(case: &mut CaseHandler) -> AppResult<()> {
        case.prune_times(None, None)?;
        case.restore_initial_fields()?;
        Ok(())
    }

    /// Restore now and report errors instead of logging them.
    fn finish(mut self) -> AppResult<()> {
        self.armed = false;
        Self::reset(self.case)
    }
}

impl Deref for CaseScope<'_> {
    type Target = CaseHandler;

    fn deref(&self) -> &CaseHandler {
        self.case
    }
}

impl DerefMut for CaseScope<'_> {
    fn deref_mut(&mut self) -> &mut CaseHandler {
        self.case
    }
}

impl Drop for CaseScope<'_> {
    fn drop(&mut self) {
        if self.armed
            && let Err(e) = Self::reset(self.case)
        {
            warn!(parent: &self.span, error = %e, "could not restore initial fields");
        }
    }
}

fn is_compressed_output(write_compression: Option<&str>) -> bool {
    matches!(
        write_compression.map(str::to_ascii_lowercase).as_deref(),
        Some("on" | "compressed" | "yes" | "true")
    )
}

/// Execute a sweep.
pub fn run_sweep(request: &SweepRequest, tools: &mut dyn ExternalTools) -> AppResult<SweepReport> {
    run_sweep_with_progress(request, tools, None)
}

/// Execute a sweep and stream progress events.
pub fn run_sweep_with_progress(
    request: &SweepRequest,
    tools: &mut dyn ExternalTools,
    progress_cb: Option<&mut dyn FnMut(SweepProgressEvent)>,
) -> AppResult<SweepReport> {
    let spec = request.spec;
    let span = request.options.span.clone();
    let case_root = request.case_root;
    let mut progress = Progress {
        cb: progress_cb,
        started: Instant::now(),
        total_runs: spec.total_runs(),
    };
    progress.emit(SweepStage::Preparing, None, 0, None);

    validate_spec(spec)?;
    let _lock = CaseLock::acquire(case_root)?;

    let mut templates = BoundaryTemplates::new(span.clone());
    spec.apply_templates(&mut templates);
    let mut case = CaseHandler::open(case_root, span.clone())?.with_templates(templates);
    case.first_time()?;

    let archive = Archive::open(
        case_root,
        &spec.flow_archive_dir_name,
        spec.compress,
        span.clone(),
    )?;
    let mut table = ConvergenceTable::new(case_root, span.clone())?;
    let manifest_store = ManifestStore::new(archive.path());
    let mut manifest = manifest_store.load_or_new(&compute_spec_hash(spec))?;

    info!(
        parent: &span,
        case = %case.name(),
        wdirs = ?spec.wdirs,
        wspeeds = ?spec.wspeeds,
        runs = spec.total_runs(),
        iterations = spec.iterations,
        processes = spec.processes(),
        fields = ?spec.fields_to_archive,
        "starting wind sweep"
    );

    case.backup_initial_fields()?;

    let mut control = DictionaryScope {
        dict: DictionaryFile::open(&case.control_dict_path())?,
        span: span.clone(),
    };
    let compressed_output = is_compressed_output(control.dict.get("writeCompression")?.as_deref());
    control.dict.set("stopAt", "nextWrite")?;

    if spec.is_parallel() {
        let decompose_dict = case.decompose_par_dict_path();
        if decompose_dict.is_file() {
            let mut dict = DictionaryFile::open(&decompose_dict)?;
            dict.set("numberOfSubdomains", &spec.processes().to_string())?;
        }
    }

    let mut report = SweepReport {
        archive_dir: archive.path().to_path_buf(),
        ..SweepReport::default()
    };

    let mut run_index = 0;
    'sweep: for &speed in &spec.wspeeds {
        for (dir_index, &direction) in spec.wdirs.iter().enumerate() {
            run_index += 1;
            let key = ArchiveKey::new(speed, direction);

            if let Some(cancel) = &request.options.cancel
                && cancel.load(Ordering::SeqCst)
            {
                info!(parent: &span, "sweep cancelled");
                report.cancelled = true;
                progress.emit(SweepStage::Cancelled, Some(key), run_index, None);
                break 'sweep;
            }

            progress.emit(SweepStage::CheckingCache, Some(key), run_index, None);
            if spec.reuse_archive && archive.contains(Some(key.dir_name().as_str()), None)? {
                info!(parent: &span, key = %key, "results already in archive, moving on");
                if manifest.entry(&key).is_none() {
                    manifest.record(key, run_index, PairOutcome::Cached);
                    manifest_store.save(&manifest)?;
                }
                report.cached.push(key);
                progress.emit(SweepStage::SkippedCached, Some(key), run_index, None);
                continue;
            }

            let Some(z0) = spec.z0_for(dir_index) else {
                return Err(AppError::InvalidInput(format!("no z0 for wind direction {direction}")));
            };
            case.prune_times(None, None)?;
            let pair = PairContext {
                spec,
                key,
                run_index,
                z0,
                compressed_output,
                span: &span,
            };

            let outcome = {
                let mut scope = CaseScope::new(&mut case, span.clone());
                let result = run_pair(
                    &pair,
                    &mut scope,
                    &mut control.dict,
                    tools,
                    &archive,
                    &mut table,
                    &mut report,
                    &mut progress,
                );
                progress.emit(SweepStage::RestoringCase, Some(key), run_index, None);
                let restored = scope.finish();
                match (result, restored) {
                    (Ok(outcome), restored) => restored.map(|_| outcome),
                    (Err(e), Ok(())) => Err(e),
                    (Err(e), Err(restore_err)) => {
                        warn!(
                            parent: &span,
                            key = %key,
                            error = %restore_err,
                            "could not restore initial fields after failed run"
                        );
                        Err(e)
                    }
                }
            };

            match outcome {
                Ok(outcome) => {
                    manifest.record(key, run_index, outcome);
                    manifest_store.save(&manifest)?;
                    report.completed.push(key);
                    info!(parent: &span, key = %key, "restored initial fields from backup copy");
                }
                Err(e) => {
                    let e = e.for_pair(speed, direction);
                    let message = e.to_string();
                    progress.emit(
                        SweepStage::PairFailed,
                        Some(key),
                        run_index,
                        Some(message.clone()),
                    );
                    match request.options.failure_policy {
                        FailurePolicy::Abort => return Err(e),
                        FailurePolicy::Continue => {
                            warn!(parent: &span, key = %key, error = %e, "pair failed, continuing");
                            manifest.record(
                                key,
                                run_index,
                                PairOutcome::Failed {
                                    message: message.clone(),
                                },
                            );
                            manifest_store.save(&manifest)?;
                            report.failed.push((key, message));
                        }
                    }
                }
            }
        }
    }

    report.elapsed_wall_s = progress.started.elapsed().as_secs_f64();
    progress.emit(SweepStage::Completed, None, run_index, None);
    info!(
        parent: &span,
        completed = report.completed.len(),
        cached = report.cached.len(),
        failed = report.failed.len(),
        "finished batch calculation"
    );
    Ok(report)
}

struct PairContext<'a> {
    spec: &'a RunSpec,
    key: ArchiveKey,
    run_index: usize,
    z0: f64,
    compressed_output: bool,
    span: &'a Span,
}

#[allow(clippy::too_many_arguments)]
fn run_pair(
    pair: &PairContext,
    case: &mut CaseScope<'_>,
    control: &mut DictionaryFile,
    tools: &mut dyn ExternalTools,
    archive: &Archive,
    table: &mut ConvergenceTable,
    report: &mut SweepReport,
    progress: &mut Progress<'_>,
) -> AppResult<PairOutcome> {
    let spec = pair.spec;
    let key = pair.key;
    let idx = pair.run_index;
    let span = pair.span;
    let root = case.root().to_path_buf();
    let initial_label = case.first_time()?.label.clone();
    let initial_dir = case.initial_dir()?;

    info!(parent: span, direction = key.direction, speed = key.speed, "running calculations");
    progress.emit(SweepStage::ModifyingBoundaries, Some(key), idx, None);
    control.set("writeInterval", &spec.iterations.to_string())?;
    case.rewrite_boundary_for_direction(&initial_label, key.direction)?;
    update_abl_conditions(
        &initial_dir.join(ABL_INCLUDE),
        mps(key.speed),
        deg(key.direction),
        pair.z0,
        span,
    )?;

    progress.emit(SweepStage::Initializing, Some(key), idx, None);
    for command in &spec.initialize {
        tools.run_utility(&root, command)?;
    }

    let dir_name = key.dir_name();
    if spec.restore_archived && archive.contains(Some(dir_name.as_str()), None)? {
        progress.emit(SweepStage::RestoringArchived, Some(key), idx, None);
        archive.restore(&dir_name, &initial_dir, Some(spec.fields_to_archive.as_slice()))?;
        info!(parent: span, key = %key, "restored archived flow fields");
    }

    let processes = spec.processes();
    if processes > 1 {
        progress.emit(SweepStage::Decomposing, Some(key), idx, None);
        tools.decompose(&root)?;
    }

    progress.emit(SweepStage::Solving, Some(key), idx, None);
    report.solver_runs += 1;
    tools.run_solver(&root, &spec.solver, processes)?;

    if processes > 1 {
        progress.emit(SweepStage::Reconstructing, Some(key), idx, None);
        tools.reconstruct(&root)?;
        case.remove_processor_dirs()?;
    }

    progress.emit(SweepStage::RecordingConvergence, Some(key), idx, None);
    analyze_solver_log(&root, &spec.solver)?;
    let run_id = key.run_id();
    for field in RESIDUAL_FIELDS {
        table.add_residual(&run_id, &spec.solver, field, idx)?;
    }
    for field in PROBE_FIELDS {
        table.add_probes(&run_id, field, idx)?;
    }
    table.flush()?;

    progress.emit(SweepStage::Archiving, Some(key), idx, None);
    case.reread()?;
    let latest = case.latest_time()?.label.clone();
    if latest == initial_label {
        return Err(AppError::NoSolverOutput {
            speed: key.speed,
            direction: key.direction,
        });
    }
    let latest_dir = case.latest_dir()?;
    info!(parent: span, dir = %latest_dir.display(), "archiving results");

    let available = case.list_fields_at(&latest)?;
    let mut files = Vec::new();
    for field in &spec.fields_to_archive {
        let gz = format!("{field}.gz");
        let (first, second) = if pair.compressed_output { (&gz, field) } else { (field, &gz) };
        let name = [first, second].into_iter().find(|n| available.contains(n));
        match name {
            Some(name) => {
                archive.add_file(&latest_dir.join(name), Some(dir_name.as_str()))?;
                files.push(logical_name(name).to_string());
            }
            None => {
                warn!(parent: span, field = %field, time = %latest, "field to archive not written")
            }
        }
    }

    info!(parent: span, key = %key, last_time = %latest, "finished pair");
    Ok(PairOutcome::Archived {
        latest_time: latest,
        files,
    })
}
