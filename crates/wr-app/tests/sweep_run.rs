//! End-to-end sweeps over a scratch case with fake external tools.

use std::fs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::Span;
use wr_app::{
    AppError, ExternalTools, FailurePolicy, SweepOptions, SweepProgressEvent, SweepRequest,
    SweepStage, ToolFailure, run_sweep, run_sweep_with_progress,
};
use wr_case::boundary::read_patch_type;
use wr_case::{CaseError, CaseLock};
use wr_project::RunSpec;
use wr_results::{Archive, ManifestStore, PairOutcome};

const CONTROL_DICT: &str = "\
application     windFoam;
startFrom       latestTime;
stopAt          endTime;
writeControl    timeStep;
writeInterval   100;
writeCompression off;
";

const ABL_CONDITIONS: &str = "\
Uref            10.0;
Zref            10.0;
flowDir         (1 0 0);
z0              uniform 0.1;
";

const SOLVER_LOG: &str = "\
Time = 1

smoothSolver:  Solving for Ux, Initial residual = 0.5, Final residual = 0.001, No Iterations 3
smoothSolver:  Solving for Ux, Initial residual = 0.1, Final residual = 0.001, No Iterations 1
Time = 2

smoothSolver:  Solving for Ux, Initial residual = 0.25, Final residual = 0.001, No Iterations 2
";

fn field(object: &str) -> String {
    let mut text = format!(
        "FoamFile\n{{\n    version     2.0;\n    object      {object};\n}}\n\n\
         internalField   uniform 0;\n\nboundaryField\n{{\n"
    );
    for (name, ty) in [
        ("terrain", "zeroGradient"),
        ("north", "zeroGradient"),
        ("east", "zeroGradient"),
        ("south", "zeroGradient"),
        ("west", "zeroGradient"),
        ("top", "slip"),
    ] {
        text.push_str(&format!("    {name}\n    {{\n        type            {ty};\n    }}\n"));
    }
    text.push_str("}\n");
    text
}

fn make_case(root: &Path) {
    fs::create_dir_all(root.join("system")).unwrap();
    fs::create_dir_all(root.join("constant")).unwrap();
    fs::create_dir_all(root.join("0").join("include")).unwrap();
    fs::write(root.join("system").join("controlDict"), CONTROL_DICT).unwrap();
    fs::write(
        root.join("system").join("decomposeParDict"),
        "numberOfSubdomains 1;\nmethod          scotch;\n",
    )
    .unwrap();
    for name in ["U", "p", "k", "epsilon"] {
        fs::write(root.join("0").join(name), field(name)).unwrap();
    }
    fs::write(root.join("0").join("include").join("ABLConditions"), ABL_CONDITIONS).unwrap();
}

fn spec(wdirs: Vec<f64>) -> RunSpec {
    RunSpec {
        wspeeds: vec![3.0],
        wdirs,
        z0: vec![0.1],
        iterations: 5,
        solver: "windFoam".into(),
        initialize: vec!["setLanduse".into()],
        flow_archive_dir_name: "flowArchive".into(),
        fields_to_archive: vec!["U".into(), "p".into(), "k".into(), "epsilon".into()],
        restore_archived: false,
        reuse_archive: false,
        nodes: None,
        cpus: None,
        compress: false,
        continue_on_failure: false,
        boundary_templates: vec![],
    }
}

/// Records every call; the solver writes the `iterations` time directory
/// and a solver log.
#[derive(Default)]
struct FakeTools {
    calls: Vec<String>,
    iterations: usize,
    fail_on_solver_run: Option<usize>,
    /// Remove the initial field backup when failing.
    lose_backup_on_failure: bool,
    panic_on_solver_run: Option<usize>,
    skip_output: bool,
    solver_runs: usize,
    /// `0/U` and `0/include/ABLConditions` as the solver saw them.
    seen_velocity: Vec<String>,
    seen_abl: Vec<String>,
}

impl FakeTools {
    fn new(iterations: usize) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }
}

impl ExternalTools for FakeTools {
    fn run_utility(&mut self, _case: &Path, command: &str) -> Result<(), ToolFailure> {
        self.calls.push(format!("utility {command}"));
        Ok(())
    }

    fn decompose(&mut self, case: &Path) -> Result<(), ToolFailure> {
        self.calls.push("decompose".into());
        fs::create_dir_all(case.join("processor0")).unwrap();
        fs::create_dir_all(case.join("processor1")).unwrap();
        Ok(())
    }

    fn run_solver(&mut self, case: &Path, solver: &str, processes: usize) -> Result<(), ToolFailure> {
        self.calls.push(format!("solver {solver} {processes}"));
        self.solver_runs += 1;
        self.seen_velocity
            .push(fs::read_to_string(case.join("0").join("U")).unwrap());
        self.seen_abl
            .push(fs::read_to_string(case.join("0").join("include").join("ABLConditions")).unwrap());

        if self.fail_on_solver_run == Some(self.solver_runs) {
            if self.lose_backup_on_failure {
                fs::remove_dir_all(case.join(wr_case::BACKUP_DIR_NAME)).unwrap();
            }
            return Err(ToolFailure::new(solver, "exited with status 1"));
        }
        if self.skip_output {
            return Ok(());
        }
        let out = case.join(self.iterations.to_string());
        fs::create_dir_all(&out).unwrap();
        for name in ["U", "p", "k", "epsilon"] {
            let text = fs::read_to_string(case.join("0").join(name)).unwrap();
            fs::write(out.join(name), text.replace("uniform 0;", "uniform 1;")).unwrap();
        }
        if self.panic_on_solver_run == Some(self.solver_runs) {
            panic!("solver crashed");
        }
        fs::write(case.join(format!("{solver}.logfile")), SOLVER_LOG).unwrap();
        Ok(())
    }

    fn reconstruct(&mut self, _case: &Path) -> Result<(), ToolFailure> {
        self.calls.push("reconstruct".into());
        Ok(())
    }
}

fn request<'a>(case_root: &'a Path, spec: &'a RunSpec) -> SweepRequest<'a> {
    SweepRequest {
        case_root,
        spec,
        options: SweepOptions::for_spec(spec),
    }
}

fn snapshot(root: &Path) -> Vec<(PathBuf, String)> {
    [
        root.join("0").join("U"),
        root.join("0").join("p"),
        root.join("0").join("k"),
        root.join("0").join("epsilon"),
        root.join("0").join("include").join("ABLConditions"),
        root.join("system").join("controlDict"),
    ]
    .into_iter()
    .map(|p| {
        let text = fs::read_to_string(&p).unwrap();
        (p, text)
    })
    .collect()
}

fn assert_unchanged(before: &[(PathBuf, String)]) {
    for (path, text) in before {
        assert_eq!(&fs::read_to_string(path).unwrap(), text, "{} changed", path.display());
    }
}

#[test]
fn serial_sweep_archives_every_pair_and_restores_the_case() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    make_case(root);
    let before = snapshot(root);
    let spec = spec(vec![0.0, 90.0]);
    let mut tools = FakeTools::new(spec.iterations);

    let report = run_sweep(&request(root, &spec), &mut tools).unwrap();

    assert_eq!(tools.solver_runs, 2);
    assert_eq!(report.solver_runs, 2);
    assert_eq!(report.completed.len(), 2);
    assert!(report.failed.is_empty());
    assert_eq!(
        tools.calls,
        vec![
            "utility setLanduse",
            "solver windFoam 1",
            "utility setLanduse",
            "solver windFoam 1",
        ]
    );

    let archive = Archive::open(root, "flowArchive", false, Span::none()).unwrap();
    assert_eq!(
        archive.list_dirs().unwrap(),
        vec!["wspeed_3.0_wdir_0", "wspeed_3.0_wdir_90"]
    );
    assert_eq!(
        archive.list_files_under("wspeed_3.0_wdir_90").unwrap(),
        vec!["U", "epsilon", "k", "p"]
    );

    assert_unchanged(&before);
    assert!(!root.join("5").exists());
    assert!(!root.join(wr_case::lock::LOCK_FILE_NAME).exists());
}

#[test]
fn boundaries_and_inlet_follow_each_direction() {
    let tmp = tempfile::tempdir().unwrap();
    make_case(tmp.path());
    let spec = spec(vec![0.0, 90.0]);
    let mut tools = FakeTools::new(spec.iterations);

    run_sweep(&request(tmp.path(), &spec), &mut tools).unwrap();

    let north_wind = &tools.seen_velocity[0];
    assert_eq!(
        read_patch_type(north_wind, "north").unwrap().as_deref(),
        Some("atmBoundaryLayerInletVelocity")
    );
    assert_eq!(read_patch_type(north_wind, "south").unwrap().as_deref(), Some("inletOutlet"));
    assert_eq!(read_patch_type(north_wind, "top").unwrap().as_deref(), Some("slip"));

    let east_wind = &tools.seen_velocity[1];
    assert_eq!(
        read_patch_type(east_wind, "east").unwrap().as_deref(),
        Some("atmBoundaryLayerInletVelocity")
    );
    assert_eq!(read_patch_type(east_wind, "west").unwrap().as_deref(), Some("inletOutlet"));

    assert!(tools.seen_abl[0].contains("Uref            3.000000;"));
    assert!(tools.seen_abl[0].contains("flowDir         (0.000000 -1.000000 0);"));
    assert!(tools.seen_abl[1].contains("flowDir         (-1.000000 0.000000 0);"));
    assert!(tools.seen_abl[1].contains("z0              uniform 0.100000;"));
}

#[test]
fn control_dict_is_edited_during_the_run_only() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().to_path_buf();
    make_case(&root);
    let spec = spec(vec![0.0]);

    struct Peek {
        inner: FakeTools,
        control: Vec<String>,
    }
    impl ExternalTools for Peek {
        fn run_utility(&mut self, case: &Path, command: &str) -> Result<(), ToolFailure> {
            self.inner.run_utility(case, command)
        }
        fn decompose(&mut self, case: &Path) -> Result<(), ToolFailure> {
            self.inner.decompose(case)
        }
        fn run_solver(&mut self, case: &Path, solver: &str, n: usize) -> Result<(), ToolFailure> {
            self.control
                .push(fs::read_to_string(case.join("system").join("controlDict")).unwrap());
            self.inner.run_solver(case, solver, n)
        }
        fn reconstruct(&mut self, case: &Path) -> Result<(), ToolFailure> {
            self.inner.reconstruct(case)
        }
    }

    let mut tools = Peek {
        inner: FakeTools::new(spec.iterations),
        control: Vec::new(),
    };
    run_sweep(&request(&root, &spec), &mut tools).unwrap();

    assert!(tools.control[0].contains("stopAt          nextWrite;"));
    assert!(tools.control[0].contains("writeInterval   5;"));
    assert_eq!(
        fs::read_to_string(root.join("system").join("controlDict")).unwrap(),
        CONTROL_DICT
    );
}

#[test]
fn convergence_tables_get_one_column_per_run() {
    let tmp = tempfile::tempdir().unwrap();
    make_case(tmp.path());
    let spec = spec(vec![0.0, 90.0]);
    let mut tools = FakeTools::new(spec.iterations);

    run_sweep(&request(tmp.path(), &spec), &mut tools).unwrap();

    let table = fs::read_to_string(
        tmp.path()
            .join("convergence")
            .join("linear_Ux_windFoam_residual.asc"),
    )
    .unwrap();
    assert_eq!(
        table,
        "Time\t1_wd_0_ws_3.0\t2_wd_90_ws_3.0\n1\t0.5\t0.5\n2\t0.25\t0.25\n"
    );
}

#[test]
fn archived_pairs_are_skipped_when_reusing() {
    let tmp = tempfile::tempdir().unwrap();
    make_case(tmp.path());
    let first = spec(vec![0.0, 90.0]);
    run_sweep(&request(tmp.path(), &first), &mut FakeTools::new(5)).unwrap();

    let mut again = spec(vec![0.0, 90.0, 180.0]);
    again.reuse_archive = true;
    let mut tools = FakeTools::new(5);
    let report = run_sweep(&request(tmp.path(), &again), &mut tools).unwrap();

    assert_eq!(report.cached.len(), 2);
    assert_eq!(report.completed.len(), 1);
    assert_eq!(tools.solver_runs, 1);

    let manifest = ManifestStore::new(&report.archive_dir).load().unwrap().unwrap();
    assert_eq!(manifest.entries.len(), 3);
    let last = manifest.entries.iter().find(|e| e.run_index == 3).unwrap();
    assert!(matches!(last.outcome, PairOutcome::Archived { ref latest_time, .. } if latest_time == "5"));
}

#[test]
fn archived_fields_are_restored_before_solving() {
    let tmp = tempfile::tempdir().unwrap();
    make_case(tmp.path());
    let first = spec(vec![0.0]);
    run_sweep(&request(tmp.path(), &first), &mut FakeTools::new(5)).unwrap();

    let mut again = spec(vec![0.0]);
    again.restore_archived = true;
    let mut tools = FakeTools::new(5);
    let mut stages = Vec::new();
    run_sweep_with_progress(
        &request(tmp.path(), &again),
        &mut tools,
        Some(&mut |e: SweepProgressEvent| stages.push(e.stage)),
    )
    .unwrap();

    assert!(stages.contains(&SweepStage::RestoringArchived));
    assert!(tools.seen_velocity[0].contains("internalField   uniform 1;"));
}

#[test]
fn failing_solver_aborts_with_the_pair() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    make_case(root);
    let before = snapshot(root);
    let spec = spec(vec![0.0, 90.0, 180.0]);
    let mut tools = FakeTools::new(5);
    tools.fail_on_solver_run = Some(2);

    let err = run_sweep(&request(root, &spec), &mut tools).unwrap_err();

    match err {
        AppError::ExternalTool {
            tool,
            speed,
            direction,
            ..
        } => {
            assert_eq!(tool, "windFoam");
            assert_eq!(speed, 3.0);
            assert_eq!(direction, 90.0);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(tools.solver_runs, 2);
    assert_unchanged(&before);
    assert!(!root.join(wr_case::lock::LOCK_FILE_NAME).exists());

    let archive = Archive::open(root, "flowArchive", false, Span::none()).unwrap();
    assert_eq!(archive.list_dirs().unwrap(), vec!["wspeed_3.0_wdir_0"]);
}

#[test]
fn panicking_solver_still_restores_the_case() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    make_case(root);
    let before = snapshot(root);
    let spec = spec(vec![0.0, 90.0]);
    let mut tools = FakeTools::new(5);
    tools.panic_on_solver_run = Some(1);

    let result = catch_unwind(AssertUnwindSafe(|| run_sweep(&request(root, &spec), &mut tools)));

    assert!(result.is_err());
    assert_eq!(tools.solver_runs, 1);
    assert!(!root.join("5").exists());
    assert!(!root.join(wr_case::lock::LOCK_FILE_NAME).exists());
    assert_unchanged(&before);
}

#[test]
fn failed_restore_keeps_the_run_error() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    make_case(root);
    let before = snapshot(root);
    let spec = spec(vec![0.0, 90.0]);
    let mut tools = FakeTools::new(5);
    tools.fail_on_solver_run = Some(1);
    tools.lose_backup_on_failure = true;

    let err = run_sweep(&request(root, &spec), &mut tools).unwrap_err();

    assert!(matches!(err, AppError::ExternalTool { direction, .. } if direction == 0.0));
    assert_eq!(tools.solver_runs, 1);
    let control = fs::read_to_string(root.join("system").join("controlDict")).unwrap();
    assert_eq!(control, before.last().unwrap().1);
    assert!(!root.join(wr_case::lock::LOCK_FILE_NAME).exists());
}

#[test]
fn continue_policy_records_failures() {
    let tmp = tempfile::tempdir().unwrap();
    make_case(tmp.path());
    let mut spec = spec(vec![0.0, 90.0, 180.0]);
    spec.continue_on_failure = true;
    let mut tools = FakeTools::new(5);
    tools.fail_on_solver_run = Some(2);

    let report = run_sweep(&request(tmp.path(), &spec), &mut tools).unwrap();

    assert_eq!(tools.solver_runs, 3);
    assert_eq!(report.completed.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0.direction, 90.0);
    assert!(report.failed[0].1.contains("exited with status 1"));

    let manifest = ManifestStore::new(&report.archive_dir).load().unwrap().unwrap();
    let failed = manifest.entries.iter().find(|e| e.run_index == 2).unwrap();
    assert!(matches!(failed.outcome, PairOutcome::Failed { .. }));
}

#[test]
fn solver_without_output_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    make_case(tmp.path());
    let spec = spec(vec![0.0]);
    let mut tools = FakeTools::new(5);
    tools.skip_output = true;

    let err = run_sweep(&request(tmp.path(), &spec), &mut tools).unwrap_err();
    assert!(matches!(err, AppError::NoSolverOutput { direction, .. } if direction == 0.0));
}

#[test]
fn cancellation_stops_between_pairs() {
    let tmp = tempfile::tempdir().unwrap();
    make_case(tmp.path());
    let spec = spec(vec![0.0, 90.0, 180.0]);
    let cancel = Arc::new(AtomicBool::new(false));
    let mut req = request(tmp.path(), &spec);
    req.options.cancel = Some(cancel.clone());

    let mut tools = FakeTools::new(5);
    let mut events = Vec::new();
    let report = run_sweep_with_progress(
        &req,
        &mut tools,
        Some(&mut |e: SweepProgressEvent| {
            if e.stage == SweepStage::Archiving {
                cancel.store(true, Ordering::SeqCst);
            }
            events.push(e);
        }),
    )
    .unwrap();

    assert!(report.cancelled);
    assert_eq!(tools.solver_runs, 1);
    assert_eq!(report.completed.len(), 1);
    let cancelled = events
        .iter()
        .find(|e| e.stage == SweepStage::Cancelled)
        .unwrap();
    assert_eq!(cancelled.run_index, 2);
    assert_eq!(cancelled.total_runs, 3);
}

#[test]
fn locked_case_is_refused() {
    let tmp = tempfile::tempdir().unwrap();
    make_case(tmp.path());
    let spec = spec(vec![0.0]);
    let _held = CaseLock::acquire(tmp.path()).unwrap();

    let mut tools = FakeTools::new(5);
    let err = run_sweep(&request(tmp.path(), &spec), &mut tools).unwrap_err();

    assert!(matches!(err, AppError::Case(CaseError::CaseLocked { .. })));
    assert!(tools.calls.is_empty());
}

#[test]
fn invalid_spec_is_rejected_before_touching_the_case() {
    let tmp = tempfile::tempdir().unwrap();
    make_case(tmp.path());
    let spec = spec(vec![0.0, 400.0]);

    let mut tools = FakeTools::new(5);
    let err = run_sweep(&request(tmp.path(), &spec), &mut tools).unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(tools.calls.is_empty());
    assert!(!tmp.path().join("flowArchive").exists());
    assert!(!tmp.path().join(wr_case::BACKUP_DIR_NAME).exists());
}

#[test]
fn parallel_runs_decompose_and_reconstruct() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    make_case(root);
    let mut spec = spec(vec![0.0]);
    spec.cpus = Some(4);
    let mut tools = FakeTools::new(5);

    run_sweep(&request(root, &spec), &mut tools).unwrap();

    assert_eq!(
        tools.calls,
        vec!["utility setLanduse", "decompose", "solver windFoam 4", "reconstruct"]
    );
    assert!(!root.join("processor0").exists());
    assert!(!root.join("processor1").exists());
    let decompose = fs::read_to_string(root.join("system").join("decomposeParDict")).unwrap();
    assert!(decompose.contains("numberOfSubdomains 4;"));
}

#[test]
fn defaults_abort_on_failure() {
    assert_eq!(SweepOptions::default().failure_policy, FailurePolicy::Abort);
}
