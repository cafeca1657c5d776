use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Instant;
use tracing::Level;
use wr_app::{
    AppError, AppResult, FailurePolicy, ProcessTools, SetDirectionRequest, SweepOptions,
    SweepProgressEvent, SweepReport, SweepRequest, SweepStage, export_archive,
    run_sweep_with_progress, set_direction,
};
use wr_case::CaseError;
use wr_results::ExportMode;

#[derive(Parser)]
#[command(name = "windrunner")]
#[command(about = "windrunner - batch wind sweeps over CFD cases", long_about = None)]
struct Cli {
    #[command(flatten)]
    log: LogArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LogArgs {
    /// Only report warnings and errors
    #[arg(short, long, global = true, conflicts_with = "debug")]
    quiet: bool,
    /// Report debug output
    #[arg(short, long, global = true)]
    debug: bool,
    /// Write log output to a file instead of the terminal
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    logfile: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a wind sweep described by a control file or YAML specification
    Run {
        /// Control file or YAML run specification
        spec_path: PathBuf,
        /// Case directory (defaults to the current directory)
        #[arg(short, long)]
        case: Option<PathBuf>,
        /// Record failing pairs and carry on with the rest of the sweep
        #[arg(long)]
        keep_going: bool,
    },
    /// Check a run specification without touching any case
    Validate {
        /// Control file or YAML run specification
        spec_path: PathBuf,
    },
    /// Write a default control file
    Template {
        /// Where to write the control file
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set boundary conditions for a wind direction, optionally restoring
    /// archived fields
    SetWdir {
        /// Wind direction in degrees
        #[arg(long)]
        wdir: f64,
        /// Wind speed of the archived pair to restore
        #[arg(long)]
        wspeed: Option<f64>,
        /// Archive directory to fetch fields from
        #[arg(short, long)]
        archive: Option<PathBuf>,
        /// Case directory (defaults to the current directory)
        #[arg(short, long)]
        case: Option<PathBuf>,
    },
    /// Expose archived fields in a runtime directory as <field>_<pair>
    ArchiveToRuntime {
        /// Archive directory
        archive: PathBuf,
        /// Destination directory, typically a time directory
        destination: PathBuf,
        /// Copy files instead of symlinking them
        #[arg(long)]
        copy: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli.log) {
        eprintln!("Error: cannot open log file: {e}");
        return ExitCode::from(2);
    }

    let result = match cli.command {
        Commands::Run {
            spec_path,
            case,
            keep_going,
        } => cmd_run(&spec_path, case.as_deref(), keep_going),
        Commands::Validate { spec_path } => cmd_validate(&spec_path),
        Commands::Template { path, force } => cmd_template(&path, force),
        Commands::SetWdir {
            wdir,
            wspeed,
            archive,
            case,
        } => cmd_set_wdir(wdir, wspeed, archive, case.as_deref()),
        Commands::ArchiveToRuntime {
            archive,
            destination,
            copy,
        } => cmd_archive_to_runtime(&archive, &destination, copy),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            clear_progress_line();
            eprintln!("Error: {e}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn init_logging(args: &LogArgs) -> io::Result<()> {
    let level = if args.debug {
        Level::DEBUG
    } else if args.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);
    match &args.logfile {
        Some(path) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(File::create(path)?))
            .init(),
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

/// 2: bad input, 3: case busy, 4: external tool failed, 1: anything else.
fn exit_code(err: &AppError) -> u8 {
    match err {
        AppError::Project(_) | AppError::Validation(_) | AppError::InvalidInput(_) => 2,
        AppError::Case(CaseError::CaseLocked { .. }) => 3,
        AppError::ExternalTool { .. }
        | AppError::Tool { .. }
        | AppError::NoSolverOutput { .. }
        | AppError::PairsFailed { .. } => 4,
        _ => 1,
    }
}

fn case_dir(case: Option<&Path>) -> AppResult<PathBuf> {
    let dir = match case {
        Some(dir) => std::path::absolute(dir),
        None => std::env::current_dir(),
    };
    dir.map_err(|e| AppError::InvalidInput(format!("cannot resolve case directory: {e}")))
}

fn cmd_run(spec_path: &Path, case: Option<&Path>, keep_going: bool) -> AppResult<()> {
    let spec = wr_project::load_spec(spec_path)?;
    let case_root = case_dir(case)?;
    let span = tracing::info_span!("sweep", case = %case_root.display());

    let mut options = SweepOptions::for_spec(&spec);
    if keep_going {
        options.failure_policy = FailurePolicy::Continue;
    }
    options.span = span.clone();
    let request = SweepRequest {
        case_root: &case_root,
        spec: &spec,
        options,
    };

    println!(
        "Running wind sweep: {} runs ({} speeds x {} directions) in {}",
        spec.total_runs(),
        spec.wspeeds.len(),
        spec.wdirs.len(),
        case_root.display()
    );

    let mut tools = ProcessTools::new(span);
    let mut last_emit = Instant::now();
    let mut last_stage: Option<SweepStage> = None;
    let report = run_sweep_with_progress(
        &request,
        &mut tools,
        Some(&mut |event| {
            let emit_now = last_stage.as_ref() != Some(&event.stage)
                || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage.clone());
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    print_report(&report);
    if report.failed.is_empty() {
        Ok(())
    } else {
        Err(AppError::PairsFailed {
            failed: report.failed.len(),
            total: spec.total_runs(),
        })
    }
}

fn cmd_validate(spec_path: &Path) -> AppResult<()> {
    println!("Validating run specification: {}", spec_path.display());
    let spec = wr_project::load_spec(spec_path)?;
    wr_project::validate_spec(&spec)?;
    println!("✓ Specification is valid");
    println!("  Wind speeds: {:?}", spec.wspeeds);
    println!("  Wind directions: {:?}", spec.wdirs);
    println!("  Runs: {}", spec.total_runs());
    println!("  Solver: {} on {} process(es)", spec.solver, spec.processes());
    Ok(())
}

fn cmd_template(path: &Path, force: bool) -> AppResult<()> {
    wr_project::write_template(path, force)?;
    println!("✓ Wrote control file template to {}", path.display());
    Ok(())
}

fn cmd_set_wdir(
    wdir: f64,
    wspeed: Option<f64>,
    archive: Option<PathBuf>,
    case: Option<&Path>,
) -> AppResult<()> {
    let request = SetDirectionRequest {
        case_root: case_dir(case)?,
        direction: wdir,
        speed: wspeed,
        archive,
    };
    let outcome = set_direction(&request, tracing::info_span!("setWdir"))?;
    println!("✓ Boundary conditions set for {wdir} degrees ({})", outcome.octant);
    if !outcome.restored.is_empty() {
        println!("  Restored from archive: {}", outcome.restored.join(" "));
    }
    Ok(())
}

fn cmd_archive_to_runtime(archive: &Path, destination: &Path, copy: bool) -> AppResult<()> {
    let mode = if copy {
        ExportMode::Copy
    } else {
        ExportMode::Symlink
    };
    let span = tracing::info_span!("archiveToRuntime");
    let count = export_archive(archive, destination, mode, span)?;
    println!(
        "✓ Exported {} archived files to {}",
        count,
        destination.display()
    );
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &SweepProgressEvent) {
    let width = 28usize;
    let fraction = event.fraction_complete();
    let filled = ((fraction * width as f64).round() as usize).min(width);
    let bar = format!(
        "{}{}",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled))
    );
    let mut line = format!(
        "\r[{}] run {}/{}  {}",
        bar,
        event.run_index,
        event.total_runs,
        event.stage.label()
    );
    if let Some(key) = &event.key {
        line.push_str(&format!("  {key}"));
    }
    line.push_str(&format!("  elapsed={:.1}s", event.elapsed_wall_s));
    if let (SweepStage::PairFailed, Some(msg)) = (&event.stage, &event.message) {
        line.push_str(&format!("  {msg}"));
    }
    print!("{}", line);
    let _ = io::stdout().flush();
}

fn print_report(report: &SweepReport) {
    if report.cancelled {
        println!("Sweep cancelled");
    } else {
        println!("✓ Sweep finished");
    }
    println!("  Archive: {}", report.archive_dir.display());
    println!("  Completed: {}", report.completed.len());
    if !report.cached.is_empty() {
        println!("  Already archived: {}", report.cached.len());
    }
    println!("  Solver runs: {}", report.solver_runs);
    for (key, message) in &report.failed {
        println!("  Failed {key}: {message}");
    }
    println!("  Total: {:.1}s", report.elapsed_wall_s);
}
