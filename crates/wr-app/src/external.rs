//! External tools: initialisation utilities, decomposition, the solver and
//! reconstruction.
//!
//! The sweep only sees the [`ExternalTools`] trait. [`ProcessTools`] runs
//! the real executables, blocking until each one exits, with stdout and
//! stderr written to `<case>/<name>.logfile`.

use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{Span, debug, info};

/// A tool that could not be started or exited unsuccessfully.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{tool}: {detail}")]
pub struct ToolFailure {
    pub tool: String,
    pub detail: String,
}

impl ToolFailure {
    pub fn new(tool: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            detail: detail.into(),
        }
    }
}

pub trait ExternalTools {
    /// Run an initialisation utility; `command` may carry arguments
    /// (`setFields -latestTime`).
    fn run_utility(&mut self, case: &Path, command: &str) -> Result<(), ToolFailure>;

    fn decompose(&mut self, case: &Path) -> Result<(), ToolFailure>;

    fn run_solver(&mut self, case: &Path, solver: &str, processes: usize)
    -> Result<(), ToolFailure>;

    fn reconstruct(&mut self, case: &Path) -> Result<(), ToolFailure>;
}

pub const MPI_LAUNCHER: &str = "mpirun";
pub const DECOMPOSE_COMMAND: &str = "decomposePar";
pub const RECONSTRUCT_COMMAND: &str = "reconstructPar";

/// Runs tools as child processes.
#[derive(Debug, Clone)]
pub struct ProcessTools {
    mpi_launcher: String,
    span: Span,
}

impl ProcessTools {
    pub fn new(span: Span) -> Self {
        Self {
            mpi_launcher: MPI_LAUNCHER.to_string(),
            span,
        }
    }

    pub fn with_mpi_launcher(mut self, launcher: impl Into<String>) -> Self {
        self.mpi_launcher = launcher.into();
        self
    }

    fn execute(
        &self,
        case: &Path,
        log_name: &str,
        program: &str,
        args: &[String],
    ) -> Result<(), ToolFailure> {
        let log_path = case.join(format!("{log_name}.logfile"));
        let log = File::create(&log_path).map_err(|e| {
            ToolFailure::new(log_name, format!("cannot create {}: {e}", log_path.display()))
        })?;
        let err_log = log
            .try_clone()
            .map_err(|e| ToolFailure::new(log_name, e.to_string()))?;

        debug!(parent: &self.span, program, args = ?args, "starting external tool");
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(err_log))
            .status()
            .map_err(|e| ToolFailure::new(log_name, format!("cannot start {program}: {e}")))?;

        if !status.success() {
            return Err(ToolFailure::new(
                log_name,
                format!("exited with {status}, see {}", log_path.display()),
            ));
        }
        info!(parent: &self.span, tool = log_name, "successfully finished");
        Ok(())
    }
}

fn case_args(case: &Path) -> Vec<String> {
    vec!["-case".to_string(), case.display().to_string()]
}

impl ExternalTools for ProcessTools {
    fn run_utility(&mut self, case: &Path, command: &str) -> Result<(), ToolFailure> {
        let mut parts = command.split_whitespace();
        let Some(program) = parts.next() else {
            return Err(ToolFailure::new(command, "empty command"));
        };
        let mut args: Vec<String> = parts.map(str::to_string).collect();
        args.extend(case_args(case));
        self.execute(case, program, program, &args)
    }

    fn decompose(&mut self, case: &Path) -> Result<(), ToolFailure> {
        let mut args = vec!["-force".to_string()];
        args.extend(case_args(case));
        self.execute(case, DECOMPOSE_COMMAND, DECOMPOSE_COMMAND, &args)
    }

    fn run_solver(
        &mut self,
        case: &Path,
        solver: &str,
        processes: usize,
    ) -> Result<(), ToolFailure> {
        if processes > 1 {
            let mut args = vec!["-np".to_string(), processes.to_string(), solver.to_string()];
            args.extend(case_args(case));
            args.push("-parallel".to_string());
            let launcher = self.mpi_launcher.clone();
            self.execute(case, solver, &launcher, &args)
        } else {
            self.execute(case, solver, solver, &case_args(case))
        }
    }

    fn reconstruct(&mut self, case: &Path) -> Result<(), ToolFailure> {
        let mut args = vec!["-latestTime".to_string()];
        args.extend(case_args(case));
        self.execute(case, RECONSTRUCT_COMMAND, RECONSTRUCT_COMMAND, &args)
    }
}
