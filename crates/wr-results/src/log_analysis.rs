//! Solver log analysis.
//!
//! Extracts the initial residual of every linear solve from a solver log
//! and writes one table per solved field to `<case>/<solver>.analyzed/`:
//!
//! ```text
//! # Time	linear_Ux
//! 1	0.5
//! 2	0.031
//! ```
//!
//! Only the first solve of a field per time step is kept.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use regex::Regex;

use crate::{ResultsError, ResultsResult};

pub const LOG_SUFFIX: &str = ".logfile";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolverLogSummary {
    /// Number of `Time = ` steps seen.
    pub steps: usize,
    pub last_time: Option<String>,
    /// Names of the written tables (`linear_Ux`, ...).
    pub tables: Vec<String>,
}

/// Analyse `<case>/<solver>.logfile`, if the solver left one.
pub fn analyze_solver_log(
    case_root: &Path,
    solver: &str,
) -> ResultsResult<Option<SolverLogSummary>> {
    let log = case_root.join(format!("{solver}{LOG_SUFFIX}"));
    if !log.is_file() {
        return Ok(None);
    }
    let out_dir = case_root.join(format!("{solver}.analyzed"));
    analyze_log(&log, &out_dir).map(Some)
}

pub fn analyze_log(log: &Path, out_dir: &Path) -> ResultsResult<SolverLogSummary> {
    let content = fs::read_to_string(log).map_err(|e| ResultsError::io(log, e))?;
    let time_line = Regex::new(r"^Time = (\S+)")?;
    let solve_line = Regex::new(r"Solving for (\w+), Initial residual = ([^,\s]+)")?;

    let mut summary = SolverLogSummary::default();
    let mut current: Option<String> = None;
    let mut series: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();

    for line in content.lines() {
        if let Some(caps) = time_line.captures(line) {
            current = Some(caps[1].to_string());
            summary.steps += 1;
            continue;
        }
        let (Some(time), Some(caps)) = (&current, solve_line.captures(line)) else {
            continue;
        };
        let rows = series.entry(format!("linear_{}", &caps[1])).or_default();
        if rows.last().is_none_or(|(t, _)| t != time) {
            rows.push((time.clone(), caps[2].to_string()));
        }
    }
    summary.last_time = current;

    if series.is_empty() {
        return Ok(summary);
    }
    fs::create_dir_all(out_dir).map_err(|e| ResultsError::io(out_dir, e))?;
    for (name, rows) in &series {
        let mut text = format!("# Time\t{name}\n");
        for (time, residual) in rows {
            let _ = writeln!(text, "{time}\t{residual}");
        }
        let path = out_dir.join(name);
        fs::write(&path, text).map_err(|e| ResultsError::io(&path, e))?;
        summary.tables.push(name.clone());
    }
    Ok(summary)
}
