//! Convergence tables: residual histories and probe series per run.
//!
//! Every table is keyed by field (and solver or probe location) and holds
//! one column per run. Columns are written in ascending run index, whatever
//! order the runs were recorded in:
//!
//! ```text
//! Time	1_wd_0_ws_3.0	2_wd_90_ws_3.0
//! 1	0.5	0.4
//! 2	0.1
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{Span, debug};
use wr_core::{magnitude, parse_time_label};

use crate::{ResultsError, ResultsResult};

pub const CONVERGENCE_DIR_NAME: &str = "convergence";
pub const PROBES_DIR_NAME: &str = "probes";

#[derive(Debug, Clone)]
struct Column {
    id: String,
    values: Vec<f64>,
}

/// Columns of one table, ordered by run index.
type Table = BTreeMap<usize, Column>;

#[derive(Debug)]
pub struct ConvergenceTable {
    case_root: PathBuf,
    out_dir: PathBuf,
    residuals: BTreeMap<String, Table>,
    probes: BTreeMap<String, Table>,
    span: Span,
}

impl ConvergenceTable {
    pub fn new(case_root: &Path, span: Span) -> ResultsResult<Self> {
        let out_dir = case_root.join(CONVERGENCE_DIR_NAME);
        fs::create_dir_all(&out_dir).map_err(|e| ResultsError::io(&out_dir, e))?;
        Ok(Self {
            case_root: case_root.to_path_buf(),
            out_dir,
            residuals: BTreeMap::new(),
            probes: BTreeMap::new(),
            span,
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Record the residual history `<case>/<solver>.analyzed/<field>`.
    ///
    /// Returns `false` when the file does not exist.
    pub fn add_residual(
        &mut self,
        run_id: &str,
        solver: &str,
        field: &str,
        run_index: usize,
    ) -> ResultsResult<bool> {
        let path = self
            .case_root
            .join(format!("{solver}.analyzed"))
            .join(field);
        if !path.is_file() {
            debug!(parent: &self.span, file = %path.display(), "no residual file");
            return Ok(false);
        }
        let content = fs::read_to_string(&path).map_err(|e| ResultsError::io(&path, e))?;

        let mut values = Vec::new();
        for (i, line) in content.lines().enumerate().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            values.push(parse_value(line.split_whitespace().nth(1), &path, i + 1)?);
        }

        let key = format!("{field}_{solver}");
        insert_column(&mut self.residuals, key, run_id, run_index, values);
        Ok(true)
    }

    /// Record every probe of `field` at the latest probe time.
    ///
    /// Returns the number of probes found; zero when the case has no probe
    /// output for `field`.
    pub fn add_probes(
        &mut self,
        run_id: &str,
        field: &str,
        run_index: usize,
    ) -> ResultsResult<usize> {
        let Some(time_dir) = latest_probe_dir(&self.case_root.join(PROBES_DIR_NAME))? else {
            return Ok(0);
        };
        let path = time_dir.join(field);
        if !path.is_file() {
            return Ok(0);
        }
        let content = fs::read_to_string(&path).map_err(|e| ResultsError::io(&path, e))?;
        let probes = parse_probe_file(&content, &path)?;
        let count = probes.len();

        for (location, values) in probes {
            let key = format!("{field}_{location}");
            insert_column(&mut self.probes, key, run_id, run_index, values);
        }
        Ok(count)
    }

    pub fn write_residuals(&self) -> ResultsResult<()> {
        for (key, table) in &self.residuals {
            self.write_table(&format!("{key}_residual.asc"), table)?;
        }
        Ok(())
    }

    pub fn write_probes(&self) -> ResultsResult<()> {
        for (key, table) in &self.probes {
            self.write_table(&format!("{key}_probe.asc"), table)?;
        }
        Ok(())
    }

    pub fn flush(&self) -> ResultsResult<()> {
        self.write_probes()?;
        self.write_residuals()
    }

    fn write_table(&self, file_name: &str, table: &Table) -> ResultsResult<()> {
        let path = self.out_dir.join(file_name);
        fs::write(&path, render_table(table)).map_err(|e| ResultsError::io(&path, e))
    }
}

fn insert_column(
    tables: &mut BTreeMap<String, Table>,
    key: String,
    run_id: &str,
    run_index: usize,
    values: Vec<f64>,
) {
    tables.entry(key).or_default().insert(
        run_index,
        Column {
            id: format!("{run_index}_{run_id}"),
            values,
        },
    );
}

fn render_table(table: &Table) -> String {
    let mut out = String::from("Time");
    for column in table.values() {
        out.push('\t');
        out.push_str(&column.id);
    }
    out.push('\n');

    let rows = table.values().map(|c| c.values.len()).max().unwrap_or(0);
    for row in 0..rows {
        let _ = write!(out, "{}", row + 1);
        for column in table.values() {
            out.push('\t');
            if let Some(v) = column.values.get(row) {
                let _ = write!(out, "{v}");
            }
        }
        out.push('\n');
    }
    out
}

fn parse_value(token: Option<&str>, path: &Path, line: usize) -> ResultsResult<f64> {
    let token = token.ok_or_else(|| ResultsError::Parse {
        path: path.to_path_buf(),
        line,
        message: "missing value column".to_string(),
    })?;
    token.parse().map_err(|_| ResultsError::Parse {
        path: path.to_path_buf(),
        line,
        message: format!("'{token}' is not a number"),
    })
}

fn latest_probe_dir(probes_dir: &Path) -> ResultsResult<Option<PathBuf>> {
    if !probes_dir.is_dir() {
        return Ok(None);
    }
    let mut latest: Option<(f64, PathBuf)> = None;
    for entry in fs::read_dir(probes_dir).map_err(|e| ResultsError::io(probes_dir, e))? {
        let entry = entry.map_err(|e| ResultsError::io(probes_dir, e))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !entry.path().is_dir() {
            continue;
        }
        if let Ok(t) = parse_time_label(&name)
            && latest.as_ref().is_none_or(|(best, _)| t > *best)
        {
            latest = Some((t, entry.path()));
        }
    }
    Ok(latest.map(|(_, path)| path))
}

/// Probe series keyed by `<x>_<y>_<z>`, in file order.
fn parse_probe_file(content: &str, path: &Path) -> ResultsResult<Vec<(String, Vec<f64>)>> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 3 {
        return Err(ResultsError::Parse {
            path: path.to_path_buf(),
            line: lines.len(),
            message: "expected x, y and z coordinate header lines".to_string(),
        });
    }
    let coords: Vec<Vec<&str>> = lines[..3]
        .iter()
        .map(|l| l.split_whitespace().skip(2).collect())
        .collect();
    let n_probes = coords[0].len();
    if coords.iter().any(|c| c.len() != n_probes) {
        return Err(ResultsError::Parse {
            path: path.to_path_buf(),
            line: 3,
            message: "coordinate header lines differ in length".to_string(),
        });
    }

    let mut series: Vec<(String, Vec<f64>)> = (0..n_probes)
        .map(|p| (format!("{}_{}_{}", coords[0][p], coords[1][p], coords[2][p]), Vec::new()))
        .collect();

    for (i, line) in lines.iter().enumerate().skip(3) {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let is_vector = trimmed.contains('(');
        let cleaned = trimmed.replace(['(', ')'], " ");
        let tokens: Vec<&str> = cleaned.split_whitespace().collect();

        for (p, (_, values)) in series.iter_mut().enumerate() {
            let value = if is_vector {
                let mut components = [0.0; 3];
                for (c, slot) in components.iter_mut().enumerate() {
                    *slot = parse_value(tokens.get(1 + p * 3 + c).copied(), path, i + 1)?;
                }
                magnitude(&components)
            } else {
                parse_value(tokens.get(1 + p).copied(), path, i + 1)?
            };
            values.push(value);
        }
    }
    Ok(series)
}
