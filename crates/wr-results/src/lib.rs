//! wr-results: archive of result fields, convergence tables and the sweep
//! manifest.

use std::path::PathBuf;

pub mod archive;
pub mod convergence;
pub mod hash;
pub mod log_analysis;
pub mod manifest;
pub mod types;

pub use archive::{Archive, ExportMode};
pub use convergence::ConvergenceTable;
pub use hash::compute_spec_hash;
pub use log_analysis::{SolverLogSummary, analyze_log, analyze_solver_log};
pub use manifest::ManifestStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;
pub type ArchiveResult<T> = Result<T, ArchiveError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed line {line} in {path}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

impl ResultsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ResultsError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parent directory for archive does not exist: {path}")]
    ParentMissing { path: PathBuf },

    #[error("File to be archived does not exist: {path}")]
    SourceMissing { path: PathBuf },

    #[error("{name} is not in archive {path}")]
    ArchiveMiss { name: String, path: PathBuf },

    #[error("Destination directory does not exist: {path}")]
    DestinationMissing { path: PathBuf },

    #[error("Archive query needs a directory, a file name or both")]
    InvalidQuery,
}

impl ArchiveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchiveError::Io {
            path: path.into(),
            source,
        }
    }
}
