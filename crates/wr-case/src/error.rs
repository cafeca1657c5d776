//! Error types for case-directory operations.

use std::path::PathBuf;

use thiserror::Error;
use wr_bc::BcError;
use wr_dict::DictError;

pub type CaseResult<T> = Result<T, CaseError>;

#[derive(Error, Debug)]
pub enum CaseError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No time directories found in case {path}")]
    NoTimeDirectories { path: PathBuf },

    #[error("Time directory {label} does not exist in case {path}")]
    UnknownTime { label: String, path: PathBuf },

    #[error("Cannot restore initial fields, backup directory {path} does not exist")]
    BackupMissing { path: PathBuf },

    #[error("Case {path} is locked by another run (remove {lock} if no run is active)")]
    CaseLocked { path: PathBuf, lock: PathBuf },

    #[error(transparent)]
    Dict(#[from] DictError),

    #[error(transparent)]
    Bc(#[from] BcError),
}

impl CaseError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CaseError::Io {
            path: path.into(),
            source,
        }
    }
}
