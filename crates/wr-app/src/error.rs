//! Error types for the wr-app service layer.

use std::path::PathBuf;

use crate::external::ToolFailure;

/// Application error type wrapping the errors of the backend crates.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Run specification error: {0}")]
    Project(#[from] wr_project::ProjectError),

    #[error("Invalid run specification: {0}")]
    Validation(#[from] wr_project::ValidationError),

    #[error("Case error: {0}")]
    Case(#[from] wr_case::CaseError),

    #[error("Dictionary error: {0}")]
    Dict(#[from] wr_dict::DictError),

    #[error("Boundary condition error: {0}")]
    Bc(#[from] wr_bc::BcError),

    #[error("Archive error: {0}")]
    Archive(#[from] wr_results::ArchiveError),

    #[error("Results error: {0}")]
    Results(#[from] wr_results::ResultsError),

    #[error("{tool} failed for wind speed {speed} and direction {direction}: {detail}")]
    ExternalTool {
        tool: String,
        speed: f64,
        direction: f64,
        detail: String,
    },

    #[error("{tool} failed: {detail}")]
    Tool { tool: String, detail: String },

    #[error("Solver wrote no time directory for wind speed {speed} and direction {direction}")]
    NoSolverOutput { speed: f64, direction: f64 },

    #[error("Archive directory {path} does not exist")]
    ArchiveNotFound { path: PathBuf },

    #[error("{failed} of {total} runs failed")]
    PairsFailed { failed: usize, total: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for wr-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<ToolFailure> for AppError {
    fn from(err: ToolFailure) -> Self {
        AppError::Tool {
            tool: err.tool,
            detail: err.detail,
        }
    }
}

impl AppError {
    /// Attach the sweep pair to a tool failure.
    pub(crate) fn for_pair(self, speed: f64, direction: f64) -> Self {
        match self {
            AppError::Tool { tool, detail } => AppError::ExternalTool {
                tool,
                speed,
                direction,
                detail,
            },
            other => other,
        }
    }
}
