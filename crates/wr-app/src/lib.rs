//! Application service layer for windrunner.
//!
//! Drives wind sweeps over a case directory, reaching the solver and the
//! case utilities only through [`ExternalTools`], and exposes the smaller
//! services (`setWdir`, archive export) used by the command line.

pub mod abl;
pub mod error;
pub mod export;
pub mod external;
pub mod progress;
pub mod set_direction;
pub mod sweep;

pub use abl::update_abl_conditions;
pub use error::{AppError, AppResult};
pub use export::{export_archive, open_archive};
pub use external::{ExternalTools, ProcessTools, ToolFailure};
pub use progress::{SweepProgressEvent, SweepStage};
pub use set_direction::{SetDirectionOutcome, SetDirectionRequest, set_direction};
pub use sweep::{
    FailurePolicy, SweepOptions, SweepReport, SweepRequest, run_sweep, run_sweep_with_progress,
};
