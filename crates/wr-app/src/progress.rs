use wr_results::ArchiveKey;

#[derive(Debug, Clone, PartialEq)]
pub enum SweepStage {
    Preparing,
    CheckingCache,
    SkippedCached,
    ModifyingBoundaries,
    Initializing,
    RestoringArchived,
    Decomposing,
    Solving,
    Reconstructing,
    RecordingConvergence,
    Archiving,
    RestoringCase,
    PairFailed,
    Cancelled,
    Completed,
}

impl SweepStage {
    pub fn label(&self) -> &'static str {
        match self {
            SweepStage::Preparing => "preparing",
            SweepStage::CheckingCache => "checking archive",
            SweepStage::SkippedCached => "archived, skipped",
            SweepStage::ModifyingBoundaries => "modifying boundaries",
            SweepStage::Initializing => "initializing",
            SweepStage::RestoringArchived => "restoring archived fields",
            SweepStage::Decomposing => "decomposing",
            SweepStage::Solving => "solving",
            SweepStage::Reconstructing => "reconstructing",
            SweepStage::RecordingConvergence => "recording convergence",
            SweepStage::Archiving => "archiving",
            SweepStage::RestoringCase => "restoring case",
            SweepStage::PairFailed => "failed",
            SweepStage::Cancelled => "cancelled",
            SweepStage::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SweepProgressEvent {
    pub stage: SweepStage,
    pub key: Option<ArchiveKey>,
    /// 1-based position of the pair in the sweep.
    pub run_index: usize,
    pub total_runs: usize,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
}

impl SweepProgressEvent {
    pub fn fraction_complete(&self) -> f64 {
        if self.total_runs == 0 {
            return 1.0;
        }
        self.run_index.saturating_sub(1) as f64 / self.total_runs as f64
    }
}
