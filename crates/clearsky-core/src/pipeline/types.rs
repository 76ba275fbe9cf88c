use std::path::PathBuf;

use crate::error::ClearskyError;
use crate::scene::{BucketKey, CoverageRecord};
use crate::select::SelectionResult;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Loading,
    Coverage,
    Selection,
    Compositing,
    Writing,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "Loading scenes"),
            Self::Coverage => write!(f, "Scoring coverage"),
            Self::Selection => write!(f, "Selecting dates"),
            Self::Compositing => write!(f, "Compositing"),
            Self::Writing => write!(f, "Writing output"),
        }
    }
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage (e.g., scene count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run_pipeline` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// A bucket/band pair that produced no output file.
#[derive(Debug)]
pub struct BucketFailure {
    pub bucket: BucketKey,
    pub band: String,
    pub error: ClearskyError,
}

/// Everything a run produced or gave up on.
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Scenes left after the catalog pre-filters.
    pub scenes_considered: usize,
    /// Sorted by `(timestamp, scene_id)`.
    pub coverage: Vec<CoverageRecord>,
    pub selection: SelectionResult,
    pub written: Vec<PathBuf>,
    /// Scenes that could not be loaded or scored.
    pub scene_failures: Vec<(String, ClearskyError)>,
    pub bucket_failures: Vec<BucketFailure>,
}
