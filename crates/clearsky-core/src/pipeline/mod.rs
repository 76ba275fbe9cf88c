pub mod config;
mod orchestrator;
mod types;

pub use orchestrator::{group_scenes, run_pipeline, run_pipeline_reported, run_pipeline_with_writer};
pub use types::{BucketFailure, PipelineReport, PipelineStage, ProgressReporter};
