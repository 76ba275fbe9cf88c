use std::path::PathBuf;

use thiserror::Error;

use crate::grid::ShapeDescriptor;
use crate::scene::BucketKey;

#[derive(Error, Debug)]
pub enum ClearskyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("No candidate scene for bucket {bucket}")]
    NoCandidateForBucket { bucket: BucketKey },

    #[error("Grid mismatch in bucket {bucket}: scene {scene_id} is {found}, expected {expected}")]
    GridMismatch {
        bucket: BucketKey,
        scene_id: String,
        expected: ShapeDescriptor,
        found: ShapeDescriptor,
    },

    #[error("No scenes retained for bucket {bucket}")]
    EmptySelection { bucket: BucketKey },

    #[error("Date search needs {combinations} combinations (limit {limit})")]
    CombinationLimitExceeded { combinations: u64, limit: u64 },

    #[error("Scene {scene_id} has no band '{band}'")]
    MissingBand { scene_id: String, band: String },

    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Invalid naming template: {0}")]
    InvalidTemplate(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Output {} already written by another composite", path.display())]
    DuplicateOutput { path: PathBuf },

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, ClearskyError>;
