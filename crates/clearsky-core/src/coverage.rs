use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::compute::WorkerPool;
use crate::error::{ClearskyError, Result};
use crate::grid::Grid;
use crate::mask::{validity_mask, ExcludedClasses};
use crate::scene::{CoverageRecord, Scene};

/// Fraction of `true` pixels over the full grid extent.
pub fn coverage_fraction(mask: &Grid<bool>) -> Result<f64> {
    if mask.is_empty() {
        return Err(ClearskyError::InvalidGrid(format!(
            "zero-area mask ({}x{})",
            mask.rows(),
            mask.cols()
        )));
    }
    let valid = mask.data.iter().filter(|&&v| v).count();
    Ok(valid as f64 / mask.data.len() as f64)
}

/// Mask a scene's classification and score it.
pub fn scene_coverage(scene: &Scene, excluded: &ExcludedClasses) -> Result<CoverageRecord> {
    let mask = validity_mask(&scene.classification, excluded);
    let fraction_valid = coverage_fraction(&mask)?;
    Ok(CoverageRecord {
        scene_id: scene.id.clone(),
        timestamp: scene.timestamp,
        fraction_valid,
    })
}

/// Per-scene coverage for a whole collection.
#[derive(Debug, Default)]
pub struct CoverageTable {
    /// Sorted by `(timestamp, scene_id)`.
    pub records: Vec<CoverageRecord>,
    /// Scenes whose coverage could not be computed.
    pub failures: Vec<(String, ClearskyError)>,
}

impl CoverageTable {
    pub fn get(&self, scene_id: &str) -> Option<&CoverageRecord> {
        self.records.iter().find(|r| r.scene_id == scene_id)
    }
}

/// Score every scene on the worker pool.
pub fn coverage_records(
    scenes: &[Scene],
    excluded: &ExcludedClasses,
    pool: &WorkerPool,
) -> CoverageTable {
    coverage_records_with_progress(scenes, excluded, pool, |_| {})
}

/// Score every scene, calling `on_progress(items_done)` as each completes.
///
/// Results are keyed by scene id, so completion order does not matter; the
/// returned records are sorted by `(timestamp, scene_id)`. A scene that fails
/// is recorded in `failures` and does not affect the others.
pub fn coverage_records_with_progress(
    scenes: &[Scene],
    excluded: &ExcludedClasses,
    pool: &WorkerPool,
    on_progress: impl Fn(usize) + Send + Sync,
) -> CoverageTable {
    let done = AtomicUsize::new(0);
    let results: Vec<(String, Result<CoverageRecord>)> = pool.install(|| {
        scenes
            .par_iter()
            .map(|scene| {
                let result = scene_coverage(scene, excluded);
                on_progress(done.fetch_add(1, Ordering::Relaxed) + 1);
                (scene.id.clone(), result)
            })
            .collect()
    });

    let mut table = CoverageTable::default();
    for (scene_id, result) in results {
        match result {
            Ok(record) => {
                debug!(
                    scene = %record.scene_id,
                    fraction_valid = record.fraction_valid,
                    "Scene coverage"
                );
                table.records.push(record);
            }
            Err(e) => {
                warn!(scene = %scene_id, error = %e, "Coverage failed");
                table.failures.push((scene_id, e));
            }
        }
    }
    table
        .records
        .sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.scene_id.cmp(&b.scene_id)));
    table
}
