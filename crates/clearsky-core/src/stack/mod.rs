pub mod median;

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::compute::WorkerPool;
use crate::consts::{DEFAULT_CHUNK_ROWS, DEFAULT_FILL_VALUE};
use crate::error::{ClearskyError, Result};
use crate::grid::Grid;
use crate::mask::{mask_band, ExcludedClasses};
use crate::scene::{BucketKey, Scene};
use crate::select::ChosenScene;

use median::median_stack;

/// How a bucket's scenes are reduced to one grid.
#[derive(Clone, Debug)]
pub struct AggregateOptions {
    /// Value band to reduce.
    pub band: String,
    /// Written where no valid sample survives.
    pub fill: f32,
    /// When set, each band is masked by its scene's validity grid first.
    pub mask: Option<ExcludedClasses>,
    pub chunk_rows: usize,
}

impl AggregateOptions {
    pub fn new(band: &str) -> Self {
        Self {
            band: band.to_string(),
            fill: DEFAULT_FILL_VALUE,
            mask: Some(ExcludedClasses::default()),
            chunk_rows: DEFAULT_CHUNK_ROWS,
        }
    }
}

/// Per-bucket, per-band temporal composite.
#[derive(Clone, Debug)]
pub struct Composite {
    pub bucket: BucketKey,
    pub band: String,
    pub grid: Grid<f32>,
    /// Contributing scenes, ascending by timestamp.
    pub scenes: Vec<ChosenScene>,
    pub fill: f32,
}

impl Composite {
    /// `YYYY-MM-DD` of the single contributing scene, else the bucket label.
    pub fn date_label(&self) -> String {
        match self.scenes.as_slice() {
            [only] => only.timestamp.format("%Y-%m-%d").to_string(),
            _ => self.bucket.to_string(),
        }
    }
}

/// Reduce every bucket independently; one bucket failing leaves the others intact.
pub fn aggregate(
    scenes_by_bucket: &BTreeMap<BucketKey, Vec<&Scene>>,
    options: &AggregateOptions,
    pool: &WorkerPool,
) -> BTreeMap<BucketKey, Result<Composite>> {
    scenes_by_bucket
        .iter()
        .map(|(bucket, scenes)| {
            let result = aggregate_bucket(*bucket, scenes, options, pool);
            match &result {
                Ok(c) => info!(
                    %bucket,
                    band = %options.band,
                    scenes = c.scenes.len(),
                    "Composite ready"
                ),
                Err(ClearskyError::EmptySelection { .. }) => {
                    info!(%bucket, "Empty bucket, no composite")
                }
                Err(e) => warn!(%bucket, band = %options.band, error = %e, "Compositing failed"),
            }
            (*bucket, result)
        })
        .collect()
}

/// Median composite of one bucket's scenes for `options.band`.
pub fn aggregate_bucket(
    bucket: BucketKey,
    scenes: &[&Scene],
    options: &AggregateOptions,
    pool: &WorkerPool,
) -> Result<Composite> {
    if scenes.is_empty() {
        return Err(ClearskyError::EmptySelection { bucket });
    }

    let mut members: Vec<(&Scene, &Grid<f32>)> = Vec::with_capacity(scenes.len());
    for scene in scenes {
        let band = scene
            .band(&options.band)
            .ok_or_else(|| ClearskyError::MissingBand {
                scene_id: scene.id.clone(),
                band: options.band.clone(),
            })?;
        members.push((scene, band));
    }
    members.sort_by(|a, b| a.0.timestamp.cmp(&b.0.timestamp).then_with(|| a.0.id.cmp(&b.0.id)));

    let expected = members[0].1.shape_descriptor();
    for (scene, band) in &members[1..] {
        let found = band.shape_descriptor();
        if !expected.matches(&found) {
            return Err(ClearskyError::GridMismatch {
                bucket,
                scene_id: scene.id.clone(),
                expected,
                found,
            });
        }
    }

    let masked: Vec<Grid<f32>> = match &options.mask {
        Some(excluded) => members
            .iter()
            .map(|(scene, band)| mask_band(band, &scene.classification, excluded))
            .collect::<Result<_>>()?,
        None => Vec::new(),
    };
    let stack: Vec<&Grid<f32>> = if options.mask.is_some() {
        masked.iter().collect()
    } else {
        members.iter().map(|(_, band)| *band).collect()
    };

    debug!(%bucket, band = %options.band, members = stack.len(), "Median reduction");
    let grid = pool.install(|| median_stack(&stack, options.fill, options.chunk_rows))?;

    Ok(Composite {
        bucket,
        band: options.band.clone(),
        grid,
        scenes: members
            .iter()
            .map(|(scene, _)| ChosenScene {
                scene_id: scene.id.clone(),
                timestamp: scene.timestamp,
            })
            .collect(),
        fill: options.fill,
    })
}
