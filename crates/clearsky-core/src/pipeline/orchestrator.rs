use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::info;

use crate::compute::WorkerPool;
use crate::coverage::coverage_records_with_progress;
use crate::error::Result;
use crate::io::catalog::{LoadOptions, SceneCatalog};
use crate::io::naming::NamingMetadata;
use crate::io::writer::{write_composites, GeoTiffWriter, RasterWriter};
use crate::scene::{BucketKey, Scene};
use crate::select::{select_dates_expecting, SelectionResult};
use crate::stack::{aggregate, AggregateOptions, Composite};

use super::config::PipelineConfig;
use super::types::{BucketFailure, NoOpReporter, PipelineReport, PipelineStage, ProgressReporter};

/// Run the full pipeline, writing GeoTIFF rasters.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport> {
    run_pipeline_reported(config, Arc::new(NoOpReporter))
}

/// Run the full pipeline with a thread-safe progress reporter.
pub fn run_pipeline_reported(
    config: &PipelineConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<PipelineReport> {
    run_pipeline_with_writer(config, &GeoTiffWriter, reporter)
}

/// Run the full pipeline with a caller-supplied raster writer.
///
/// Scene load failures and per-bucket compositing or write failures are
/// collected in the report; only configuration, catalog and infeasible
/// selection errors abort the run.
pub fn run_pipeline_with_writer(
    config: &PipelineConfig,
    writer: &dyn RasterWriter,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<PipelineReport> {
    config.validate()?;
    let template = config.naming_template()?;
    let pool = WorkerPool::new(config.execution.threads)?;

    let catalog = SceneCatalog::open(&config.catalog)?;
    let descriptors = catalog.filter(config.date_range.as_ref(), config.max_cloud_cover_scene);
    info!(
        catalog_scenes = catalog.len(),
        considered = descriptors.len(),
        threads = pool.threads(),
        "Catalog loaded"
    );

    // Buckets are fixed by the catalog, so a year whose scenes all fail to
    // load is still visible to selection.
    let expected_buckets = config
        .selection
        .granularity
        .keys(descriptors.iter().map(|d| &d.datetime));

    let mut report = PipelineReport {
        scenes_considered: descriptors.len(),
        ..Default::default()
    };

    // Load
    reporter.begin_stage(PipelineStage::Loading, Some(descriptors.len()));
    let load_options = LoadOptions {
        bands: config.compositing.bands.clone(),
        classification_only: false,
        extent: config.extent,
        classification_nodata: config.masking.classification_nodata,
    };
    let loaded = catalog.load_scenes(&descriptors, &load_options, &pool);
    reporter.finish_stage();
    if config.execution.require_all_scenes {
        if let Some((_, error)) = loaded.failures.into_iter().next() {
            return Err(error);
        }
    } else {
        report.scene_failures.extend(loaded.failures);
    }
    let scenes = loaded.scenes;

    // Coverage
    let excluded = config.masking.excluded();
    reporter.begin_stage(PipelineStage::Coverage, Some(scenes.len()));
    let r = reporter.clone();
    let table = coverage_records_with_progress(&scenes, &excluded, &pool, move |done| {
        r.advance(done);
    });
    reporter.finish_stage();
    report.scene_failures.extend(table.failures);

    // Selection
    reporter.begin_stage(PipelineStage::Selection, None);
    let selection =
        select_dates_expecting(&table.records, &expected_buckets, &config.selection, &pool)?;
    reporter.finish_stage();
    report.coverage = table.records;

    // Compositing
    let scenes_by_bucket = group_scenes(&scenes, &selection);
    let mut composites: Vec<Composite> = Vec::new();
    reporter.begin_stage(
        PipelineStage::Compositing,
        Some(scenes_by_bucket.len() * config.compositing.bands.len()),
    );
    let mut done = 0;
    for band in &config.compositing.bands {
        let options = AggregateOptions {
            band: band.clone(),
            fill: config.compositing.fill_value,
            mask: config.masking.mask_bands.then(|| excluded.clone()),
            chunk_rows: config.compositing.chunk_rows,
        };
        for (bucket, result) in aggregate(&scenes_by_bucket, &options, &pool) {
            match result {
                Ok(composite) => composites.push(composite),
                Err(error) => report.bucket_failures.push(BucketFailure {
                    bucket,
                    band: band.clone(),
                    error,
                }),
            }
            done += 1;
            reporter.advance(done);
        }
    }
    reporter.finish_stage();

    // Writing
    reporter.begin_stage(PipelineStage::Writing, Some(composites.len()));
    std::fs::create_dir_all(&config.output_dir)?;
    let naming = NamingMetadata {
        tile: config
            .output
            .tile
            .clone()
            .or_else(|| catalog.tile.clone())
            .unwrap_or_else(|| NamingMetadata::default().tile),
        orbit: config
            .output
            .orbit
            .clone()
            .or_else(|| catalog.orbit.clone())
            .unwrap_or_else(|| NamingMetadata::default().orbit),
    };
    let written = write_composites(writer, &composites, &template, &naming, &config.output_dir);
    reporter.advance(composites.len());
    reporter.finish_stage();

    report.written = written.written;
    report
        .bucket_failures
        .extend(written.failed.into_iter().map(|f| BucketFailure {
            bucket: f.bucket,
            band: f.band,
            error: f.error,
        }));
    report.selection = selection;

    info!(
        written = report.written.len(),
        failed_buckets = report.bucket_failures.len(),
        failed_scenes = report.scene_failures.len(),
        "Pipeline complete"
    );
    Ok(report)
}

/// Member scenes of every selected bucket, looked up by scene id.
pub fn group_scenes<'a>(
    scenes: &'a [Scene],
    selection: &SelectionResult,
) -> BTreeMap<BucketKey, Vec<&'a Scene>> {
    let by_id: HashMap<&str, &Scene> = scenes.iter().map(|s| (s.id.as_str(), s)).collect();
    selection
        .buckets
        .iter()
        .map(|(bucket, chosen)| {
            let members = chosen
                .iter()
                .filter_map(|c| by_id.get(c.scene_id.as_str()).copied())
                .collect();
            (*bucket, members)
        })
        .collect()
}
