use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, ValueEnum};
use clearsky_core::compute::WorkerPool;
use clearsky_core::coverage::{coverage_records_with_progress, CoverageTable};
use clearsky_core::io::catalog::{LoadOptions, SceneCatalog};
use clearsky_core::mask::ExcludedClasses;
use clearsky_core::pipeline::config::DateRange;
use clearsky_core::scene::BucketGranularity;
use indicatif::{ProgressBar, ProgressStyle};

/// Catalog and pre-filter flags shared by the scene-level commands.
#[derive(Args)]
pub struct SceneArgs {
    /// Scene catalog (JSON)
    pub catalog: PathBuf,

    /// First acquisition date to consider (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last acquisition date to consider (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Drop scenes whose catalog cloud cover exceeds this percentage
    #[arg(long)]
    pub max_cloud: Option<f64>,

    /// Comma-separated classification codes treated as invalid
    #[arg(long, value_delimiter = ',', default_value = "3,8,9")]
    pub exclude: Vec<u8>,

    /// Classification no-data code, unless the asset declares one
    #[arg(long, default_value = "0")]
    pub class_nodata: u8,

    /// Worker threads (default: one per core)
    #[arg(long)]
    pub threads: Option<usize>,
}

impl SceneArgs {
    pub fn date_range(&self) -> Result<Option<DateRange>> {
        date_range(self.start, self.end)
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum GranularityArg {
    Year,
    Month,
}

impl From<GranularityArg> for BucketGranularity {
    fn from(arg: GranularityArg) -> Self {
        match arg {
            GranularityArg::Year => BucketGranularity::Year,
            GranularityArg::Month => BucketGranularity::Month,
        }
    }
}

/// Whole-day inclusive window; open ends fall back to the extremes of chrono's range.
pub fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Option<DateRange>> {
    if start.is_none() && end.is_none() {
        return Ok(None);
    }
    let start = match start {
        Some(d) => d.and_time(NaiveTime::MIN).and_utc(),
        None => DateTime::<Utc>::MIN_UTC,
    };
    let end = match end {
        Some(d) => d
            .and_hms_milli_opt(23, 59, 59, 999)
            .context("Invalid end date")?
            .and_utc(),
        None => DateTime::<Utc>::MAX_UTC,
    };
    Ok(Some(DateRange { start, end }))
}

/// Coverage of the scenes that passed the catalog pre-filters.
pub struct ScoredScenes {
    pub table: CoverageTable,
    /// Acquisition times of every scene considered, scored or not.
    pub considered: Vec<DateTime<Utc>>,
    /// Pool the scenes were scored on, for follow-up work.
    pub pool: WorkerPool,
}

/// Open the catalog, load classification grids and score every scene.
pub fn score_scenes(args: &SceneArgs) -> Result<ScoredScenes> {
    let catalog = SceneCatalog::open(&args.catalog)
        .with_context(|| format!("Failed to open catalog {}", args.catalog.display()))?;
    let range = args.date_range()?;
    let descriptors = catalog.filter(range.as_ref(), args.max_cloud);
    let pool = WorkerPool::new(args.threads)?;

    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Loading {} scenes", descriptors.len()));
    let options = LoadOptions {
        classification_only: true,
        classification_nodata: args.class_nodata,
        ..Default::default()
    };
    let loaded = catalog.load_scenes(&descriptors, &options, &pool);
    pb.finish_and_clear();

    let pb = ProgressBar::new(loaded.scenes.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    pb.set_message("Scoring coverage");
    let excluded = ExcludedClasses::new(&args.exclude);
    let mut table = coverage_records_with_progress(&loaded.scenes, &excluded, &pool, |done| {
        pb.set_position(done as u64);
    });
    pb.finish_and_clear();

    table.failures.extend(loaded.failures);
    for (id, error) in &table.failures {
        eprintln!("warning: scene {id} skipped: {error}");
    }
    Ok(ScoredScenes {
        table,
        considered: descriptors.iter().map(|d| d.datetime).collect(),
        pool,
    })
}
