use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use clearsky_core::consts::DEFAULT_FILL_VALUE;
use clearsky_core::grid::Bounds;
use clearsky_core::pipeline::config::PipelineConfig;
use clearsky_core::pipeline::run_pipeline_reported;
use tracing::debug;

use super::scenes::date_range;
use super::select::SelectionArgs;
use crate::progress::BarReporter;
use crate::summary::{print_pipeline_summary, print_report};

#[derive(Args)]
pub struct RunArgs {
    /// Scene catalog (JSON); ignored when --config is given
    pub catalog: Option<PathBuf>,

    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "composites")]
    pub output: PathBuf,

    /// First acquisition date to consider (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last acquisition date to consider (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Drop scenes whose catalog cloud cover exceeds this percentage
    #[arg(long)]
    pub max_cloud: Option<f64>,

    /// Target extent as min_x,min_y,max_x,max_y in the scenes' CRS
    #[arg(long, value_delimiter = ',')]
    pub extent: Option<Vec<f64>>,

    /// Comma-separated classification codes treated as invalid
    #[arg(long, value_delimiter = ',', default_value = "3,8,9")]
    pub exclude: Vec<u8>,

    /// Composite unmasked band values (coverage still uses the mask)
    #[arg(long)]
    pub no_mask_bands: bool,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Comma-separated bands to composite
    #[arg(long, value_delimiter = ',', default_value = "B04")]
    pub bands: Vec<String>,

    /// Value written where no valid sample exists
    #[arg(long, default_value_t = DEFAULT_FILL_VALUE)]
    pub fill: f32,

    /// Output file naming template (default depends on --policy)
    #[arg(long)]
    pub template: Option<String>,

    /// Worker threads (default: one per core)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Fail if any scene cannot be loaded
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid pipeline config")?
    } else {
        build_config_from_args(args)?
    };
    config.validate().context("Invalid pipeline config")?;
    debug!(?config, "Resolved pipeline config");

    print_pipeline_summary(&config);

    let report = run_pipeline_reported(&config, Arc::new(BarReporter::new()))?;
    print_report(&report);

    println!(
        "\n{} composite(s) saved to {}",
        report.written.len(),
        config.output_dir.display()
    );
    Ok(())
}

fn build_config_from_args(args: &RunArgs) -> Result<PipelineConfig> {
    let catalog = args
        .catalog
        .clone()
        .context("A catalog path or --config is required")?;

    let mut config = PipelineConfig::new(catalog, args.output.clone());
    config.date_range = date_range(args.start, args.end)?;
    config.max_cloud_cover_scene = args.max_cloud;
    config.extent = args
        .extent
        .as_deref()
        .map(|e| match e {
            [min_x, min_y, max_x, max_y] => Ok(Bounds::new(*min_x, *min_y, *max_x, *max_y)),
            _ => anyhow::bail!("--extent takes exactly four values"),
        })
        .transpose()?;
    config.masking.excluded_classes = args.exclude.clone();
    config.masking.mask_bands = !args.no_mask_bands;
    config.selection = args.selection.to_config();
    config.compositing.bands = args.bands.clone();
    config.compositing.fill_value = args.fill;
    config.output.naming_template = args.template.clone();
    config.execution.threads = args.threads;
    config.execution.require_all_scenes = args.strict;
    Ok(config)
}
