use anyhow::Result;
use clap::{Args, ValueEnum};
use clearsky_core::consts::{DEFAULT_MAX_COMBINATIONS, DEFAULT_MIN_FRACTION_VALID};
use clearsky_core::pipeline::config::{
    SearchConfig, SearchStrategy, SelectionConfig, SelectionPolicy,
};
use clearsky_core::select::select_dates_expecting;

use super::scenes::{score_scenes, GranularityArg, SceneArgs};

#[derive(Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    RetainAll,
    Representative,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    Exhaustive,
    Greedy,
}

/// Selection flags shared by `select` and `run`.
#[derive(Args)]
pub struct SelectionArgs {
    /// Date selection policy
    #[arg(long, value_enum, default_value = "retain-all")]
    pub policy: PolicyArg,

    /// Scenes need strictly more valid pixels than this fraction
    #[arg(long, default_value_t = DEFAULT_MIN_FRACTION_VALID)]
    pub min_fraction: f64,

    /// Temporal bucket size
    #[arg(long, value_enum, default_value = "year")]
    pub granularity: GranularityArg,

    /// Comma-separated months (1-12) eligible for representative dates
    #[arg(long, value_delimiter = ',')]
    pub months: Vec<u32>,

    /// Search strategy for representative dates
    #[arg(long, value_enum, default_value = "exhaustive")]
    pub strategy: StrategyArg,

    /// Refuse exhaustive searches with more combinations than this (0 = no cap)
    #[arg(long, default_value_t = DEFAULT_MAX_COMBINATIONS)]
    pub max_combinations: u64,
}

impl SelectionArgs {
    pub fn to_config(&self) -> SelectionConfig {
        SelectionConfig {
            policy: match self.policy {
                PolicyArg::RetainAll => SelectionPolicy::RetainAll,
                PolicyArg::Representative => SelectionPolicy::RepresentativeSingleDate,
            },
            min_fraction_valid: self.min_fraction,
            granularity: self.granularity.into(),
            allowed_months: self.months.clone(),
            search: SearchConfig {
                strategy: match self.strategy {
                    StrategyArg::Exhaustive => SearchStrategy::Exhaustive,
                    StrategyArg::Greedy => SearchStrategy::Greedy,
                },
                max_combinations: (self.max_combinations > 0).then_some(self.max_combinations),
            },
        }
    }
}

#[derive(Args)]
pub struct SelectArgs {
    #[command(flatten)]
    pub scenes: SceneArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,
}

pub fn run(args: &SelectArgs) -> Result<()> {
    let scored = score_scenes(&args.scenes)?;
    let table = &scored.table;
    let config = args.selection.to_config();
    let expected = config.granularity.keys(&scored.considered);
    let result = select_dates_expecting(&table.records, &expected, &config, &scored.pool)?;

    println!(
        "\n{} over {} scored scenes:",
        config.policy,
        table.records.len()
    );
    println!("{:>8}  {:<32}  {:>10}  {:>9}", "Bucket", "Scene", "Date", "Valid");
    println!("{}", "-".repeat(66));
    for (bucket, chosen) in &result.buckets {
        for scene in chosen {
            let valid = table
                .get(&scene.scene_id)
                .map(|r| format!("{:.2}%", r.fraction_valid * 100.0))
                .unwrap_or_default();
            println!(
                "{:>8}  {:<32}  {:>10}  {:>9}",
                bucket.to_string(),
                scene.scene_id,
                scene.timestamp.format("%Y-%m-%d"),
                valid
            );
        }
    }

    for bucket in &result.skipped {
        println!("{:>8}  (no eligible scene)", bucket.to_string());
    }
    if let Some(distance) = result.total_distance {
        println!("\nTotal day-of-year distance: {distance}");
    }
    println!(
        "{} scene(s) selected across {} bucket(s)",
        result.scene_count(),
        result.buckets.len()
    );

    Ok(())
}
