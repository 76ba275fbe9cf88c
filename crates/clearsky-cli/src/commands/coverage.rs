use anyhow::Result;
use clap::Args;
use clearsky_core::consts::DEFAULT_MIN_FRACTION_VALID;
use clearsky_core::scene::BucketGranularity;

use super::scenes::{score_scenes, GranularityArg, SceneArgs};

#[derive(Args)]
pub struct CoverageArgs {
    #[command(flatten)]
    pub scenes: SceneArgs,

    /// Coverage threshold used to flag eligible scenes
    #[arg(long, default_value_t = DEFAULT_MIN_FRACTION_VALID)]
    pub min_fraction: f64,

    /// Temporal bucket size
    #[arg(long, value_enum, default_value = "year")]
    pub granularity: GranularityArg,
}

pub fn run(args: &CoverageArgs) -> Result<()> {
    let table = score_scenes(&args.scenes)?.table;
    let granularity = BucketGranularity::from(args.granularity);

    println!(
        "\n{:<32}  {:>10}  {:>8}  {:>9}  {}",
        "Scene", "Date", "Bucket", "Valid", "Eligible"
    );
    println!("{}", "-".repeat(72));

    let mut eligible = 0;
    for record in &table.records {
        let passes = record.fraction_valid > args.min_fraction;
        if passes {
            eligible += 1;
        }
        println!(
            "{:<32}  {:>10}  {:>8}  {:>8.2}%  {}",
            record.scene_id,
            record.timestamp.format("%Y-%m-%d"),
            granularity.key(&record.timestamp),
            record.fraction_valid * 100.0,
            if passes { "yes" } else { "no" }
        );
    }

    println!(
        "\n{} of {} scenes above {:.0}% valid",
        eligible,
        table.records.len(),
        args.min_fraction * 100.0
    );
    if !table.failures.is_empty() {
        println!("{} scene(s) could not be scored", table.failures.len());
    }

    Ok(())
}
