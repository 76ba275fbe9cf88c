use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use clearsky_core::io::catalog::SceneCatalog;

#[derive(Args)]
pub struct InfoArgs {
    /// Scene catalog (JSON)
    pub catalog: PathBuf,

    /// List every scene
    #[arg(long)]
    pub scenes: bool,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let catalog = SceneCatalog::open(&args.catalog)
        .with_context(|| format!("Failed to open catalog {}", args.catalog.display()))?;

    println!("Catalog:     {}", args.catalog.display());
    println!("Tile:        {}", catalog.tile.as_deref().unwrap_or("unknown"));
    println!("Orbit:       {}", catalog.orbit.as_deref().unwrap_or("unknown"));
    println!("Scenes:      {}", catalog.len());

    if let (Some(first), Some(last)) = (catalog.scenes.first(), catalog.scenes.last()) {
        println!(
            "Span:        {} .. {}",
            first.datetime.format("%Y-%m-%d"),
            last.datetime.format("%Y-%m-%d")
        );
    }

    let bands: BTreeSet<&str> = catalog
        .scenes
        .iter()
        .flat_map(|d| d.bands.keys().map(String::as_str))
        .collect();
    let crs: BTreeSet<&str> = catalog.scenes.iter().map(|d| d.crs.as_str()).collect();
    println!("Bands:       {}", bands.into_iter().collect::<Vec<_>>().join(", "));
    println!("CRS:         {}", crs.into_iter().collect::<Vec<_>>().join(", "));

    if args.scenes {
        println!();
        println!("{:<32}  {:>10}  {:>8}", "Scene", "Date", "Cloud %");
        println!("{}", "-".repeat(54));
        for desc in &catalog.scenes {
            let cloud = desc
                .cloud_cover
                .map(|c| format!("{c:.1}"))
                .unwrap_or_else(|| "-".into());
            println!(
                "{:<32}  {:>10}  {:>8}",
                desc.id,
                desc.datetime.format("%Y-%m-%d"),
                cloud
            );
        }
    }

    Ok(())
}
