mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clearsky", about = "Cloud-free temporal composites from satellite scene time series")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise a scene catalog
    Info(commands::info::InfoArgs),
    /// Score scenes by fraction of valid pixels
    Coverage(commands::coverage::CoverageArgs),
    /// Select scenes per time bucket
    Select(commands::select::SelectArgs),
    /// Run the full compositing pipeline
    Run(commands::pipeline::RunArgs),
    /// Print a default pipeline config (TOML)
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Coverage(args) => commands::coverage::run(args),
        Commands::Select(args) => commands::select::run(args),
        Commands::Run(args) => commands::pipeline::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
