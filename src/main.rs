mod campaign;
mod config;
mod date_table;
mod dispatch;

use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

use campaign::CampaignRunner;
use config::{Config, Stage, StageParseError};
use dispatch::{CommandRunner, DryRunner, ShellRunner};

/// Day-by-day dispatcher for detector processing campaigns
#[derive(Parser)]
#[command(name = "etesian")]
#[command(about = "Dispatch daily processing jobs over the configured date segments", long_about = None)]
struct Cli {
    /// Stage to dispatch: filesep, hitconv, trackmatch or all
    #[arg(default_value = "all", value_parser = StageSelection::from_str)]
    stage: StageSelection,

    /// Path to the campaign configuration file
    #[arg(short = 'c', long, default_value = "./data/config/campaign.json")]
    config: PathBuf,

    /// Print each command line instead of spawning it
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy)]
enum StageSelection {
    All,
    One(Stage),
}

impl FromStr for StageSelection {
    type Err = StageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(StageSelection::All)
        } else {
            Ok(StageSelection::One(s.parse()?))
        }
    }
}

impl StageSelection {
    fn stages(self) -> Vec<Stage> {
        match self {
            StageSelection::All => Stage::all().to_vec(),
            StageSelection::One(stage) => vec![stage],
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    let config = Config::from_file(&cli.config)?;
    debug!("Loaded campaign configuration from {}", cli.config.display());

    let shell = ShellRunner;
    let dry = DryRunner;
    let runner: &dyn CommandRunner = if cli.dry_run { &dry } else { &shell };

    let campaign = CampaignRunner::new(&config, runner);

    for stage in cli.stage.stages() {
        let report = campaign.run_stage(stage)?;

        println!(
            "{}: {} days dispatched, {} succeeded, {} failed",
            stage,
            report.dispatched,
            report.succeeded,
            report.failed.len()
        );

        if !report.all_succeeded() {
            println!("  Failed days: {:?}", report.failed);
        }
    }

    Ok(())
}
