use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use inos_core::Orchestrator;

mod commands;
mod config;
mod harness;

use config::ConfigLoader;

#[derive(Parser)]
#[command(name = "inos", about = "Run device diagnostics assessments from a bench")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file layered over the user and project config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root of a mounted device filesystem to inspect for jailbreak markers.
    /// Without it no markers are looked up and the jailbreak check passes
    #[arg(long, global = true)]
    device_root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List enabled assessments and the device status summary
    List(commands::assessments::ListArgs),
    /// Run one assessment
    Run(commands::run::RunArgs),
    /// Run every enabled assessment in order
    Serial,
    /// Show stored results
    Results,
    /// Forget stored results
    Reset(commands::results::ResetArgs),
    /// Inspect configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let explicit = cli.config.as_deref();
    let device_root = cli.device_root;
    match cli.command {
        Commands::Config(args) => commands::config::run(args, explicit),
        Commands::List(args) => {
            let orchestrator = open(explicit, device_root).await?;
            commands::assessments::run(args, &orchestrator).await
        }
        Commands::Run(args) => {
            commands::run::run_single(args, open(explicit, device_root).await?).await
        }
        Commands::Serial => commands::run::run_serial(open(explicit, device_root).await?).await,
        Commands::Results => commands::results::show(&open(explicit, device_root).await?).await,
        Commands::Reset(args) => {
            commands::results::reset(args, &open(explicit, device_root).await?).await
        }
    }
}

async fn open(explicit: Option<&Path>, device_root: Option<PathBuf>) -> Result<Orchestrator> {
    let config = ConfigLoader::load(explicit)?;
    harness::build_orchestrator(&config, device_root).await
}
