//! isched - Multi-agent intention scheduling toolkit
//!
//! This CLI provides a unified interface for:
//! - Playing single matches between two schedulers
//! - Running full pairing experiments with CSV output
//! - Inspecting the coverage annotations of a forest
//! - Generating synthetic goal-plan forests

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use intention_scheduler::cli::commands::{coverage, experiment, generate, run};

#[derive(Parser)]
#[command(name = "isched")]
#[command(version, about = "Multi-agent intention scheduling toolkit", long_about = None)]
struct Cli {
    /// Log per-turn decisions (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a two-sided series between two schedulers
    Run(Box<run::RunArgs>),

    /// Pair the whole roster under every alliance mode
    Experiment(experiment::ExperimentArgs),

    /// Show coverage values of a forest
    Coverage(coverage::CoverageArgs),

    /// Generate synthetic forests as JSON
    Generate(generate::GenerateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => run::execute(*args),
        Commands::Experiment(args) => experiment::execute(args),
        Commands::Coverage(args) => coverage::execute(args),
        Commands::Generate(args) => generate::execute(args),
    }
}
