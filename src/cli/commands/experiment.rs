use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::output::{print_kv, print_section},
    config::ExperimentConfig,
    export::MatchResultsWriter,
    pipeline::{ExperimentRunner, ProgressObserver, SchedulerKind, SummaryObserver},
    ports::MatchObserver,
    simulation::MatchReport,
};

#[derive(Parser, Debug)]
#[command(about = "Pair every scheduler of the roster under every alliance mode")]
pub struct ExperimentArgs {
    /// Experiment configuration (JSON); defaults are used when omitted
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Number of forests to play on
    #[arg(long, short = 'r')]
    pub repetitions: Option<usize>,

    /// Play every repetition on this forest file instead of generated ones
    #[arg(long, short = 'f')]
    pub forest: Option<PathBuf>,

    /// Comma-separated scheduler names
    #[arg(long, value_delimiter = ',')]
    pub roster: Option<Vec<SchedulerKind>>,

    #[arg(long, short = 'a')]
    pub alpha: Option<usize>,

    #[arg(long, short = 'b')]
    pub beta: Option<usize>,

    /// Add a fully aware MCTS self-play match with this alpha
    #[arg(long)]
    pub extra_alpha: Option<usize>,

    /// Run MCTS rollouts on the rayon thread pool
    #[arg(long)]
    pub parallel: bool,

    #[arg(long, short = 's')]
    pub seed: Option<u64>,

    /// Results CSV (appended)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub quiet: bool,
}

impl ExperimentArgs {
    fn resolve(&self) -> Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ExperimentConfig::default(),
        };
        if let Some(repetitions) = self.repetitions {
            config = config.with_repetitions(repetitions);
        }
        if let Some(forest) = &self.forest {
            config = config.with_forest(forest);
        }
        if let Some(roster) = &self.roster {
            config = config.with_roster(roster.clone());
        }
        if let Some(alpha) = self.alpha {
            config.mcts = config.mcts.with_alpha(alpha);
        }
        if let Some(beta) = self.beta {
            config.mcts = config.mcts.with_beta(beta);
        }
        if self.parallel {
            config.mcts = config.mcts.with_parallel_rollouts(true);
        }
        if let Some(alpha) = self.extra_alpha {
            config = config.with_extra_alpha(alpha);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(output) = &self.output {
            config = config.with_output(output);
        }
        Ok(config)
    }
}

/// Keeps the summary readable after the run by sharing it with the runner.
struct SharedSummary(Arc<Mutex<SummaryObserver>>);

impl MatchObserver for SharedSummary {
    fn on_match_end(&mut self, report: &MatchReport) -> crate::Result<()> {
        match self.0.lock() {
            Ok(mut summary) => summary.on_match_end(report),
            Err(_) => Ok(()),
        }
    }
}

pub fn execute(args: ExperimentArgs) -> Result<()> {
    let config = args.resolve()?;

    print_section("Experiment");
    print_kv("Repetitions", &config.repetitions.to_string());
    let roster: Vec<String> = config.roster.iter().map(ToString::to_string).collect();
    print_kv("Roster", &roster.join(", "));
    print_kv(
        "MCTS",
        &format!(
            "alpha={} beta={} c={}",
            config.mcts.alpha, config.mcts.beta, config.mcts.c
        ),
    );
    match &config.forest {
        Some(path) => print_kv("Forest", &path.display().to_string()),
        None => print_kv(
            "Generator",
            &format!(
                "{} trees, depth {}, {} vars",
                config.generator.num_trees, config.generator.depth, config.generator.num_vars
            ),
        ),
    }

    let summary = Arc::new(Mutex::new(SummaryObserver::new()));
    let output = config.output.clone();
    let mut runner = ExperimentRunner::new(config)?
        .with_observer(Box::new(SharedSummary(summary.clone())));
    if !args.quiet {
        runner = runner.with_observer(Box::new(ProgressObserver::new()));
    }
    if let Some(path) = &output {
        runner = runner.with_observer(Box::new(MatchResultsWriter::new(path)));
    }

    let totals = runner.run()?;

    print_section("Results");
    print_kv("Forests", &totals.forests.to_string());
    print_kv("Matches", &totals.matches.to_string());
    print_kv("Completed", &totals.completed_intentions.to_string());
    if let Ok(summary) = summary.lock() {
        println!("\n{}", summary.table());
    }
    if let Some(path) = output {
        println!("\nResults appended to {}", path.display());
    }
    Ok(())
}
