use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rand::{Rng, SeedableRng, random, rngs::StdRng};
use tracing::info;

use crate::{
    cli::output::{print_kv, print_report, print_section},
    config::{MctsConfig, PolicyConfig},
    export::{CLONE_SUFFIX, MatchResultsWriter},
    pipeline::{SchedulerKind, initial_state},
    ports::{MatchObserver, Scheduler},
    simulation::{AllianceType, Match, MatchConfig},
};

use super::ForestArgs;

#[derive(Parser, Debug)]
#[command(about = "Play a two-sided series between two schedulers on one forest")]
pub struct RunArgs {
    /// Scheduler for agent 0
    #[arg(long, default_value = "MCTS_fully_aware")]
    pub first: SchedulerKind,

    /// Scheduler for agent 1
    #[arg(long, default_value = "FIFO")]
    pub second: SchedulerKind,

    #[arg(long, default_value_t = AllianceType::Neutral)]
    pub alliance: AllianceType,

    /// Weight an MCTS agent gives to the other agent's completions in rollouts
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub politeness: f64,

    /// MCTS iterations per decision
    #[arg(long, short = 'a', default_value_t = 100)]
    pub alpha: usize,

    /// Rollouts per MCTS iteration
    #[arg(long, short = 'b', default_value_t = 10)]
    pub beta: usize,

    /// Run MCTS rollouts on the rayon thread pool
    #[arg(long)]
    pub parallel: bool,

    #[command(flatten)]
    pub source: ForestArgs,

    /// Seed for the scheduler RNGs
    #[arg(long, short = 's')]
    pub seed: Option<u64>,

    /// Append the reports to this CSV file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn execute(args: RunArgs) -> Result<()> {
    if !(-1.0..=1.0).contains(&args.politeness) {
        bail!("politeness must lie in [-1, 1], got {}", args.politeness);
    }
    let instance = args.source.load("random_0")?;
    let initial = initial_state(instance);

    let mcts = MctsConfig::default()
        .with_alpha(args.alpha)
        .with_beta(args.beta)
        .with_assumed_politeness(args.politeness)
        .with_parallel_rollouts(args.parallel);
    let policies = PolicyConfig::default();
    let mut rng = StdRng::seed_from_u64(args.seed.unwrap_or_else(random));

    let first_name = args.first.to_string();
    let second_name = if args.first == args.second {
        format!("{}{CLONE_SUFFIX}", args.second)
    } else {
        args.second.to_string()
    };
    let schedulers: Vec<Box<dyn Scheduler>> = vec![
        args.first
            .build(&first_name, &mcts, &policies, rng.random())?,
        args.second
            .build(&second_name, &mcts, &policies, rng.random())?,
    ];

    let match_name = format!("{}_{first_name}_vs_{second_name}", args.alliance);
    let config = MatchConfig::new(match_name, initial.num_intentions())
        .with_alliance(args.alliance)
        .with_assumed_politeness(args.politeness)
        .with_agent_names(vec![first_name, second_name]);

    print_section("Match");
    print_kv("Forest", initial.forest_name());
    print_kv("Intentions", &initial.num_intentions().to_string());
    print_kv("Alliance", &args.alliance.to_string());
    print_kv("Agents", &format!("{} vs {}", args.first, args.second));

    let mut game = Match::new(config, initial, schedulers)?;
    let reports = game.run_two_sided_series()?;
    for report in &reports {
        print_report(report);
    }

    if let Some(path) = args.output {
        let mut writer = MatchResultsWriter::new(&path);
        for report in &reports {
            writer
                .append(report)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        writer.on_experiment_end()?;
        info!(path = %path.display(), rows = writer.rows_written(), "results written");
    }
    Ok(())
}
