//! Subcommands of the `isched` binary

pub mod coverage;
pub mod experiment;
pub mod generate;
pub mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::{
    config::GeneratorConfig,
    forest::{ForestInstance, ForestSpec, SynthGenerator},
};

/// Where a command gets its forest from: a JSON file or the generator.
#[derive(Args, Debug, Clone)]
pub struct ForestArgs {
    /// Forest JSON file; a synthetic forest is generated when omitted
    #[arg(long, short = 'f')]
    pub forest: Option<PathBuf>,

    /// Goal levels per generated tree
    #[arg(long, default_value_t = 5)]
    pub depth: usize,

    /// Number of generated trees (intentions)
    #[arg(long, default_value_t = 12)]
    pub trees: usize,

    /// Number of environment literals
    #[arg(long, default_value_t = 20)]
    pub vars: usize,

    #[arg(long, default_value_t = 1)]
    pub subgoals: usize,

    #[arg(long, default_value_t = 2)]
    pub plans: usize,

    #[arg(long, default_value_t = 5)]
    pub actions: usize,

    /// Share of sub-goal plan preconditions guaranteed by earlier steps
    #[arg(long, default_value_t = 0.5)]
    pub safety: f64,

    /// Probability that a generated goal has a single plan
    #[arg(long = "single-plan", default_value_t = 0.5)]
    pub single_plan: f64,

    /// Generator seed
    #[arg(long)]
    pub forest_seed: Option<u64>,
}

impl ForestArgs {
    pub fn generator_config(&self) -> GeneratorConfig {
        let config = GeneratorConfig::default()
            .with_depth(self.depth)
            .with_num_trees(self.trees)
            .with_num_vars(self.vars)
            .with_subgoals_per_plan(self.subgoals)
            .with_plans_per_goal(self.plans)
            .with_actions_per_plan(self.actions)
            .with_safety_factor(self.safety)
            .with_single_plan_probability(self.single_plan);
        match self.forest_seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }

    /// Load the forest file, or generate a forest named `name`.
    pub fn load(&self, name: &str) -> Result<ForestInstance> {
        match &self.forest {
            Some(path) => {
                let spec = ForestSpec::load(path)
                    .with_context(|| format!("Failed to load forest {}", path.display()))?;
                Ok(spec.build()?)
            }
            None => {
                let mut generator = SynthGenerator::new(self.generator_config())?;
                Ok(generator.generate(name)?)
            }
        }
    }
}
