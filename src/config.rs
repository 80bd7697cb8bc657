//! Configuration types for schedulers, forest generation and experiments.
//!
//! Every type is serde (de)serializable, has defaults matching the reference
//! experiment setup and builder-style `with_*` setters.
//!
//! # Examples
//!
//! ```
//! use intention_scheduler::config::{ExperimentConfig, MctsConfig};
//! use intention_scheduler::mcts::VisionType;
//!
//! let config = ExperimentConfig::default()
//!     .with_repetitions(3)
//!     .with_mcts(MctsConfig::default().with_alpha(20).with_vision(VisionType::PartiallyAware));
//! assert!(config.validate().is_ok());
//! ```

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, mcts::VisionType, pipeline::SchedulerKind};

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidConfiguration {
        message: message.into(),
    }
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be within [0, 1], got {value}")))
    }
}

/// Monte-Carlo tree search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// Search iterations per decision
    pub alpha: usize,
    /// Rollouts per iteration
    pub beta: usize,
    /// UCT exploration constant
    pub c: f64,
    /// Probability that a rollout policy plays a uniformly random move
    pub rollout_stochasticity: f64,
    /// Credit the agent assumes other agents give it for its own completions
    pub assumed_politeness: f64,
    pub vision: VisionType,
    /// Run the rollouts of one iteration on the rayon pool
    pub parallel_rollouts: bool,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            alpha: 100,
            beta: 10,
            c: 2.0 * 2f64.sqrt(),
            rollout_stochasticity: 1.0,
            assumed_politeness: 1.0,
            vision: VisionType::Full,
            parallel_rollouts: false,
        }
    }
}

impl MctsConfig {
    pub fn with_alpha(mut self, alpha: usize) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_beta(mut self, beta: usize) -> Self {
        self.beta = beta;
        self
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_rollout_stochasticity(mut self, stochasticity: f64) -> Self {
        self.rollout_stochasticity = stochasticity;
        self
    }

    pub fn with_assumed_politeness(mut self, politeness: f64) -> Self {
        self.assumed_politeness = politeness;
        self
    }

    pub fn with_vision(mut self, vision: VisionType) -> Self {
        self.vision = vision;
        self
    }

    pub fn with_parallel_rollouts(mut self, parallel: bool) -> Self {
        self.parallel_rollouts = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.alpha == 0 {
            return Err(invalid("MCTS alpha must be at least 1"));
        }
        if self.beta == 0 {
            return Err(invalid("MCTS beta must be at least 1"));
        }
        if self.c.is_nan() || self.c < 0.0 {
            return Err(invalid(format!(
                "MCTS exploration constant must be non-negative, got {}",
                self.c
            )));
        }
        check_probability("rollout stochasticity", self.rollout_stochasticity)
    }
}

/// Parameters of the synthetic forest generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Goal levels per tree; a depth-one tree is a goal with action-only plans
    pub depth: usize,
    /// Number of goal-plan trees, i.e. intentions
    pub num_trees: usize,
    /// Environment literals
    pub num_vars: usize,
    pub subgoals_per_plan: usize,
    pub plans_per_goal: usize,
    pub actions_per_plan: usize,
    /// Share of sub-goal plans whose precondition is guaranteed by earlier steps
    pub safety_factor: f64,
    /// Probability that a goal gets a single plan
    pub single_plan_probability: f64,
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            depth: 5,
            num_trees: 12,
            num_vars: 20,
            subgoals_per_plan: 1,
            plans_per_goal: 2,
            actions_per_plan: 5,
            safety_factor: 0.5,
            single_plan_probability: 0.5,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_num_trees(mut self, num_trees: usize) -> Self {
        self.num_trees = num_trees;
        self
    }

    pub fn with_num_vars(mut self, num_vars: usize) -> Self {
        self.num_vars = num_vars;
        self
    }

    pub fn with_subgoals_per_plan(mut self, subgoals: usize) -> Self {
        self.subgoals_per_plan = subgoals;
        self
    }

    pub fn with_plans_per_goal(mut self, plans: usize) -> Self {
        self.plans_per_goal = plans;
        self
    }

    pub fn with_actions_per_plan(mut self, actions: usize) -> Self {
        self.actions_per_plan = actions;
        self
    }

    pub fn with_safety_factor(mut self, safety_factor: f64) -> Self {
        self.safety_factor = safety_factor;
        self
    }

    pub fn with_single_plan_probability(mut self, probability: f64) -> Self {
        self.single_plan_probability = probability;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 {
            return Err(invalid("generator depth must be at least 1"));
        }
        if self.num_trees == 0 {
            return Err(invalid("generator needs at least one tree"));
        }
        if self.num_vars == 0 {
            return Err(invalid("generator needs at least one environment variable"));
        }
        if self.plans_per_goal == 0 {
            return Err(invalid("every goal needs at least one plan"));
        }
        check_probability("safety factor", self.safety_factor)?;
        check_probability("single-plan probability", self.single_plan_probability)
    }
}

/// Parameters of the coverage-based stochastic policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Boltzmann-C pass probability
    pub pass_probability: f64,
    /// Boltzmann-C softmax temperature
    pub temperature: f64,
    /// Stochastic-C probability of a random move
    pub stochasticity: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            pass_probability: 0.0,
            temperature: 1.0,
            stochasticity: 0.5,
        }
    }
}

impl PolicyConfig {
    pub fn validate(&self) -> Result<()> {
        check_probability("pass probability", self.pass_probability)?;
        check_probability("stochasticity", self.stochasticity)?;
        if self.temperature.is_nan() || self.temperature <= 0.0 {
            return Err(invalid(format!(
                "temperature must be positive, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Full experiment: pairings of the roster under every alliance mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Number of forests to play every pairing on
    pub repetitions: usize,
    /// Forest file to use instead of generated forests
    pub forest: Option<PathBuf>,
    pub generator: GeneratorConfig,
    pub mcts: MctsConfig,
    pub policies: PolicyConfig,
    /// Schedulers paired against each other (and themselves)
    pub roster: Vec<SchedulerKind>,
    /// Assumed politeness values tried in allied and neutral matches
    pub cooperative_politeness: Vec<f64>,
    /// Assumed politeness of adversarial matches
    pub adversarial_politeness: f64,
    /// Also pit a full-vision MCTS with this many iterations against a
    /// default one in adversarial matches
    pub extra_alpha: Option<usize>,
    /// CSV file receiving one row per match
    pub output: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            repetitions: 1,
            forest: None,
            generator: GeneratorConfig::default(),
            mcts: MctsConfig::default(),
            policies: PolicyConfig::default(),
            roster: SchedulerKind::default_roster(),
            cooperative_politeness: vec![0.0, 1.0],
            adversarial_politeness: -1.0,
            extra_alpha: None,
            output: None,
            seed: None,
        }
    }
}

impl ExperimentConfig {
    /// Load a JSON configuration file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::io(format!("open config file {}", path.display()), e))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = repetitions;
        self
    }

    pub fn with_forest(mut self, path: impl Into<PathBuf>) -> Self {
        self.forest = Some(path.into());
        self
    }

    pub fn with_generator(mut self, generator: GeneratorConfig) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_mcts(mut self, mcts: MctsConfig) -> Self {
        self.mcts = mcts;
        self
    }

    pub fn with_policies(mut self, policies: PolicyConfig) -> Self {
        self.policies = policies;
        self
    }

    pub fn with_roster(mut self, roster: Vec<SchedulerKind>) -> Self {
        self.roster = roster;
        self
    }

    pub fn with_extra_alpha(mut self, alpha: usize) -> Self {
        self.extra_alpha = Some(alpha);
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.roster.is_empty() {
            return Err(invalid("experiment roster is empty"));
        }
        if self.extra_alpha == Some(0) {
            return Err(invalid("extra alpha must be at least 1"));
        }
        self.mcts.validate()?;
        self.policies.validate()?;
        if self.forest.is_none() {
            self.generator.validate()?;
        }
        Ok(())
    }
}
