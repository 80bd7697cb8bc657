//! Named scheduler kinds that experiments pair against each other.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    config::{MctsConfig, PolicyConfig},
    mcts::{MctsScheduler, VisionType},
    ports::Scheduler,
    schedulers::{
        BoltzmannCScheduler, CScheduler, CoverageType, FifoScheduler, PassScheduler,
        RandomScheduler, RoundRobinScheduler, SmartRandomScheduler, StochasticCScheduler,
    },
};

/// Every scheduler an experiment can field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SchedulerKind {
    MctsFullyAware,
    MctsPartiallyAware,
    MctsUnaware,
    Fifo,
    C0,
    C1,
    Random,
    RoundRobin,
    SmartRandom,
    BoltzmannC,
    StochasticC,
    Pass,
}

impl SchedulerKind {
    pub const ALL: [SchedulerKind; 12] = [
        SchedulerKind::MctsFullyAware,
        SchedulerKind::MctsPartiallyAware,
        SchedulerKind::MctsUnaware,
        SchedulerKind::Fifo,
        SchedulerKind::C0,
        SchedulerKind::C1,
        SchedulerKind::Random,
        SchedulerKind::RoundRobin,
        SchedulerKind::SmartRandom,
        SchedulerKind::BoltzmannC,
        SchedulerKind::StochasticC,
        SchedulerKind::Pass,
    ];

    /// The pairing roster of the reference experiments.
    pub fn default_roster() -> Vec<SchedulerKind> {
        vec![
            SchedulerKind::MctsFullyAware,
            SchedulerKind::MctsPartiallyAware,
            SchedulerKind::MctsUnaware,
            SchedulerKind::Fifo,
            SchedulerKind::C0,
            SchedulerKind::C1,
            SchedulerKind::Random,
            SchedulerKind::RoundRobin,
        ]
    }

    /// Name used in match names and result files.
    pub fn name(&self) -> &'static str {
        match self {
            SchedulerKind::MctsFullyAware => "MCTS_fully_aware",
            SchedulerKind::MctsPartiallyAware => "MCTS_partially_aware",
            SchedulerKind::MctsUnaware => "MCTS_unaware",
            SchedulerKind::Fifo => "FIFO",
            SchedulerKind::C0 => "C0",
            SchedulerKind::C1 => "C1",
            SchedulerKind::Random => "Random",
            SchedulerKind::RoundRobin => "Round_Robin",
            SchedulerKind::SmartRandom => "Smart_Random",
            SchedulerKind::BoltzmannC => "Boltzmann_C",
            SchedulerKind::StochasticC => "Stochastic_C",
            SchedulerKind::Pass => "Pass",
        }
    }

    pub fn vision(&self) -> Option<VisionType> {
        match self {
            SchedulerKind::MctsFullyAware => Some(VisionType::Full),
            SchedulerKind::MctsPartiallyAware => Some(VisionType::PartiallyAware),
            SchedulerKind::MctsUnaware => Some(VisionType::Unaware),
            _ => None,
        }
    }

    pub fn is_mcts(&self) -> bool {
        self.vision().is_some()
    }

    /// MCTS agents that can see other agents' intentions, and so can act on
    /// an assumed politeness.
    pub fn is_aware(&self) -> bool {
        matches!(
            self,
            SchedulerKind::MctsFullyAware | SchedulerKind::MctsPartiallyAware
        )
    }

    /// Instantiate a scheduler of this kind named `name`.
    pub fn build(
        &self,
        name: &str,
        mcts: &MctsConfig,
        policies: &PolicyConfig,
        seed: u64,
    ) -> Result<Box<dyn Scheduler>> {
        let scheduler: Box<dyn Scheduler> = match self {
            SchedulerKind::MctsFullyAware
            | SchedulerKind::MctsPartiallyAware
            | SchedulerKind::MctsUnaware => {
                let config = mcts.clone().with_vision(self.vision().unwrap_or_default());
                Box::new(MctsScheduler::with_seed(name, config, seed)?)
            }
            SchedulerKind::Fifo => Box::new(FifoScheduler::new(name)),
            SchedulerKind::C0 => Box::new(CScheduler::new(name, CoverageType::C0)),
            SchedulerKind::C1 => Box::new(CScheduler::new(name, CoverageType::C1)),
            SchedulerKind::Random => Box::new(RandomScheduler::with_seed(name, seed)),
            SchedulerKind::RoundRobin => Box::new(RoundRobinScheduler::new(name)),
            SchedulerKind::SmartRandom => Box::new(SmartRandomScheduler::with_seed(name, seed)),
            SchedulerKind::BoltzmannC => Box::new(BoltzmannCScheduler::with_seed(
                name,
                CoverageType::C1,
                policies.pass_probability,
                policies.temperature,
                seed,
            )),
            SchedulerKind::StochasticC => Box::new(StochasticCScheduler::with_seed(
                name,
                CoverageType::C1,
                policies.stochasticity,
                seed,
            )),
            SchedulerKind::Pass => Box::new(PassScheduler::new(name)),
        };
        Ok(scheduler)
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchedulerKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase().replace('-', "_");
        SchedulerKind::ALL
            .into_iter()
            .find(|kind| kind.name().to_ascii_lowercase() == wanted)
            .ok_or_else(|| Error::ParseSchedulerKind {
                input: s.to_string(),
                expected: SchedulerKind::ALL
                    .iter()
                    .map(SchedulerKind::name)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

impl TryFrom<String> for SchedulerKind {
    type Error = Error;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SchedulerKind> for String {
    fn from(kind: SchedulerKind) -> Self {
        kind.name().to_string()
    }
}
