//! Experiment driver: every roster pairing under every alliance mode.
//!
//! For each repetition a forest is generated (or loaded) and every pairing of
//! the roster, self-pairings included, plays a two-sided series in allied and
//! neutral mode for each cooperative politeness value, then in adversarial
//! mode. Politeness values other than zero are only tried when one side is an
//! MCTS agent that can see the other side's intentions.

use std::{path::PathBuf, sync::Arc};

use rand::{Rng, SeedableRng, random, rngs::StdRng};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    Result,
    config::{ExperimentConfig, MctsConfig},
    export::CLONE_SUFFIX,
    forest::{ForestInstance, ForestSpec, SynthGenerator},
    ports::{MatchObserver, Scheduler},
    simulation::{AllianceType, Match, MatchConfig, MatchReport},
    state::State,
};

use super::SchedulerKind;

/// One side of a planned match.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentPlan {
    pub kind: SchedulerKind,
    /// Display name; the second copy of a self-pairing carries a `_clone` suffix.
    pub name: String,
    pub mcts: MctsConfig,
}

/// A match to be played as a two-sided series on every forest.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchPlan {
    pub name: String,
    pub alliance: AllianceType,
    pub assumed_politeness: f64,
    pub agents: Vec<AgentPlan>,
}

/// Totals over an experiment.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExperimentSummary {
    pub forests: usize,
    pub matches: usize,
    pub completed_intentions: usize,
}

/// Runs an [`ExperimentConfig`] and reports every match to its observers.
pub struct ExperimentRunner {
    config: ExperimentConfig,
    observers: Vec<Box<dyn MatchObserver>>,
}

impl ExperimentRunner {
    pub fn new(config: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            observers: Vec::new(),
        })
    }

    pub fn with_observer(mut self, observer: Box<dyn MatchObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Matches played on each forest, in playing order.
    pub fn plan(&self) -> Vec<MatchPlan> {
        let roster = &self.config.roster;
        let mut plans = Vec::new();

        if let Some(extra_alpha) = self.config.extra_alpha {
            let politeness = self.config.adversarial_politeness;
            let base = self.mcts_with(politeness);
            plans.push(MatchPlan {
                name: "adversarial_extra_alpha_IA_vs_normal_alpha_IA".to_string(),
                alliance: AllianceType::Adversarial,
                assumed_politeness: politeness,
                agents: vec![
                    AgentPlan {
                        kind: SchedulerKind::MctsFullyAware,
                        name: "extra_alpha_IA".to_string(),
                        mcts: base.clone().with_alpha(extra_alpha),
                    },
                    AgentPlan {
                        kind: SchedulerKind::MctsFullyAware,
                        name: "normal_alpha_IA".to_string(),
                        mcts: base,
                    },
                ],
            });
        }

        for &politeness in &self.config.cooperative_politeness {
            for alliance in [AllianceType::Allied, AllianceType::Neutral] {
                for (a1, a2) in pairings(roster.len()) {
                    let (k1, k2) = (roster[a1], roster[a2]);
                    if politeness != 0.0 && !k1.is_aware() && !k2.is_aware() {
                        continue;
                    }
                    let name = format!("{alliance}_{k1}_and_{k2}");
                    plans.push(self.pairing(name, alliance, politeness, k1, k2, a1 == a2));
                }
            }
        }

        let politeness = self.config.adversarial_politeness;
        for (a1, a2) in pairings(roster.len()) {
            let (k1, k2) = (roster[a1], roster[a2]);
            let name = format!("adversarial_{k1}_vs_{k2}");
            plans.push(self.pairing(
                name,
                AllianceType::Adversarial,
                politeness,
                k1,
                k2,
                a1 == a2,
            ));
        }
        plans
    }

    /// Play every planned match on every forest.
    pub fn run(&mut self) -> Result<ExperimentSummary> {
        let plans = self.plan();
        let mut rng = StdRng::seed_from_u64(self.config.seed.unwrap_or_else(random));
        let mut source = match &self.config.forest {
            Some(path) => ForestSource::File(path.clone()),
            None => {
                let mut generator_config = self.config.generator.clone();
                if generator_config.seed.is_none() {
                    generator_config.seed = Some(rng.random());
                }
                ForestSource::Generated(SynthGenerator::new(generator_config)?)
            }
        };

        let total = self.config.repetitions * plans.len() * 2;
        info!(
            repetitions = self.config.repetitions,
            pairings = plans.len(),
            total_matches = total,
            "starting experiment"
        );
        for observer in &mut self.observers {
            observer.on_experiment_start(total)?;
        }

        let mut summary = ExperimentSummary::default();
        for repetition in 0..self.config.repetitions {
            let instance = match &mut source {
                ForestSource::Generated(generator) => {
                    generator.generate(&format!("random_{repetition}"))?
                }
                ForestSource::File(path) => ForestSpec::load(path.as_path())?.build()?,
            };
            let initial = initial_state(instance);
            summary.forests += 1;

            for plan in &plans {
                let reports = self.play(plan, &initial, &mut rng)?;
                for report in &reports {
                    summary.matches += 1;
                    summary.completed_intentions += report.total_completed();
                    self.notify(report);
                }
            }
        }

        for observer in &mut self.observers {
            if let Err(error) = observer.on_experiment_end() {
                warn!(%error, "observer failed to finish");
            }
        }
        info!(
            forests = summary.forests,
            matches = summary.matches,
            completed = summary.completed_intentions,
            "experiment finished"
        );
        Ok(summary)
    }

    /// Two-sided series of `plan` from `initial`.
    pub fn play(
        &self,
        plan: &MatchPlan,
        initial: &State,
        rng: &mut StdRng,
    ) -> Result<[MatchReport; 2]> {
        let schedulers = plan
            .agents
            .iter()
            .map(|agent| {
                agent
                    .kind
                    .build(&agent.name, &agent.mcts, &self.config.policies, rng.random())
            })
            .collect::<Result<Vec<Box<dyn Scheduler>>>>()?;

        let config = MatchConfig::new(plan.name.clone(), initial.num_intentions())
            .with_alliance(plan.alliance)
            .with_assumed_politeness(plan.assumed_politeness)
            .with_agent_names(plan.agents.iter().map(|a| a.name.clone()).collect());
        Match::new(config, initial.clone(), schedulers)?.run_two_sided_series()
    }

    fn notify(&mut self, report: &MatchReport) {
        for observer in &mut self.observers {
            if let Err(error) = observer.on_match_end(report) {
                warn!(match_name = %report.match_name, %error, "observer failed");
            }
        }
    }

    fn mcts_with(&self, politeness: f64) -> MctsConfig {
        self.config
            .mcts
            .clone()
            .with_assumed_politeness(politeness)
    }

    fn pairing(
        &self,
        name: String,
        alliance: AllianceType,
        politeness: f64,
        first: SchedulerKind,
        second: SchedulerKind,
        self_play: bool,
    ) -> MatchPlan {
        let second_name = if self_play {
            format!("{second}{CLONE_SUFFIX}")
        } else {
            second.to_string()
        };
        let mcts = self.mcts_with(politeness);
        MatchPlan {
            name,
            alliance,
            assumed_politeness: politeness,
            agents: vec![
                AgentPlan {
                    kind: first,
                    name: first.to_string(),
                    mcts: mcts.clone(),
                },
                AgentPlan {
                    kind: second,
                    name: second_name,
                    mcts,
                },
            ],
        }
    }
}

enum ForestSource {
    Generated(SynthGenerator),
    File(PathBuf),
}

/// Index pairs `(a1, a2)` with `a1 <= a2`.
fn pairings(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |a1| (a1..n).map(move |a2| (a1, a2)))
}

/// Agent 0 moves first.
pub fn initial_state(instance: ForestInstance) -> State {
    State::new(Arc::new(instance.forest), instance.beliefs, 0)
}
