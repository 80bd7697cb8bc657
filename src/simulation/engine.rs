//! Turn-based match loop.

use std::time::Instant;

use tracing::{debug, info, trace};

use crate::{
    Error, Result,
    ports::{MatchContext, Scheduler, scheduler::owner_of},
    state::{Decision, State},
};

use super::{AgentResult, AllianceType, MatchReport, Termination};

/// Deliberate passes in a row after which a match is abandoned.
pub const MAX_CONSECUTIVE_PASSES: usize = 6;

/// Static description of a match.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub name: String,
    pub num_intentions: usize,
    pub alliance: AllianceType,
    /// One name per scheduler; scheduler names are used when empty.
    pub agent_names: Vec<String>,
    pub assumed_politeness: f64,
    /// Per-agent intention values; missing entries count 1.
    pub intention_values: Vec<Vec<f64>>,
    /// Log every turn at debug level (trace otherwise).
    pub verbose: bool,
}

impl MatchConfig {
    pub fn new(name: impl Into<String>, num_intentions: usize) -> Self {
        Self {
            name: name.into(),
            num_intentions,
            alliance: AllianceType::default(),
            agent_names: Vec::new(),
            assumed_politeness: 0.0,
            intention_values: Vec::new(),
            verbose: true,
        }
    }

    pub fn with_alliance(mut self, alliance: AllianceType) -> Self {
        self.alliance = alliance;
        self
    }

    pub fn with_agent_names(mut self, names: Vec<String>) -> Self {
        self.agent_names = names;
        self
    }

    pub fn with_assumed_politeness(mut self, politeness: f64) -> Self {
        self.assumed_politeness = politeness;
        self
    }

    pub fn with_intention_values(mut self, values: Vec<Vec<f64>>) -> Self {
        self.intention_values = values;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// A match between schedulers over one shared forest.
///
/// Agent `a` owns intention `i` when `i % n == a` (`(i + 1) % n == a` in a
/// mirror match). Agents take turns starting from the initial state's
/// `player_turn`; an agent whose scheduler reports a forced pass is skipped.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use intention_scheduler::{
///     beliefs::BeliefBase,
///     forest::ForestBuilder,
///     ports::Scheduler,
///     schedulers::FifoScheduler,
///     simulation::{Match, MatchConfig, Termination},
///     state::State,
/// };
///
/// let mut builder = ForestBuilder::new("demo");
/// for i in 0..2 {
///     let goal = builder.intention(&format!("G{i}"));
///     let plan = builder.plan(goal, &format!("P{i}"), &[]).unwrap();
///     builder.action(plan, &format!("A{i}"), &[], &[]).unwrap();
/// }
/// let forest = Arc::new(builder.build().unwrap());
/// let state = State::new(forest, BeliefBase::with_len(0), 0);
///
/// let schedulers: Vec<Box<dyn Scheduler>> =
///     vec![Box::new(FifoScheduler::default()), Box::new(FifoScheduler::default())];
/// let mut game = Match::new(MatchConfig::new("demo", 2), state, schedulers).unwrap();
/// let report = game.run(false).unwrap();
/// assert_eq!(report.termination, Termination::Completed);
/// assert_eq!(report.total_completed(), 2);
/// ```
pub struct Match {
    config: MatchConfig,
    initial_state: State,
    schedulers: Vec<Box<dyn Scheduler>>,
}

impl Match {
    pub fn new(
        mut config: MatchConfig,
        initial_state: State,
        schedulers: Vec<Box<dyn Scheduler>>,
    ) -> Result<Self> {
        let invalid = |message: String| Error::InvalidMatch { message };

        if schedulers.is_empty() {
            return Err(invalid(format!("match '{}' has no schedulers", config.name)));
        }
        if config.num_intentions != initial_state.num_intentions() {
            return Err(invalid(format!(
                "match '{}' expects {} intentions but the forest has {}",
                config.name,
                config.num_intentions,
                initial_state.num_intentions()
            )));
        }
        if initial_state.player_turn >= schedulers.len() {
            return Err(invalid(format!(
                "player turn {} out of range for {} agents",
                initial_state.player_turn,
                schedulers.len()
            )));
        }
        if config.agent_names.is_empty() {
            config.agent_names = schedulers.iter().map(|s| s.name().to_string()).collect();
        } else if config.agent_names.len() != schedulers.len() {
            return Err(invalid(format!(
                "{} agent names for {} schedulers",
                config.agent_names.len(),
                schedulers.len()
            )));
        }

        Ok(Self {
            config,
            initial_state,
            schedulers,
        })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn initial_state(&self) -> &State {
        &self.initial_state
    }

    pub fn num_agents(&self) -> usize {
        self.schedulers.len()
    }

    pub fn schedulers(&self) -> &[Box<dyn Scheduler>] {
        &self.schedulers
    }

    /// What schedulers see when they are bound to this match.
    pub fn context(&self) -> MatchContext {
        MatchContext {
            name: self.config.name.clone(),
            num_intentions: self.config.num_intentions,
            num_agents: self.num_agents(),
            alliance: self.config.alliance,
            assumed_politeness: self.config.assumed_politeness,
            intention_values: self.config.intention_values.clone(),
        }
    }

    /// Ownership mask of `agent`.
    pub fn ownership(&self, agent: usize, mirror: bool) -> Vec<bool> {
        (0..self.config.num_intentions)
            .map(|i| owner_of(i, self.num_agents(), mirror) == agent)
            .collect()
    }

    /// Play one match from a copy of the initial state.
    pub fn run(&mut self, mirror: bool) -> Result<MatchReport> {
        let context = self.context();
        for (agent, scheduler) in self.schedulers.iter_mut().enumerate() {
            scheduler.reset();
            scheduler.load_match_details(&context, agent, mirror);
        }

        let num_agents = self.num_agents();
        let mut state = self.initial_state.clone();
        let mut consecutive_passes = 0;
        let mut turns = 0;
        let start = Instant::now();

        let termination = loop {
            if state.all_complete() {
                break Termination::Completed;
            }
            let Some(decision) = self.next_decision(&mut state)? else {
                break Termination::Stalemate;
            };
            turns += 1;

            match decision.as_move() {
                None => {
                    consecutive_passes += 1;
                    self.log_turn(&state, "passes");
                    if consecutive_passes >= MAX_CONSECUTIVE_PASSES {
                        break Termination::Repetition;
                    }
                }
                Some(mv) => {
                    consecutive_passes = 0;
                    let outcome = state.apply_move(mv)?;
                    self.log_turn(&state, &format!("plays {mv}: {outcome:?}"));
                }
            }
            state.advance_turn(num_agents);
        };

        let duration = start.elapsed();
        let agents = self.results(&state, mirror);
        if self.config.verbose {
            info!(
                name = %self.config.name,
                mirror,
                %termination,
                turns,
                scores = ?agents.iter().map(|a| a.score).collect::<Vec<_>>(),
                "match finished"
            );
        }

        Ok(MatchReport {
            match_name: self.config.name.clone(),
            forest_name: state.forest_name().to_string(),
            assumed_politeness: self.config.assumed_politeness,
            mirror,
            final_state: state,
            termination,
            turns,
            duration,
            agents,
        })
    }

    /// Play the match, then its mirror with the other agent moving first.
    pub fn run_two_sided_series(&mut self) -> Result<[MatchReport; 2]> {
        let normal = self.run(false)?;

        let original_turn = self.initial_state.player_turn;
        self.initial_state.advance_turn(self.num_agents());
        let mirrored = self.run(true);
        self.initial_state.player_turn = original_turn;

        Ok([normal, mirrored?])
    }

    /// Ask agents in turn order until one does not report a forced pass.
    /// Returns `None` when every agent was forced to pass.
    fn next_decision(&mut self, state: &mut State) -> Result<Option<Decision>> {
        let num_agents = self.num_agents();
        for _ in 0..num_agents {
            let agent = state.player_turn;
            let decision = self.schedulers[agent].decide(state)?;
            if !decision.forced_pass {
                return Ok(Some(decision));
            }
            self.log_turn(state, "has nothing to do");
            state.advance_turn(num_agents);
        }
        Ok(None)
    }

    fn log_turn(&self, state: &State, what: &str) {
        let agent = &self.config.agent_names[state.player_turn];
        if self.config.verbose {
            debug!(match_name = %self.config.name, %agent, "{what}");
        } else {
            trace!(match_name = %self.config.name, %agent, "{what}");
        }
    }

    fn results(&self, state: &State, mirror: bool) -> Vec<AgentResult> {
        self.schedulers
            .iter()
            .enumerate()
            .map(|(agent, scheduler)| {
                let owned = self.ownership(agent, mirror);
                let mask = scheduler.scoring_mask().unwrap_or(&owned);
                let values: Vec<f64> = (0..self.config.num_intentions)
                    .map(|i| {
                        self.config
                            .intention_values
                            .get(agent)
                            .and_then(|row| row.get(i))
                            .copied()
                            .unwrap_or(1.0)
                    })
                    .collect();
                AgentResult {
                    name: self.config.agent_names[agent].clone(),
                    score: state.score(&values, mask),
                    completed: state.completed(&owned),
                }
            })
            .collect()
    }
}
