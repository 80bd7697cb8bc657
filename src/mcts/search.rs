//! Monte-Carlo tree search over match states.
//!
//! Every decision builds a fresh tree rooted at the current state and runs
//! `alpha` iterations of select / expand / simulate / back-propagate. Each
//! iteration plays `beta` rollouts to completion with stochastic FIFO
//! policies that only progress intentions the searching agent can see.

use std::{
    any::Any,
    time::{Duration, Instant},
};

use rand::{Rng, SeedableRng, random, rngs::StdRng};
use rayon::prelude::*;
use tracing::debug;

use crate::{
    Result,
    config::MctsConfig,
    ports::{MatchBinding, MatchContext, Scheduler, scheduler::bound},
    schedulers::StochasticFifoScheduler,
    simulation::{Match, MatchConfig},
    state::{Decision, Move, State},
};

use super::node::{MctsArena, MctsNode};

/// Tie-breaker and division guard of the UCT formula.
const EPSILON: f64 = 1e-6;

/// Statistics of the most recent decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSummary {
    pub iterations: usize,
    pub rollouts: usize,
    pub nodes: usize,
    pub elapsed: Duration,
}

/// Look-ahead scheduler that plays out the rest of the match many times.
///
/// Its score counts only the intentions it can see (see
/// [`VisionType`](super::VisionType)); other agents are modelled as valuing
/// their own completions at 1 and this agent's completions at the configured
/// assumed politeness.
pub struct MctsScheduler {
    name: String,
    config: MctsConfig,
    binding: Option<MatchBinding>,
    visible: Vec<bool>,
    rng: StdRng,
    last_search: Option<SearchSummary>,
}

impl MctsScheduler {
    pub fn new(name: impl Into<String>, config: MctsConfig) -> Result<Self> {
        Self::with_seed(name, config, random())
    }

    pub fn with_seed(name: impl Into<String>, config: MctsConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: name.into(),
            config,
            binding: None,
            visible: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            last_search: None,
        })
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    pub fn set_assumed_politeness(&mut self, politeness: f64) {
        self.config.assumed_politeness = politeness;
    }

    /// Intentions this agent can see in the current match.
    pub fn visible(&self) -> &[bool] {
        &self.visible
    }

    pub fn last_search(&self) -> Option<SearchSummary> {
        self.last_search
    }
}

impl Scheduler for MctsScheduler {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_match_details(&mut self, context: &MatchContext, agent: usize, mirror: bool) {
        self.visible = self.config.vision.visible_mask(
            context.num_intentions,
            context.num_agents,
            agent,
            |i| context.owner(i, mirror),
        );
        self.binding = Some(MatchBinding::new(context, agent, mirror));
    }

    fn decide(&mut self, state: &State) -> Result<Decision> {
        let binding = bound(&self.binding, &self.name)?;
        let start = Instant::now();

        let mut search = TreeSearch {
            config: &self.config,
            binding,
            visible: &self.visible,
            rng: &mut self.rng,
            arena: MctsArena::with_root(MctsNode::new(state.clone(), None, binding.num_agents)),
            rollouts: 0,
        };
        search.run()?;
        let decision = search.best_decision();

        let summary = SearchSummary {
            iterations: self.config.alpha,
            rollouts: search.rollouts,
            nodes: search.arena.num_nodes(),
            elapsed: start.elapsed(),
        };
        debug!(
            scheduler = %self.name,
            rollouts = summary.rollouts,
            nodes = summary.nodes,
            elapsed = ?summary.elapsed,
            "MCTS search finished"
        );
        self.last_search = Some(summary);
        Ok(decision)
    }

    fn scoring_mask(&self) -> Option<&[bool]> {
        Some(&self.visible)
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One decision's worth of search state.
struct TreeSearch<'a> {
    config: &'a MctsConfig,
    binding: &'a MatchBinding,
    visible: &'a [bool],
    rng: &'a mut StdRng,
    arena: MctsArena,
    rollouts: usize,
}

impl TreeSearch<'_> {
    fn run(&mut self) -> Result<()> {
        let rollout_config = self.rollout_config();
        let mut visited = Vec::new();

        for _ in 0..self.config.alpha {
            visited.clear();
            let mut current = 0;
            visited.push(current);

            while !self.arena.get(current).is_leaf() {
                match self.select(current) {
                    Some(child) => {
                        current = child;
                        visited.push(current);
                    }
                    None => break,
                }
            }

            self.expand(current)?;
            if let Some(child) = self.select(current) {
                current = child;
                visited.push(current);
            }

            let seeds: Vec<u64> = (0..self.config.beta).map(|_| self.rng.random()).collect();
            let start = &self.arena.get(current).state;
            let finals: Vec<State> = if self.config.parallel_rollouts {
                seeds
                    .par_iter()
                    .map(|&seed| rollout(&rollout_config, start, seed))
                    .collect::<Result<_>>()?
            } else {
                seeds
                    .iter()
                    .map(|&seed| rollout(&rollout_config, start, seed))
                    .collect::<Result<_>>()?
            };

            for final_state in &finals {
                self.rollouts += 1;
                let values = self.rollout_values(final_state);
                for &index in &visited {
                    let node = self.arena.get_mut(index);
                    node.visits += 1;
                    for (agent, &value) in values.iter().enumerate() {
                        node.record(agent, value);
                    }
                }
            }
        }
        Ok(())
    }

    /// Child of `parent` with the highest UCT value for the agent to move.
    fn select(&mut self, parent: usize) -> Option<usize> {
        let mover = self.arena.get(parent).state.player_turn;
        let exploration = ((self.rollouts + 1) as f64).ln();
        let mut best = None;
        let mut best_uct = f64::NEG_INFINITY;

        for &child in self.arena.children(parent) {
            let node = self.arena.get(child);
            let visits = f64::from(node.visits) + EPSILON;
            let uct = node.total.get(mover).copied().unwrap_or(0.0) / visits
                + self.config.c * (exploration / visits).sqrt()
                + EPSILON * self.rng.random::<f64>();
            if uct > best_uct {
                best = Some(child);
                best_uct = uct;
            }
        }
        best
    }

    /// One child per legal visible move of the agent to move, plus a pass.
    fn expand(&mut self, index: usize) -> Result<()> {
        let num_agents = self.binding.num_agents;
        let state = self.arena.get(index).state.clone();
        let mask: Vec<bool> = self
            .binding
            .available_for(state.player_turn)
            .iter()
            .zip(self.visible)
            .map(|(&owned, &visible)| owned && visible)
            .collect();

        let mut children = Vec::new();
        for mv in state.legal_moves(&mask) {
            let mut next = state.clone();
            next.apply_move(mv)?;
            next.advance_turn(num_agents);
            children.push(self.arena.allocate(MctsNode::new(next, Some(mv), num_agents)));
        }

        let mut passed = state;
        passed.advance_turn(num_agents);
        children.push(self.arena.allocate(MctsNode::new(passed, None, num_agents)));

        self.arena.get_mut(index).children = Some(children);
        Ok(())
    }

    /// Value of a finished rollout for every agent, as this agent models it.
    fn rollout_values(&self, final_state: &State) -> Vec<f64> {
        let agent = self.binding.agent;
        (0..self.binding.num_agents)
            .map(|other| {
                if other == agent {
                    return final_state.score(self.binding.values(), self.visible);
                }
                let mine = self.binding.available();
                let theirs = self.binding.available_for(other);
                let values = self.binding.values_for(other);
                (0..final_state.num_intentions())
                    .filter(|&i| self.visible[i] && final_state.is_complete(i))
                    .map(|i| {
                        if mine[i] {
                            self.config.assumed_politeness
                        } else if theirs[i] {
                            values[i]
                        } else {
                            0.0
                        }
                    })
                    .sum()
            })
            .collect()
    }

    /// Root child with the best mean value for this agent.
    fn best_decision(&self) -> Decision {
        let agent = self.binding.agent;
        let children = self.arena.children(0);
        let mut best: Option<Option<Move>> = None;
        let mut best_mean = f64::NEG_INFINITY;

        for &child in children {
            let node = self.arena.get(child);
            if node.visits == 0 {
                continue;
            }
            let mean = node.mean(agent);
            debug!(
                choice = %node.mv.map_or_else(|| "pass".to_string(), |mv| mv.to_string()),
                mean,
                visits = node.visits,
                "root candidate"
            );
            if mean > best_mean {
                best = Some(node.mv);
                best_mean = mean;
            }
        }

        let forced = children.len() == 1;
        match best.flatten() {
            Some(mv) => Decision::progress(mv),
            None if forced => Decision::forced(),
            None => Decision::pass(),
        }
    }

    fn rollout_config(&self) -> RolloutConfig {
        let num_agents = self.binding.num_agents;
        let match_config = MatchConfig::new("MCTS_rollout", self.binding.num_intentions())
            .with_alliance(self.binding.alliance)
            .with_assumed_politeness(self.binding.assumed_politeness)
            .with_agent_names((1..=num_agents).map(|a| format!("rollout_a{a}")).collect())
            .with_intention_values(
                (0..num_agents)
                    .map(|a| self.binding.values_for(a).to_vec())
                    .collect(),
            )
            .with_verbose(false);
        RolloutConfig {
            match_config,
            visible: self.visible.to_vec(),
            stochasticity: self.config.rollout_stochasticity,
            num_agents,
            mirror: self.binding.mirror,
        }
    }
}

/// Everything a rollout needs, shareable across worker threads.
struct RolloutConfig {
    match_config: MatchConfig,
    visible: Vec<bool>,
    stochasticity: f64,
    num_agents: usize,
    mirror: bool,
}

/// Play the match out from `state` and return the final state.
fn rollout(config: &RolloutConfig, state: &State, seed: u64) -> Result<State> {
    let mut rng = StdRng::seed_from_u64(seed);
    let schedulers: Vec<Box<dyn Scheduler>> = (0..config.num_agents)
        .map(|a| {
            Box::new(StochasticFifoScheduler::with_seed(
                format!("rollout_a{}", a + 1),
                config.stochasticity,
                config.visible.clone(),
                rng.random(),
            )) as Box<dyn Scheduler>
        })
        .collect();
    let mut game = Match::new(config.match_config.clone(), state.clone(), schedulers)?;
    Ok(game.run(config.mirror)?.final_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        forest::ForestBuilder,
        mcts::VisionType,
        simulation::AllianceType,
    };
    use std::sync::Arc;

    /// I0 and I1 both want `Free`; whoever acts first blocks the other.
    fn contested() -> State {
        let mut builder = ForestBuilder::new("contested");
        for i in 0..2 {
            let goal = builder.intention(&format!("G{i}"));
            let plan = builder.plan(goal, &format!("P{i}"), &[]).unwrap();
            builder
                .action(plan, &format!("A{i}"), &["Free"], &["!Free"])
                .unwrap();
        }
        let forest = builder.build().unwrap();
        let mut beliefs = crate::beliefs::BeliefBase::with_len(forest.vocabulary().len());
        let free = forest.vocabulary().lookup("Free").unwrap();
        beliefs.set(free, true);
        State::new(Arc::new(forest), beliefs, 0)
    }

    fn context() -> MatchContext {
        MatchContext {
            name: "test".to_string(),
            num_intentions: 2,
            num_agents: 2,
            alliance: AllianceType::Neutral,
            assumed_politeness: 0.0,
            intention_values: Vec::new(),
        }
    }

    fn scheduler(config: MctsConfig) -> MctsScheduler {
        let mut scheduler = MctsScheduler::with_seed("MCTS", config, 3).unwrap();
        scheduler.load_match_details(&context(), 0, false);
        scheduler
    }

    #[test]
    fn takes_the_contested_resource() {
        let mut mcts = scheduler(MctsConfig::default().with_alpha(30).with_beta(4));
        let decision = mcts.decide(&contested()).unwrap();
        assert_eq!(decision.intention, Some(0));
        assert!(!decision.forced_pass);

        let summary = mcts.last_search().unwrap();
        assert_eq!(summary.rollouts, 30 * 4);
        assert!(summary.nodes > 3);
    }

    #[test]
    fn parallel_rollouts_agree_with_sequential() {
        let config = MctsConfig::default().with_alpha(20).with_beta(3);
        let sequential = scheduler(config.clone()).decide(&contested()).unwrap();
        let parallel = scheduler(config.with_parallel_rollouts(true))
            .decide(&contested())
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn nothing_to_do_is_a_forced_pass() {
        let mut state = contested();
        state.set_current_step(0, None);
        let mut mcts = scheduler(MctsConfig::default().with_alpha(5).with_beta(1));
        assert!(mcts.decide(&state).unwrap().forced_pass);
    }

    #[test]
    fn unaware_agent_scores_only_its_own_intentions() {
        let mut mcts = scheduler(MctsConfig::default().with_vision(VisionType::Unaware));
        mcts.load_match_details(&context(), 1, false);
        assert_eq!(mcts.scoring_mask(), Some(&[false, true][..]));
    }

    /// Values agent 0 backs up for a final state in which `complete` are done.
    fn backed_up(politeness: f64, complete: &[usize]) -> Vec<f64> {
        let config = MctsConfig::default().with_assumed_politeness(politeness);
        let mut context = context();
        context.intention_values = vec![vec![1.0, 1.0], vec![7.0, 0.25]];
        let binding = MatchBinding::new(&context, 0, false);
        let visible = [true, true];
        let mut rng = StdRng::seed_from_u64(0);
        let search = TreeSearch {
            config: &config,
            binding: &binding,
            visible: &visible,
            rng: &mut rng,
            arena: MctsArena::with_root(MctsNode::new(contested(), None, 2)),
            rollouts: 0,
        };

        let mut final_state = contested();
        for &i in complete {
            final_state.set_current_step(i, None);
        }
        search.rollout_values(&final_state)
    }

    #[test]
    fn other_agent_credits_our_completions_with_the_assumed_politeness() {
        // Agent 0 owns I0, agent 1 owns I1.
        assert_eq!(backed_up(-1.0, &[0]), vec![1.0, -1.0]);
        assert_eq!(backed_up(1.0, &[0]), vec![1.0, 1.0]);
        assert_eq!(backed_up(-1.0, &[1]), vec![1.0, 0.25]);
        assert_eq!(backed_up(1.0, &[0, 1]), vec![2.0, 1.25]);
        assert_eq!(backed_up(0.5, &[]), vec![0.0, 0.0]);
    }

    #[test]
    fn unbound_scheduler_errors() {
        let mut mcts = MctsScheduler::with_seed("MCTS", MctsConfig::default(), 1).unwrap();
        assert!(mcts.decide(&contested()).is_err());
        assert!(MctsScheduler::new("bad", MctsConfig::default().with_alpha(0)).is_err());
    }
}
