//! Policies that mix a deterministic heuristic with uniform random play.
//!
//! [`StochasticFifoScheduler`] is also the default rollout policy of the MCTS
//! scheduler, where it only considers intentions the searching agent can see.

use std::any::Any;

use rand::{Rng, SeedableRng, random, rngs::StdRng, seq::IndexedRandom};

use crate::{
    Result,
    ports::{MatchBinding, MatchContext, Scheduler, scheduler::bound},
    state::{Decision, Move, State},
};

use super::{
    RandomScheduler,
    coverage_priority::{CScheduler, CoverageType},
    fifo::sticky_choice,
};

/// With probability `stochasticity` acts like [`RandomScheduler`], otherwise
/// like a [`CScheduler`].
pub struct StochasticCScheduler {
    name: String,
    stochasticity: f64,
    coverage: CScheduler,
    random: RandomScheduler,
    rng: StdRng,
}

impl StochasticCScheduler {
    pub fn new(name: impl Into<String>, coverage_type: CoverageType, stochasticity: f64) -> Self {
        Self::with_seed(name, coverage_type, stochasticity, random())
    }

    pub fn with_seed(
        name: impl Into<String>,
        coverage_type: CoverageType,
        stochasticity: f64,
        seed: u64,
    ) -> Self {
        let name = name.into();
        let mut rng = StdRng::seed_from_u64(seed);
        let random_seed = rng.random();
        Self {
            coverage: CScheduler::new(name.clone(), coverage_type),
            random: RandomScheduler::with_seed(name.clone(), random_seed),
            name,
            stochasticity,
            rng,
        }
    }

    pub fn stochasticity(&self) -> f64 {
        self.stochasticity
    }
}

impl Scheduler for StochasticCScheduler {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        self.coverage.reset();
        self.random.reset();
    }

    fn load_match_details(&mut self, context: &MatchContext, agent: usize, mirror: bool) {
        self.coverage.load_match_details(context, agent, mirror);
        self.random.load_match_details(context, agent, mirror);
    }

    fn decide(&mut self, state: &State) -> Result<Decision> {
        if self.rng.random::<f64>() < self.stochasticity {
            self.random.decide(state)
        } else {
            self.coverage.decide(state)
        }
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        let random_seed = self.rng.random();
        self.random.set_rng_seed(random_seed);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// FIFO over `visible ∧ owned` intentions that, with probability
/// `stochasticity`, picks uniformly among those moves and the pass option.
pub struct StochasticFifoScheduler {
    name: String,
    stochasticity: f64,
    visible: Vec<bool>,
    binding: Option<MatchBinding>,
    previous: Option<Move>,
    rng: StdRng,
}

impl StochasticFifoScheduler {
    pub fn new(name: impl Into<String>, stochasticity: f64, visible: Vec<bool>) -> Self {
        Self::with_seed(name, stochasticity, visible, random())
    }

    pub fn with_seed(
        name: impl Into<String>,
        stochasticity: f64,
        visible: Vec<bool>,
        seed: u64,
    ) -> Self {
        Self {
            name: name.into(),
            stochasticity,
            visible,
            binding: None,
            previous: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Scheduler for StochasticFifoScheduler {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        self.previous = None;
    }

    fn load_match_details(&mut self, context: &MatchContext, agent: usize, mirror: bool) {
        self.binding = Some(MatchBinding::new(context, agent, mirror));
    }

    fn decide(&mut self, state: &State) -> Result<Decision> {
        let binding = bound(&self.binding, &self.name)?;
        let restricted: Vec<bool> = binding
            .available()
            .iter()
            .zip(&self.visible)
            .map(|(&owned, &visible)| owned && visible)
            .collect();
        let moves = state.legal_moves(&restricted);

        if self.rng.random::<f64>() < self.stochasticity {
            // Index `moves.len()` stands for the pass option.
            let index = self.rng.random_range(0..=moves.len());
            self.previous = moves.get(index).copied();
            return Ok(match self.previous {
                Some(mv) => Decision::progress(mv),
                None if moves.is_empty() => Decision::forced(),
                None => Decision::pass(),
            });
        }

        if moves.is_empty() {
            self.previous = None;
            return Ok(Decision::forced());
        }
        let chosen = match sticky_choice(&moves, self.previous) {
            Some(mv) => mv,
            None => *moves.choose(&mut self.rng).unwrap_or(&moves[0]),
        };
        self.previous = Some(chosen);
        Ok(Decision::progress(chosen))
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
