//! Random scheduling biased toward intentions that are neither safe nor doomed.

use std::any::Any;

use rand::{Rng, SeedableRng, random, rngs::StdRng, seq::IndexedRandom};

use crate::{
    Result,
    ports::{MatchBinding, MatchContext, Scheduler, scheduler::bound},
    state::{Decision, State},
};

use super::{coverage_priority::coverage_vector, move_with_plan, progressable_in};

/// Probability of passing regardless of the chosen move.
pub const SMART_RANDOM_PASS_PROBABILITY: f64 = 0.2;

/// Picks a random progressable intention, preferring those with coverage
/// strictly between 0 and 1, with a random applicable plan.
pub struct SmartRandomScheduler {
    name: String,
    binding: Option<MatchBinding>,
    rng: StdRng,
}

impl SmartRandomScheduler {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_seed(name, random())
    }

    pub fn with_seed(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            binding: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SmartRandomScheduler {
    fn default() -> Self {
        Self::new("Smart_Random")
    }
}

impl Scheduler for SmartRandomScheduler {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_match_details(&mut self, context: &MatchContext, agent: usize, mirror: bool) {
        self.binding = Some(MatchBinding::new(context, agent, mirror));
    }

    fn decide(&mut self, state: &State) -> Result<Decision> {
        let binding = bound(&self.binding, &self.name)?;
        let coverage = coverage_vector(state);
        let progressable = progressable_in(state, binding.available());

        let uncertain: Vec<usize> = progressable
            .iter()
            .copied()
            .filter(|&i| coverage[i] > 0.0 && coverage[i] < 1.0)
            .collect();
        let pool = if uncertain.is_empty() {
            &progressable
        } else {
            &uncertain
        };

        let Some(&intention) = pool.choose(&mut self.rng) else {
            return Ok(Decision::forced());
        };
        let mv = move_with_plan(state, intention, |plans| {
            plans.choose(&mut self.rng).copied()
        });

        if self.rng.random::<f64>() < SMART_RANDOM_PASS_PROBABILITY {
            return Ok(Decision::pass());
        }
        Ok(Decision::progress(mv))
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
