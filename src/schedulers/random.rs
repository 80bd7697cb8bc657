//! Uniform random scheduling.

use std::any::Any;

use rand::{Rng, SeedableRng, random, rngs::StdRng};

use crate::{
    Result,
    ports::{MatchBinding, MatchContext, Scheduler, scheduler::bound},
    state::{Decision, State},
};

/// Picks uniformly among the agent's legal moves and the option to pass.
pub struct RandomScheduler {
    name: String,
    binding: Option<MatchBinding>,
    rng: StdRng,
}

impl RandomScheduler {
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

impl Default for RandomScheduler {
    fn default() -> Self {
        Self::new("Random")
    }
}

impl Scheduler for RandomScheduler {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_match_details(&mut self, context: &MatchContext, agent: usize, mirror: bool) {
        self.binding = Some(MatchBinding::new(context, agent, mirror));
    }

    fn decide(&mut self, state: &State) -> Result<Decision> {
        let binding = bound(&self.binding, &self.name)?;
        let moves = state.legal_moves(binding.available());

        // Index `moves.len()` stands for the pass option.
        let index = self.rng.random_range(0..=moves.len());
        Ok(match moves.get(index) {
            Some(&mv) => Decision::progress(mv),
            None if moves.is_empty() => Decision::forced(),
            None => Decision::pass(),
        })
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedulers::test_support::{bind, ladder};

    #[test]
    fn only_owned_moves_or_passes_are_chosen() {
        let mut scheduler = RandomScheduler::with_seed("Random", 7);
        bind(&mut scheduler, 4, 0);
        let state = ladder(&[0, 1, 2, 3]);

        let mut seen_pass = false;
        for _ in 0..200 {
            let decision = scheduler.decide(&state).unwrap();
            assert!(!decision.forced_pass);
            match decision.intention {
                Some(i) => assert!(i == 0 || i == 2),
                None => seen_pass = true,
            }
        }
        assert!(seen_pass);
    }

    #[test]
    fn forced_pass_when_only_pass_remains() {
        let mut scheduler = RandomScheduler::with_seed("Random", 1);
        bind(&mut scheduler, 4, 0);
        let decision = scheduler.decide(&ladder(&[1])).unwrap();
        assert!(decision.forced_pass);
    }

    #[test]
    fn same_seed_same_choices() {
        let state = ladder(&[0, 1, 2, 3]);
        let run = |seed| {
            let mut scheduler = RandomScheduler::with_seed("Random", seed);
            bind(&mut scheduler, 4, 0);
            (0..20)
                .map(|_| scheduler.decide(&state).unwrap().intention)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(99), run(99));
    }
}
