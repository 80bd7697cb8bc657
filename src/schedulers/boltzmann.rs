//! Softmax sampling over intention coverage.

use std::any::Any;

use rand::{Rng, SeedableRng, random, rngs::StdRng, seq::IndexedRandom};

use crate::{
    Result,
    ports::{MatchBinding, MatchContext, Scheduler, scheduler::bound},
    state::{Decision, State},
};

use super::{
    coverage_priority::{CoverageType, coverage_vector},
    move_with_plan, progressable_in,
};

/// Samples an intention with weight `exp(-coverage / temperature)`.
///
/// Low temperatures approach C1; high temperatures approach uniform choice.
/// With probability `pass_probability` the scheduler passes instead.
pub struct BoltzmannCScheduler {
    name: String,
    coverage_type: CoverageType,
    pass_probability: f64,
    temperature: f64,
    binding: Option<MatchBinding>,
    focus: Option<usize>,
    rng: StdRng,
}

impl BoltzmannCScheduler {
    pub fn new(
        name: impl Into<String>,
        coverage_type: CoverageType,
        pass_probability: f64,
        temperature: f64,
    ) -> Self {
        Self::with_seed(name, coverage_type, pass_probability, temperature, random())
    }

    pub fn with_seed(
        name: impl Into<String>,
        coverage_type: CoverageType,
        pass_probability: f64,
        temperature: f64,
        seed: u64,
    ) -> Self {
        Self {
            name: name.into(),
            coverage_type,
            pass_probability,
            temperature,
            binding: None,
            focus: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn pass_probability(&self) -> f64 {
        self.pass_probability
    }

    fn sample(&mut self, state: &State, available: &[bool]) -> Option<usize> {
        if self.rng.random::<f64>() < self.pass_probability {
            return None;
        }
        let coverage = coverage_vector(state);
        let weighted: Vec<(usize, f64)> = progressable_in(state, available)
            .into_iter()
            .map(|i| (i, (-coverage[i] / self.temperature).exp()))
            .collect();

        let total: f64 = weighted.iter().map(|(_, w)| w).sum();
        if total.is_nan() || total <= 0.0 {
            return None;
        }
        let cutoff = self.rng.random::<f64>() * total;
        let mut cumulative = 0.0;
        for &(i, weight) in &weighted {
            cumulative += weight;
            if cumulative >= cutoff {
                return Some(i);
            }
        }
        weighted.last().map(|&(i, _)| i)
    }
}

impl Scheduler for BoltzmannCScheduler {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        self.focus = None;
    }

    fn load_match_details(&mut self, context: &MatchContext, agent: usize, mirror: bool) {
        self.binding = Some(MatchBinding::new(context, agent, mirror));
    }

    fn decide(&mut self, state: &State) -> Result<Decision> {
        let available = bound(&self.binding, &self.name)?.available().to_vec();
        // Only an agent that owns nothing is forced to pass.
        if !available.iter().any(|&owned| owned) {
            return Ok(Decision::forced());
        }

        let keep_focus = self.coverage_type == CoverageType::C0
            && self.focus.is_some_and(|i| state.progressable(i));
        if !keep_focus {
            self.focus = self.sample(state, &available);
        }

        Ok(match self.focus {
            Some(intention) => Decision::progress(move_with_plan(state, intention, |plans| {
                plans.choose(&mut self.rng).copied()
            })),
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
    fn always_passes_with_pass_probability_one() {
        let mut scheduler =
            BoltzmannCScheduler::with_seed("Boltzmann", CoverageType::C1, 1.0, 1.0, 5);
        bind(&mut scheduler, 4, 0);
        let decision = scheduler.decide(&ladder(&[0, 2])).unwrap();
        assert!(decision.is_pass());
        assert!(!decision.forced_pass);
    }

    #[test]
    fn samples_only_progressable_owned_intentions() {
        let mut scheduler =
            BoltzmannCScheduler::with_seed("Boltzmann", CoverageType::C1, 0.0, 1.0, 5);
        bind(&mut scheduler, 4, 0);
        let state = ladder(&[1, 2, 3]);
        for _ in 0..50 {
            assert_eq!(scheduler.decide(&state).unwrap().intention, Some(2));
        }
    }

    #[test]
    fn blocked_agent_passes_without_being_forced() {
        let mut scheduler =
            BoltzmannCScheduler::with_seed("Boltzmann", CoverageType::C0, 0.0, 1.0, 5);
        bind(&mut scheduler, 4, 0);
        let decision = scheduler.decide(&ladder(&[1])).unwrap();
        assert!(decision.is_pass());
        assert!(!decision.forced_pass);
    }
}
