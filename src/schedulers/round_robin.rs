//! Round-robin scheduling.

use std::any::Any;

use crate::{
    Result,
    ports::{MatchBinding, MatchContext, Scheduler, scheduler::bound},
    state::{Decision, State},
};

use super::move_with_plan;

/// Cycles a cursor over the agent's intentions, progressing the first one at
/// or after the cursor that can move.
pub struct RoundRobinScheduler {
    name: String,
    binding: Option<MatchBinding>,
    cursor: usize,
}

impl RoundRobinScheduler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            binding: None,
            cursor: 0,
        }
    }
}

impl Default for RoundRobinScheduler {
    fn default() -> Self {
        Self::new("Round_Robin")
    }
}

impl Scheduler for RoundRobinScheduler {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }

    fn load_match_details(&mut self, context: &MatchContext, agent: usize, mirror: bool) {
        self.binding = Some(MatchBinding::new(context, agent, mirror));
    }

    fn decide(&mut self, state: &State) -> Result<Decision> {
        let binding = bound(&self.binding, &self.name)?;
        let available = binding.available();
        let n = state.num_intentions();

        let chosen = (0..n)
            .map(|offset| (self.cursor + offset) % n)
            .find(|&i| available.get(i).copied().unwrap_or(false) && state.progressable(i));

        let Some(intention) = chosen else {
            return Ok(Decision::forced());
        };
        self.cursor = (intention + 1) % n;
        Ok(Decision::progress(move_with_plan(state, intention, |plans| {
            plans.first().copied()
        })))
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
    fn cycles_through_owned_progressable_intentions() {
        let mut scheduler = RoundRobinScheduler::default();
        bind(&mut scheduler, 4, 0);
        let state = ladder(&[0, 1, 2, 3]);

        let picks: Vec<_> = (0..4)
            .map(|_| scheduler.decide(&state).unwrap().intention)
            .collect();
        assert_eq!(picks, vec![Some(0), Some(2), Some(0), Some(2)]);
    }

    #[test]
    fn reset_rewinds_the_cursor() {
        let mut scheduler = RoundRobinScheduler::default();
        bind(&mut scheduler, 4, 1);
        let state = ladder(&[1, 3]);

        assert_eq!(scheduler.decide(&state).unwrap().intention, Some(1));
        scheduler.reset();
        assert_eq!(scheduler.decide(&state).unwrap().intention, Some(1));
        assert!(scheduler.decide(&ladder(&[0])).unwrap().forced_pass);
    }
}
