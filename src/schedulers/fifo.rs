//! First-in-first-out scheduling.

use std::any::Any;

use crate::{
    Result,
    ports::{MatchBinding, MatchContext, Scheduler, scheduler::bound},
    state::{Decision, Move, State},
};

/// Keeps progressing the intention (and plan) it chose last, falling back to
/// the first legal move.
pub struct FifoScheduler {
    name: String,
    binding: Option<MatchBinding>,
    previous: Option<Move>,
}

impl FifoScheduler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            binding: None,
            previous: None,
        }
    }
}

impl Default for FifoScheduler {
    fn default() -> Self {
        Self::new("FIFO")
    }
}

/// Previous move if still legal, else any legal move of the same intention.
pub(crate) fn sticky_choice(moves: &[Move], previous: Option<Move>) -> Option<Move> {
    let previous = previous?;
    moves
        .iter()
        .find(|mv| **mv == previous)
        .or_else(|| moves.iter().find(|mv| mv.intention == previous.intention))
        .copied()
}

impl Scheduler for FifoScheduler {
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
        let moves = state.legal_moves(binding.available());

        let Some(&first) = moves.first() else {
            self.previous = None;
            return Ok(Decision::forced());
        };
        let chosen = sticky_choice(&moves, self.previous).unwrap_or(first);
        self.previous = Some(chosen);
        Ok(Decision::progress(chosen))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
